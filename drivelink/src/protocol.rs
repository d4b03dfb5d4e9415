// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical wire protocol of the drive-control link.
//!
//! Two message shapes cross the network and nothing else:
//!
//! * [MotionFrame]: the 4-byte motion broadcast,
//!   `[steering_hi][steering_lo][gear][speed]`, steering as big-endian
//!   two's-complement i16. Sent periodically over UDP.
//! * [CtrlMessage]: a tagged command with a fixed total size of
//!   [CTRL_MESSAGE_SIZE] bytes regardless of the active variant: one tag
//!   byte followed by a payload region sized to the largest variant. Unused
//!   payload bytes are zero on the wire. Sent over TCP.
//!
//! This module is the single protocol definition consumed by every
//! component; no component carries its own copy of the layout.

use crate::error::Error;

/// Wire size of a motion frame
pub const MOTION_FRAME_SIZE: usize = 4;

/// Size of the ctrl payload region, sized to the largest variant (Drive)
pub const CTRL_PAYLOAD_SIZE: usize = 4;

/// Total wire size of a ctrl message: tag byte plus payload region
pub const CTRL_MESSAGE_SIZE: usize = 1 + CTRL_PAYLOAD_SIZE;

/// Gear value for forward motion
pub const GEAR_FORWARD: u8 = 0;
/// Gear value for backward motion
pub const GEAR_BACKWARD: u8 = 1;

/// Steering is commanded in degrees within this range
pub const STEERING_RANGE_DEG: std::ops::RangeInclusive<i16> = -180..=180;

/// The vehicle's commanded motion state.
///
/// `steering_deg` is kept within [STEERING_RANGE_DEG] by the state store.
/// `gear` values other than [GEAR_FORWARD]/[GEAR_BACKWARD] pass through
/// unvalidated; handling them is the consumer's responsibility.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveState {
    pub steering_deg: i16,
    pub gear: u8,
    pub speed: u8,
}

/// The 4-byte wire form of the motion state.
///
/// Identical fields to [DriveState], but no clamping: out-of-range values
/// are legal on the wire and must be handled by the consumer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MotionFrame {
    pub steering_deg: i16,
    pub gear: u8,
    pub speed: u8,
}

impl From<DriveState> for MotionFrame {
    fn from(state: DriveState) -> Self {
        MotionFrame {
            steering_deg: state.steering_deg,
            gear: state.gear,
            speed: state.speed,
        }
    }
}

impl From<MotionFrame> for DriveState {
    fn from(frame: MotionFrame) -> Self {
        DriveState {
            steering_deg: frame.steering_deg,
            gear: frame.gear,
            speed: frame.speed,
        }
    }
}

impl MotionFrame {
    /// Encode into the 4-byte wire representation. Pure and total.
    pub fn encode(&self) -> [u8; MOTION_FRAME_SIZE] {
        let mut buffer = [0u8; MOTION_FRAME_SIZE];
        buffer[0..2].copy_from_slice(&self.steering_deg.to_be_bytes());
        buffer[2] = self.gear;
        buffer[3] = self.speed;
        buffer
    }

    /// Decode from the first [MOTION_FRAME_SIZE] bytes of `bytes`.
    ///
    /// Fails with [Error::ShortPacket] if fewer bytes are available. No
    /// range validation is performed here.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MOTION_FRAME_SIZE {
            return Err(Error::ShortPacket {
                expected: MOTION_FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        let steering_deg = i16::from_be_bytes(bytes[0..2].try_into().expect("slice len checked"));
        Ok(MotionFrame {
            steering_deg,
            gear: bytes[2],
            speed: bytes[3],
        })
    }
}

impl std::fmt::Display for MotionFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "steering={} deg, gear={}, speed={}",
            self.steering_deg, self.gear, self.speed
        )
    }
}

/// Command tags of the ctrl channel
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CtrlTag {
    /// Motion command over the ctrl channel; reserved, no current sender
    Drive = 0x10,
    /// Start track following
    TrackStart = 0x11,
    /// Stop track following
    TrackStop = 0x12,
    /// Set headlight color and brightness
    Headlight = 0x13,
    /// Switch the laser on or off
    Laser = 0x14,
}

impl TryFrom<u8> for CtrlTag {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        let t: CtrlTag = match v {
            v if v == CtrlTag::Drive as u8 => CtrlTag::Drive,
            v if v == CtrlTag::TrackStart as u8 => CtrlTag::TrackStart,
            v if v == CtrlTag::TrackStop as u8 => CtrlTag::TrackStop,
            v if v == CtrlTag::Headlight as u8 => CtrlTag::Headlight,
            v if v == CtrlTag::Laser as u8 => CtrlTag::Laser,
            _ => {
                return Err(Error::InvalidArgument("unknown ctrl tag"));
            }
        };
        Ok(t)
    }
}

/// A discrete command of the ctrl channel.
///
/// In memory this is a plain sum type; on the wire every message occupies
/// exactly [CTRL_MESSAGE_SIZE] bytes, the encoder zero-filling the payload
/// region before writing the active variant so no stale bytes leak across
/// sends. Unknown tags decode successfully into [CtrlMessage::Unknown];
/// rejecting them is caller policy, not a codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlMessage {
    /// Reserved motion command, defined as the canonical big-endian motion
    /// layout. No current sender emits it.
    Drive(MotionFrame),
    TrackStart,
    TrackStop,
    Headlight { r: u8, g: u8, b: u8, brightness: u8 },
    Laser { on: bool },
    /// A tag this build does not know, with the raw payload region
    Unknown { tag: u8, payload: [u8; CTRL_PAYLOAD_SIZE] },
}

impl CtrlMessage {
    /// The wire tag of this message
    pub fn tag(&self) -> u8 {
        match self {
            CtrlMessage::Drive(_) => CtrlTag::Drive as u8,
            CtrlMessage::TrackStart => CtrlTag::TrackStart as u8,
            CtrlMessage::TrackStop => CtrlTag::TrackStop as u8,
            CtrlMessage::Headlight { .. } => CtrlTag::Headlight as u8,
            CtrlMessage::Laser { .. } => CtrlTag::Laser as u8,
            CtrlMessage::Unknown { tag, .. } => *tag,
        }
    }

    /// Encode into the fixed-size wire representation.
    ///
    /// The payload region starts out zeroed; variants smaller than the
    /// region leave the remainder zero.
    pub fn encode(&self) -> [u8; CTRL_MESSAGE_SIZE] {
        let mut buffer = [0u8; CTRL_MESSAGE_SIZE];
        buffer[0] = self.tag();
        let payload = &mut buffer[1..];
        match self {
            CtrlMessage::Drive(frame) => payload.copy_from_slice(&frame.encode()),
            CtrlMessage::TrackStart | CtrlMessage::TrackStop => (),
            CtrlMessage::Headlight { r, g, b, brightness } => {
                payload[0] = *r;
                payload[1] = *g;
                payload[2] = *b;
                payload[3] = *brightness;
            }
            CtrlMessage::Laser { on } => payload[0] = *on as u8,
            CtrlMessage::Unknown { payload: raw, .. } => payload.copy_from_slice(raw),
        }
        buffer
    }

    /// Decode from the first [CTRL_MESSAGE_SIZE] bytes of `bytes`.
    ///
    /// Fails with [Error::ShortPacket] if fewer bytes are available.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CTRL_MESSAGE_SIZE {
            return Err(Error::ShortPacket {
                expected: CTRL_MESSAGE_SIZE,
                actual: bytes.len(),
            });
        }
        let payload = &bytes[1..CTRL_MESSAGE_SIZE];
        let message = match CtrlTag::try_from(bytes[0]) {
            Ok(CtrlTag::Drive) => CtrlMessage::Drive(MotionFrame::decode(payload)?),
            Ok(CtrlTag::TrackStart) => CtrlMessage::TrackStart,
            Ok(CtrlTag::TrackStop) => CtrlMessage::TrackStop,
            Ok(CtrlTag::Headlight) => CtrlMessage::Headlight {
                r: payload[0],
                g: payload[1],
                b: payload[2],
                brightness: payload[3],
            },
            Ok(CtrlTag::Laser) => CtrlMessage::Laser { on: payload[0] != 0 },
            Err(_) => CtrlMessage::Unknown {
                tag: bytes[0],
                payload: payload.try_into().expect("slice len checked"),
            },
        };
        Ok(message)
    }
}

impl std::fmt::Display for CtrlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtrlMessage::Drive(frame) => write!(f, "Drive({frame})"),
            CtrlMessage::TrackStart => write!(f, "TrackStart"),
            CtrlMessage::TrackStop => write!(f, "TrackStop"),
            CtrlMessage::Headlight { r, g, b, brightness } => {
                write!(f, "Headlight(r={r}, g={g}, b={b}, brightness={brightness})")
            }
            CtrlMessage::Laser { on } => write!(f, "Laser(on={})", *on as u8),
            CtrlMessage::Unknown { tag, payload } => {
                write!(f, "Unknown(tag=0x{tag:02X}, payload=")?;
                for (i, byte) in payload.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{byte:02X}")?;
                }
                write!(f, ")")
            }
        }
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_frame_layout() {
        let frame = MotionFrame {
            steering_deg: 180,
            gear: GEAR_FORWARD,
            speed: 80,
        };
        assert_eq!(frame.encode(), [0x00, 0xB4, 0x00, 0x50]);

        let frame = MotionFrame {
            steering_deg: -30,
            gear: GEAR_BACKWARD,
            speed: 60,
        };
        assert_eq!(frame.encode(), [0xFF, 0xE2, 0x01, 0x3C]);
    }

    #[test]
    fn motion_frame_round_trip() {
        for steering in [-180i16, -30, 0, 1, 180] {
            for (gear, speed) in [(GEAR_FORWARD, 0u8), (GEAR_BACKWARD, 255), (7, 128)] {
                let frame = MotionFrame {
                    steering_deg: steering,
                    gear,
                    speed,
                };
                let decoded = MotionFrame::decode(&frame.encode()).unwrap();
                assert_eq!(decoded, frame);
            }
        }
    }

    #[test]
    fn motion_frame_short_input() {
        let bytes = [0x00, 0xB4, 0x00, 0x50];
        for len in 0..MOTION_FRAME_SIZE {
            match MotionFrame::decode(&bytes[..len]) {
                Err(Error::ShortPacket { expected, actual }) => {
                    assert_eq!(expected, MOTION_FRAME_SIZE);
                    assert_eq!(actual, len);
                }
                other => panic!("expected ShortPacket, got {other:?}"),
            }
        }
    }

    #[test]
    fn motion_frame_ignores_trailing_bytes() {
        let mut bytes = vec![0x00, 0xB4, 0x00, 0x50];
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let frame = MotionFrame::decode(&bytes).unwrap();
        assert_eq!(frame.steering_deg, 180);
        assert_eq!(frame.gear, GEAR_FORWARD);
        assert_eq!(frame.speed, 80);
    }

    #[test]
    fn ctrl_message_fixed_size_and_zero_fill() {
        for message in [CtrlMessage::TrackStart, CtrlMessage::TrackStop] {
            let bytes = message.encode();
            assert_eq!(bytes.len(), CTRL_MESSAGE_SIZE);
            assert_eq!(bytes[0], message.tag());
            assert!(bytes[1..].iter().all(|b| *b == 0), "payload not zeroed");
        }
    }

    #[test]
    fn ctrl_message_no_carry_over_between_encodes() {
        // A payload-carrying encode must not bleed into a following
        // payload-less one.
        let _ = CtrlMessage::Headlight {
            r: 255,
            g: 255,
            b: 255,
            brightness: 100,
        }
        .encode();
        let bytes = CtrlMessage::TrackStop.encode();
        assert!(bytes[1..].iter().all(|b| *b == 0));
        assert_eq!(CtrlMessage::decode(&bytes).unwrap(), CtrlMessage::TrackStop);
    }

    #[test]
    fn ctrl_message_headlight_round_trip() {
        let message = CtrlMessage::Headlight {
            r: 255,
            g: 80,
            b: 0,
            brightness: 50,
        };
        let bytes = message.encode();
        assert_eq!(bytes, [0x13, 255, 80, 0, 50]);
        assert_eq!(CtrlMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn ctrl_message_laser() {
        let bytes = CtrlMessage::Laser { on: true }.encode();
        assert_eq!(bytes, [0x14, 1, 0, 0, 0]);
        assert_eq!(
            CtrlMessage::decode(&bytes).unwrap(),
            CtrlMessage::Laser { on: true }
        );
        // any nonzero wire byte means on
        assert_eq!(
            CtrlMessage::decode(&[0x14, 2, 0, 0, 0]).unwrap(),
            CtrlMessage::Laser { on: true }
        );
        assert_eq!(
            CtrlMessage::decode(&[0x14, 0, 0, 0, 0]).unwrap(),
            CtrlMessage::Laser { on: false }
        );
    }

    #[test]
    fn ctrl_message_drive_uses_motion_layout() {
        let message = CtrlMessage::Drive(MotionFrame {
            steering_deg: -30,
            gear: GEAR_FORWARD,
            speed: 120,
        });
        let bytes = message.encode();
        assert_eq!(bytes, [0x10, 0xFF, 0xE2, 0x00, 0x78]);
        assert_eq!(CtrlMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn ctrl_message_unknown_tag_decodes() {
        let bytes = [0x77, 0xDE, 0xAD, 0xBE, 0xEF];
        let message = CtrlMessage::decode(&bytes).unwrap();
        assert_eq!(
            message,
            CtrlMessage::Unknown {
                tag: 0x77,
                payload: [0xDE, 0xAD, 0xBE, 0xEF],
            }
        );
        // unknown messages re-encode byte-identically
        assert_eq!(message.encode(), bytes);
    }

    #[test]
    fn ctrl_message_short_input() {
        let bytes = CtrlMessage::TrackStart.encode();
        for len in 0..CTRL_MESSAGE_SIZE {
            assert!(matches!(
                CtrlMessage::decode(&bytes[..len]),
                Err(Error::ShortPacket { .. })
            ));
        }
    }
}

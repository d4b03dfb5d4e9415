// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Bridge from received motion frames onto the vehicle CAN bus.

use crate::error::Error;
use crate::ingress::MotionSink;
use crate::protocol::{MotionFrame, MOTION_FRAME_SIZE};
use log::{debug, info};
use std::mem;
use std::net::SocketAddr;
use std::os::fd::RawFd;

/// Fixed identifier of the motion frame on the bus; motor controllers
/// filter on it.
pub const MOTION_CAN_ID: u32 = 0x123;

/// Raw SocketCAN writer emitting motion payloads as fixed-ID frames.
///
/// The 4 payload bytes are copied verbatim into the frame data; the bridge
/// neither retains nor reinterprets them. A partial write fails with
/// [Error::BusWrite] and is not retried here; the ingress loop simply
/// proceeds to the next datagram.
pub struct CanBridge {
    fd: RawFd,
}

impl CanBridge {
    /// Open a raw CAN socket bound to the named interface (e.g. "can0")
    pub fn open(ifname: &str) -> Result<Self> {
        if ifname.is_empty() || ifname.len() >= libc::IFNAMSIZ {
            return Err(Error::InvalidArgument("invalid CAN interface name"));
        }

        // Safety: plain socket creation, no pointers involved
        let fd = unsafe { libc::socket(libc::PF_CAN, libc::SOCK_RAW, libc::CAN_RAW) };
        if fd < 0 {
            return Err(Error::Io((
                std::io::Error::last_os_error(),
                "failed to open CAN socket",
            )));
        }

        // Safety: all-zero bytes are a valid ifreq
        let mut ifr: libc::ifreq = unsafe { mem::zeroed() };
        for (dst, src) in ifr.ifr_name.iter_mut().zip(ifname.as_bytes()) {
            *dst = *src as libc::c_char;
        }

        // Safety: fd is a valid socket and ifr is a properly initialized
        // ifreq that outlives the call
        if unsafe { libc::ioctl(fd, libc::SIOCGIFINDEX, &mut ifr) } < 0 {
            let e = std::io::Error::last_os_error();
            // Safety: fd was returned by socket() above
            unsafe { libc::close(fd) };
            return Err(Error::Io((e, "failed to resolve CAN interface index")));
        }

        // Safety: all-zero bytes are a valid sockaddr_can
        let mut addr: libc::sockaddr_can = unsafe { mem::zeroed() };
        addr.can_family = libc::AF_CAN as libc::sa_family_t;
        // Safety: SIOCGIFINDEX has filled the ifru_ifindex member
        addr.can_ifindex = unsafe { ifr.ifr_ifru.ifru_ifindex };

        // Safety: addr is a valid sockaddr_can and the length matches
        let res = unsafe {
            libc::bind(
                fd,
                &addr as *const libc::sockaddr_can as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_can>() as libc::socklen_t,
            )
        };
        if res < 0 {
            let e = std::io::Error::last_os_error();
            // Safety: fd was returned by socket() above
            unsafe { libc::close(fd) };
            return Err(Error::Io((e, "failed to bind CAN socket")));
        }

        info!("CAN bridge open on {ifname}");
        Ok(CanBridge { fd })
    }

    /// Write one motion payload to the bus as an id-[MOTION_CAN_ID] frame
    pub fn send_motion(&self, payload: &[u8; MOTION_FRAME_SIZE]) -> Result<()> {
        let frame = motion_can_frame(payload);
        let size = mem::size_of::<libc::can_frame>();

        // Safety: frame is valid for reads of size bytes for the duration
        // of the call
        let written = unsafe {
            libc::write(self.fd, &frame as *const libc::can_frame as *const libc::c_void, size)
        };
        if written < 0 {
            return Err(Error::Io((
                std::io::Error::last_os_error(),
                "failed to write CAN frame",
            )));
        }
        if written as usize != size {
            return Err(Error::BusWrite {
                written: written as usize,
                expected: size,
            });
        }
        Ok(())
    }
}

impl Drop for CanBridge {
    fn drop(&mut self) {
        // Safety: fd was returned by socket() and is closed exactly once
        unsafe { libc::close(self.fd) };
    }
}

impl MotionSink for CanBridge {
    fn on_frame(&mut self, frame: MotionFrame, source: SocketAddr) -> Result<()> {
        debug!("Bridging frame from {source} to CAN: {frame}");
        // encoding is the exact inverse of the ingress decode, so the bus
        // sees the received bytes unchanged
        self.send_motion(&frame.encode())
    }
}

/// Build the fixed-ID bus frame for a motion payload
fn motion_can_frame(payload: &[u8; MOTION_FRAME_SIZE]) -> libc::can_frame {
    // Safety: all-zero bytes are a valid can_frame
    let mut frame: libc::can_frame = unsafe { mem::zeroed() };
    frame.can_id = MOTION_CAN_ID;
    frame.can_dlc = MOTION_FRAME_SIZE as u8;
    frame.data[..MOTION_FRAME_SIZE].copy_from_slice(payload);
    frame
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_carries_payload_verbatim() {
        let payload = [0x00, 0xB4, 0x00, 0x50];
        let frame = motion_can_frame(&payload);
        assert_eq!(frame.can_id, 0x123);
        assert_eq!(frame.can_dlc, 4);
        assert_eq!(&frame.data[..4], &payload);
        assert!(frame.data[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn rejects_bad_interface_names() {
        assert!(matches!(
            CanBridge::open(""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            CanBridge::open("interface-name-way-too-long"),
            Err(Error::InvalidArgument(_))
        ));
        // no such interface; exact errno depends on the kernel
        assert!(CanBridge::open("nosuchcan0").is_err());
    }
}

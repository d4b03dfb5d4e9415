// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Drivelink is the control link of a remote-controlled vehicle.
//!
//! # Motion channel
//!
//! The commanded motion state (steering, gear, speed) lives in a
//! [DriveStateStore](crate::state::DriveStateStore). A
//! [MotionPublisher](crate::publisher::MotionPublisher) periodically snapshots
//! the store and broadcasts it as a compact 4-byte
//! [MotionFrame](crate::protocol::MotionFrame) over UDP. On the vehicle, a
//! [MotionReceiver](crate::ingress::MotionReceiver) validates incoming
//! datagrams and forwards the payload unchanged onto the CAN bus via the
//! [CanBridge](crate::can::CanBridge). Loss is superseded by the next tick.
//!
//! # Command channel
//!
//! Discrete commands (track start/stop, headlight, laser) travel as
//! fixed-size tagged [CtrlMessages](crate::protocol::CtrlMessage) over a
//! persistent TCP connection, sent by a
//! [CtrlClient](crate::ctrl_client::CtrlClient) and dispatched on the vehicle
//! by a [CtrlReceiver](crate::ingress::CtrlReceiver).

pub mod can;
pub mod ctrl_client;
pub mod error;
pub mod ingress;
pub mod protocol;
pub mod publisher;
pub mod state;

/// Re-export the public API
pub mod prelude {
    pub use crate::can::CanBridge;
    pub use crate::ctrl_client::CtrlClient;
    pub use crate::error::Error;
    pub use crate::ingress::{CtrlHandler, CtrlReceiver, MotionReceiver, MotionSink};
    pub use crate::protocol::{CtrlMessage, DriveState, MotionFrame};
    pub use crate::publisher::MotionPublisher;
    pub use crate::state::DriveStateStore;
}

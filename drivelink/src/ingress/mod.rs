// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Vehicle-side receivers of the control link.

mod ctrl;
mod motion;

pub use ctrl::{CtrlHandler, CtrlReceiver};
pub use motion::{MotionReceiver, MotionSink};

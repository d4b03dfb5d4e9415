// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared store of the vehicle's commanded motion state.

use crate::protocol::{DriveState, STEERING_RANGE_DEG};
use std::sync::Mutex;

/// Holds the latest commanded motion state.
///
/// Any number of threads may call the setters while the publisher snapshots
/// the state; every operation is atomic with respect to every other, so a
/// reader sees either the old or the fully updated tuple, never a torn one.
/// Steering is clamped to [STEERING_RANGE_DEG] before storing; no input is
/// ever rejected.
#[derive(Debug, Default)]
pub struct DriveStateStore {
    state: Mutex<DriveState>,
}

impl DriveStateStore {
    /// Create a store with all-zero state (centered, forward, stopped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole tuple in one step
    pub fn set_state(&self, steering_deg: i16, gear: u8, speed: u8) {
        let mut state = self.state.lock().expect("drive state lock poisoned");
        state.steering_deg = clamp_steering(steering_deg);
        state.gear = gear;
        state.speed = speed;
    }

    pub fn set_steering(&self, steering_deg: i16) {
        let mut state = self.state.lock().expect("drive state lock poisoned");
        state.steering_deg = clamp_steering(steering_deg);
    }

    pub fn set_gear(&self, gear: u8) {
        let mut state = self.state.lock().expect("drive state lock poisoned");
        state.gear = gear;
    }

    pub fn set_speed(&self, speed: u8) {
        let mut state = self.state.lock().expect("drive state lock poisoned");
        state.speed = speed;
    }

    /// Snapshot the current state
    pub fn get_state(&self) -> DriveState {
        *self.state.lock().expect("drive state lock poisoned")
    }
}

fn clamp_steering(steering_deg: i16) -> i16 {
    steering_deg.clamp(*STEERING_RANGE_DEG.start(), *STEERING_RANGE_DEG.end())
}

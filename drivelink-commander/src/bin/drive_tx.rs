// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Broadcast the commanded motion state periodically over UDP, walking a
//! short demonstration sequence.

use anyhow::{Context, Error};
use argh::FromArgs;
use drivelink::prelude::*;
use drivelink::protocol::{GEAR_BACKWARD, GEAR_FORWARD};
use log::info;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEFAULT_DESTINATION: &str = "127.0.0.1:8080";
const DEFAULT_PERIOD_MS: u64 = 20;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Motion broadcaster arguments
struct Args {
    #[argh(description = "destination address of the motion link")]
    #[argh(option, short = 'd', default = "DEFAULT_DESTINATION.into()")]
    destination: String,

    #[argh(description = "publish period in milliseconds")]
    #[argh(option, short = 'p', default = "DEFAULT_PERIOD_MS")]
    period_ms: u64,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Args {
        destination,
        period_ms,
    } = argh::from_env();

    let store = Arc::new(DriveStateStore::new());
    let mut publisher = MotionPublisher::new(Arc::clone(&store));
    publisher
        .start(destination.as_str(), Duration::from_millis(period_ms))
        .context("failed to start motion publisher")?;

    // pretend an external commander drives the state
    info!("Holding still");
    store.set_state(0, GEAR_FORWARD, 0);
    thread::sleep(Duration::from_secs(1));

    info!("Forward at speed 80, steering 10");
    store.set_state(10, GEAR_FORWARD, 80);
    thread::sleep(Duration::from_secs(2));

    info!("Turning left");
    store.set_steering(-30);
    thread::sleep(Duration::from_secs(2));

    info!("Backward at speed 60");
    store.set_state(0, GEAR_BACKWARD, 60);
    thread::sleep(Duration::from_secs(2));

    publisher.stop();
    Ok(())
}

// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Receive motion frames over UDP and forward them onto the vehicle CAN
//! bus as id-0x123 frames.

use anyhow::{Context, Error};
use argh::FromArgs;
use drivelink::prelude::*;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CAN_INTERFACE: &str = "can0";

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Motion gateway arguments
struct Args {
    #[argh(description = "UDP port to listen on")]
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    #[argh(description = "CAN interface to forward onto")]
    #[argh(option, short = 'i', default = "DEFAULT_CAN_INTERFACE.into()")]
    interface: String,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Args { port, interface } = argh::from_env();

    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let mut receiver = MotionReceiver::bind(bind_addr).context("failed to bind motion socket")?;
    let mut bridge =
        CanBridge::open(&interface).with_context(|| format!("failed to open {interface}"))?;

    receiver.run(&mut bridge)
}

// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Receive motion frames over UDP and print them, without a CAN bus.

use anyhow::{Context, Error};
use argh::FromArgs;
use drivelink::prelude::*;
use log::info;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Motion monitor arguments
struct Args {
    #[argh(description = "UDP port to listen on")]
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,
}

struct LogSink;

impl MotionSink for LogSink {
    fn on_frame(
        &mut self,
        frame: MotionFrame,
        source: SocketAddr,
    ) -> Result<(), drivelink::error::Error> {
        info!("from {source} | {frame}");
        Ok(())
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Args { port } = argh::from_env();

    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let mut receiver = MotionReceiver::bind(bind_addr).context("failed to bind motion socket")?;

    receiver.run(&mut LogSink)
}

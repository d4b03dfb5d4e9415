// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Accept ctrl clients and print every received command.

use anyhow::{Context, Error};
use argh::FromArgs;
use drivelink::prelude::*;
use log::info;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Ctrl server arguments
struct Args {
    #[argh(description = "TCP port to listen on")]
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,
}

struct ConsoleHandler;

impl CtrlHandler for ConsoleHandler {
    fn on_track_start(&mut self) {
        info!("TRACK_START");
    }

    fn on_track_stop(&mut self) {
        info!("TRACK_STOP");
    }

    fn on_headlight(&mut self, r: u8, g: u8, b: u8, brightness: u8) {
        info!("HEADLIGHT r={r} g={g} b={b} brightness={brightness}");
    }

    fn on_laser(&mut self, on: bool) {
        info!("LASER on={}", on as u8);
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Args { port } = argh::from_env();

    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let mut receiver = CtrlReceiver::bind(bind_addr).context("failed to bind ctrl listener")?;

    receiver.run(&mut ConsoleHandler)
}

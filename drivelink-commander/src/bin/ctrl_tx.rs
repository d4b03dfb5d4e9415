// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Send a short sequence of discrete commands over the ctrl channel.

use anyhow::{Context, Error};
use argh::FromArgs;
use drivelink::prelude::*;

const DEFAULT_SERVER: &str = "127.0.0.1:8080";

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Ctrl command sender arguments
struct Args {
    #[argh(description = "address of the ctrl server")]
    #[argh(option, short = 's', default = "DEFAULT_SERVER.into()")]
    server: String,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Args { server } = argh::from_env();

    let mut client =
        CtrlClient::connect(server.as_str()).context("failed to connect to ctrl server")?;

    client.track_start().context("failed to send track start")?;
    client
        .headlight(255, 80, 0, 50)
        .context("failed to send headlight command")?;
    client.laser(true).context("failed to send laser command")?;
    client.track_stop().context("failed to send track stop")?;

    client.close();
    Ok(())
}

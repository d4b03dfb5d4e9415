// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Controller-side sender of discrete commands.

use crate::error::Error;
use crate::protocol::CtrlMessage;
use log::{debug, info, warn};
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

/// TCP client of the ctrl channel.
///
/// The connection is established lazily and re-established on the next
/// send after a failure; commands are infrequent, so a failed send is
/// reported to the caller instead of retried here.
pub struct CtrlClient {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl CtrlClient {
    /// Create a client for the given server address and connect once.
    ///
    /// Fails with [Error::InvalidArgument] if the address does not resolve.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let addr = addr
            .to_socket_addrs()
            .map_err(|e| Error::Io((e, "failed to resolve ctrl server address")))?
            .next()
            .ok_or(Error::InvalidArgument("ctrl server address did not resolve"))?;
        let mut client = CtrlClient { addr, stream: None };
        client.ensure_connected()?;
        Ok(client)
    }

    fn ensure_connected(&mut self) -> Result<&mut TcpStream> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(self.addr)
                .map_err(|e| Error::Io((e, "failed to connect to ctrl server")))?;
            // commands are small and latency matters more than throughput
            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set nodelay: {e}");
            }
            info!("Connected to ctrl server {}", self.addr);
            self.stream = Some(stream);
        }
        Ok(self.stream.as_mut().expect("stream just set"))
    }

    /// Send one message as its full fixed-size encoding.
    ///
    /// On failure the connection is dropped so the next call reconnects.
    pub fn send(&mut self, message: &CtrlMessage) -> Result<()> {
        debug!("Sending {message}");
        let packet = message.encode();
        let stream = self.ensure_connected()?;
        if let Err(e) = stream.write_all(&packet).and_then(|_| stream.flush()) {
            warn!("Failed to send ctrl message, dropping connection: {e}");
            self.stream = None;
            return Err(Error::Io((e, "failed to send ctrl message")));
        }
        Ok(())
    }

    pub fn track_start(&mut self) -> Result<()> {
        self.send(&CtrlMessage::TrackStart)
    }

    pub fn track_stop(&mut self) -> Result<()> {
        self.send(&CtrlMessage::TrackStop)
    }

    pub fn headlight(&mut self, r: u8, g: u8, b: u8, brightness: u8) -> Result<()> {
        self.send(&CtrlMessage::Headlight { r, g, b, brightness })
    }

    pub fn laser(&mut self, on: bool) -> Result<()> {
        self.send(&CtrlMessage::Laser { on })
    }

    /// Close the connection. The client may be reused; the next send
    /// reconnects.
    pub fn close(&mut self) {
        self.stream = None;
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Error;
use crate::protocol::{CtrlMessage, MotionFrame, CTRL_MESSAGE_SIZE};
use log::{debug, error, info, warn};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use std::io::{ErrorKind, Read};
use std::net::SocketAddr;

/// Handler of decoded ctrl messages, one method per command tag.
///
/// The reserved drive command and unknown tags are reported through the
/// defaulted methods rather than rejected; overriding them is optional.
pub trait CtrlHandler: Send {
    fn on_track_start(&mut self);
    fn on_track_stop(&mut self);
    fn on_headlight(&mut self, r: u8, g: u8, b: u8, brightness: u8);
    fn on_laser(&mut self, on: bool);

    /// Reserved drive command; no current sender emits it
    fn on_drive(&mut self, frame: MotionFrame) {
        debug!("Ignoring reserved drive command ({frame})");
    }

    /// A tag this build does not know; dumped rather than rejected
    fn on_unknown(&mut self, tag: u8, payload: &[u8]) {
        warn!("Unknown ctrl tag 0x{tag:02X}, payload {payload:02X?}");
    }
}

/// Outcome of reading one fixed-size message from a client stream
enum ReadOutcome {
    /// The full message has been read
    Message,
    /// Zero read before the first byte of a message
    Disconnected,
    /// Zero read inside a message
    DisconnectedMidMessage(usize),
}

/// Accepts one ctrl client at a time and dispatches its commands.
///
/// Message boundaries are purely the fixed [CTRL_MESSAGE_SIZE] byte count,
/// there is no length prefix. A second client is served once the accept
/// loop cycles after the first disconnects.
pub struct CtrlReceiver {
    listener: TcpListener,
    listen_poll: Poll,
    listen_events: Events,
    conn_poll: Poll,
    conn_events: Events,
    local_addr: SocketAddr,
}

impl CtrlReceiver {
    /// Bind the listening socket
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let mut listener = TcpListener::bind(addr)
            .map_err(|e| Error::Io((e, "failed to bind ctrl listener")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::Io((e, "failed to query ctrl listener address")))?;
        let listen_poll =
            Poll::new().map_err(|e| Error::Io((e, "failed to create poll instance")))?;
        listen_poll
            .registry()
            .register(&mut listener, Token(0), Interest::READABLE)
            .map_err(|e| Error::Io((e, "failed to register ctrl listener for polling")))?;
        let conn_poll =
            Poll::new().map_err(|e| Error::Io((e, "failed to create poll instance")))?;
        Ok(CtrlReceiver {
            listener,
            listen_poll,
            listen_events: Events::with_capacity(16),
            conn_poll,
            conn_events: Events::with_capacity(16),
            local_addr,
        })
    }

    /// The bound local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept and serve clients forever, one connection at a time
    pub fn run(&mut self, handler: &mut dyn CtrlHandler) -> ! {
        info!("Ctrl receiver listening on {}", self.local_addr);
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    info!("Ctrl client connected: {peer}");
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Failed to set nodelay for {peer}: {e}");
                    }
                    self.serve_connection(&mut stream, peer, handler);
                    // dropping the stream deregisters it from the poll
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if let Err(e) = self.listen_poll.poll(&mut self.listen_events, None) {
                        error!("Polling ctrl listener failed: {e}");
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => (),
                Err(e) => warn!("Failed to accept ctrl client: {e}"),
            }
        }
    }

    /// Serve one client until it disconnects or fails
    fn serve_connection(
        &mut self,
        stream: &mut TcpStream,
        peer: SocketAddr,
        handler: &mut dyn CtrlHandler,
    ) {
        if let Err(e) =
            self.conn_poll
                .registry()
                .register(stream, Token(1), Interest::READABLE)
        {
            warn!("Failed to register ctrl client {peer} for polling: {e}");
            return;
        }

        let mut buffer = [0u8; CTRL_MESSAGE_SIZE];
        loop {
            match read_message(&mut buffer, stream, &mut self.conn_poll, &mut self.conn_events) {
                Ok(ReadOutcome::Message) => {
                    // cannot be short, the buffer holds a full message
                    match CtrlMessage::decode(&buffer) {
                        Ok(message) => dispatch(message, handler),
                        Err(e) => warn!("Failed to decode ctrl message from {peer}: {e}"),
                    }
                }
                Ok(ReadOutcome::Disconnected) => {
                    info!("Ctrl client disconnected: {peer}");
                    break;
                }
                Ok(ReadOutcome::DisconnectedMidMessage(got)) => {
                    warn!(
                        "Ctrl client {peer} closed mid-message ({got} of {CTRL_MESSAGE_SIZE} bytes)"
                    );
                    break;
                }
                Err(e) => {
                    warn!("Ctrl connection to {peer} failed: {e}");
                    break;
                }
            }
        }

        if let Err(e) = self.conn_poll.registry().deregister(stream) {
            debug!("Failed to deregister ctrl client {peer}: {e}");
        }
    }
}

/// Call the handler method matching the message tag
fn dispatch(message: CtrlMessage, handler: &mut dyn CtrlHandler) {
    debug!("Dispatching {message}");
    match message {
        CtrlMessage::TrackStart => handler.on_track_start(),
        CtrlMessage::TrackStop => handler.on_track_stop(),
        CtrlMessage::Headlight { r, g, b, brightness } => {
            handler.on_headlight(r, g, b, brightness)
        }
        CtrlMessage::Laser { on } => handler.on_laser(on),
        CtrlMessage::Drive(frame) => handler.on_drive(frame),
        CtrlMessage::Unknown { tag, payload } => handler.on_unknown(tag, &payload),
    }
}

// Read exactly one message worth of bytes from the stream. Partial reads
// are completed by polling until the stream is readable again; interruption
// is retried transparently.
fn read_message(
    buffer: &mut [u8; CTRL_MESSAGE_SIZE],
    stream: &mut TcpStream,
    poll: &mut Poll,
    events: &mut Events,
) -> Result<ReadOutcome> {
    let mut total_read = 0usize;
    while total_read < buffer.len() {
        match stream.read(&mut buffer[total_read..]) {
            Ok(0) => {
                return Ok(if total_read == 0 {
                    ReadOutcome::Disconnected
                } else {
                    ReadOutcome::DisconnectedMidMessage(total_read)
                });
            }
            Ok(n) => total_read += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                poll.poll(events, None)
                    .map_err(|e| Error::Io((e, "error while polling ctrl client")))?;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => (),
            Err(e) => return Err(Error::Io((e, "failed to read ctrl message"))),
        }
    }
    Ok(ReadOutcome::Message)
}

type Result<T, E = Error> = std::result::Result<T, E>;

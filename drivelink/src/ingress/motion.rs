// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Error;
use crate::protocol::{MotionFrame, MOTION_FRAME_SIZE};
use log::{error, info, warn};
use mio::net::UdpSocket;
use mio::{Events, Interest, Poll, Token};
use std::io::ErrorKind;
use std::net::SocketAddr;

// Generous so an oversized datagram is received whole and its true length
// can be reported instead of a truncated count.
const RECV_BUFFER_SIZE: usize = 2048;

/// Consumer of validated motion frames, e.g. the CAN bridge or a display
/// sink. The receiver logs a sink error and proceeds to the next datagram;
/// retrying is not the sink's business.
pub trait MotionSink: Send {
    fn on_frame(&mut self, frame: MotionFrame, source: SocketAddr) -> Result<()>;
}

/// Listens on a UDP port for 4-byte motion frames.
///
/// Datagrams whose length is not exactly [MOTION_FRAME_SIZE] are logged
/// with their source and byte count and dropped. No receive failure
/// terminates the loop; only a failing bind aborts at start-up.
pub struct MotionReceiver {
    socket: UdpSocket,
    poll: Poll,
    events: Events,
    local_addr: SocketAddr,
}

impl MotionReceiver {
    /// Bind the receive socket
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let mut socket =
            UdpSocket::bind(addr).map_err(|e| Error::Io((e, "failed to bind motion socket")))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::Io((e, "failed to query motion socket address")))?;
        let poll = Poll::new().map_err(|e| Error::Io((e, "failed to create poll instance")))?;
        poll.registry()
            .register(&mut socket, Token(0), Interest::READABLE)
            .map_err(|e| Error::Io((e, "failed to register motion socket for polling")))?;
        Ok(MotionReceiver {
            socket,
            poll,
            events: Events::with_capacity(16),
            local_addr,
        })
    }

    /// The bound local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive datagrams forever, handing each valid frame to `sink`
    pub fn run(&mut self, sink: &mut dyn MotionSink) -> ! {
        info!("Motion receiver listening on {}", self.local_addr);
        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        loop {
            // drain the socket, then wait for the next readiness event
            match self.socket.recv_from(&mut buffer) {
                Ok((len, source)) => handle_datagram(&buffer[..len], source, sink),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if let Err(e) = self.poll.poll(&mut self.events, None) {
                        error!("Polling motion socket failed: {e}");
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => (),
                Err(e) => warn!("Failed to receive motion datagram: {e}"),
            }
        }
    }
}

fn handle_datagram(datagram: &[u8], source: SocketAddr, sink: &mut dyn MotionSink) {
    if datagram.len() != MOTION_FRAME_SIZE {
        warn!(
            "Got {} bytes from {source} (expected {MOTION_FRAME_SIZE}), dropping",
            datagram.len()
        );
        return;
    }
    let frame = match MotionFrame::decode(datagram) {
        Ok(frame) => frame,
        Err(e) => {
            // unreachable after the length check, but never silently drop
            warn!("Failed to decode motion frame from {source}: {e}");
            return;
        }
    };
    if let Err(e) = sink.on_frame(frame, source) {
        error!("Motion sink failed for frame from {source}: {e}");
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GEAR_FORWARD;
    use std::net::UdpSocket as StdUdpSocket;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    struct ChannelSink {
        frames: mpsc::Sender<(MotionFrame, SocketAddr)>,
        fail_first: bool,
    }

    impl MotionSink for ChannelSink {
        fn on_frame(&mut self, frame: MotionFrame, source: SocketAddr) -> Result<()> {
            if self.fail_first {
                self.fail_first = false;
                return Err(Error::BusWrite {
                    written: 0,
                    expected: MOTION_FRAME_SIZE,
                });
            }
            self.frames.send((frame, source)).unwrap();
            Ok(())
        }
    }

    fn spawn_receiver(fail_first: bool) -> (SocketAddr, mpsc::Receiver<(MotionFrame, SocketAddr)>) {
        let mut receiver = MotionReceiver::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = receiver.local_addr();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut sink = ChannelSink {
                frames: tx,
                fail_first,
            };
            receiver.run(&mut sink)
        });
        (addr, rx)
    }

    #[test]
    fn short_datagram_never_reaches_the_sink() {
        let (addr, rx) = spawn_receiver(false);
        let socket = StdUdpSocket::bind(("127.0.0.1", 0)).unwrap();

        socket.send_to(&[0x00, 0xB4, 0x00], addr).unwrap();
        socket.send_to(&[0x00, 0xB4, 0x00, 0x50], addr).unwrap();

        // only the valid frame arrives; the short one was dropped before it
        let (frame, source) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            frame,
            MotionFrame {
                steering_deg: 180,
                gear: GEAR_FORWARD,
                speed: 80,
            }
        );
        assert_eq!(source, socket.local_addr().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn oversized_datagram_is_dropped() {
        let (addr, rx) = spawn_receiver(false);
        let socket = StdUdpSocket::bind(("127.0.0.1", 0)).unwrap();

        socket
            .send_to(&[0x00, 0xB4, 0x00, 0x50, 0xAA], addr)
            .unwrap();
        socket.send_to(&[0x55u8; 100], addr).unwrap();
        socket.send_to(&[0xFF, 0xE2, 0x01, 0x3C], addr).unwrap();

        let (frame, _) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.steering_deg, -30);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sink_failure_does_not_stop_the_loop() {
        let (addr, rx) = spawn_receiver(true);
        let socket = StdUdpSocket::bind(("127.0.0.1", 0)).unwrap();

        // first frame hits the failing sink, second must still be delivered
        socket.send_to(&[0x00, 0x00, 0x00, 0x00], addr).unwrap();
        socket.send_to(&[0x00, 0x0A, 0x00, 0x50], addr).unwrap();

        let (frame, _) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.steering_deg, 10);
        assert_eq!(frame.speed, 80);
    }
}

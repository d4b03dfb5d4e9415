// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Periodic broadcaster of the commanded motion state.

use crate::error::Error;
use crate::protocol::MotionFrame;
use crate::state::DriveStateStore;
use log::{debug, info, warn};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Background task that snapshots the [DriveStateStore] on a fixed period,
/// encodes a [MotionFrame] and fires it at the destination over UDP.
///
/// The link is best effort: a lost frame is superseded by the next tick and
/// a failed send never terminates the loop. `start` and `stop` take
/// `&mut self`, so a second loop cannot be created while one is running.
pub struct MotionPublisher {
    store: Arc<DriveStateStore>,
    running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MotionPublisher {
    /// Create a stopped publisher over the given store
    pub fn new(store: Arc<DriveStateStore>) -> Self {
        MotionPublisher {
            store,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Start the publish loop towards `destination` with the given period.
    ///
    /// Fails with [Error::InvalidArgument] if the period is zero or the
    /// destination does not resolve. Calling `start` on a running publisher
    /// is a no-op, not an error.
    pub fn start(&mut self, destination: impl ToSocketAddrs, period: Duration) -> Result<()> {
        if self.thread.is_some() {
            debug!("Motion publisher already running, ignoring start");
            return Ok(());
        }
        if period.is_zero() {
            return Err(Error::InvalidArgument("publish period must not be zero"));
        }
        let destination: SocketAddr = destination
            .to_socket_addrs()
            .map_err(|_| Error::InvalidArgument("publish destination did not resolve"))?
            .next()
            .ok_or(Error::InvalidArgument("publish destination did not resolve"))?;

        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .map_err(|e| Error::Io((e, "failed to open publisher socket")))?;

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let thread = thread::Builder::new()
            .name("drivelink-motion-tx".into())
            .spawn(move || run(socket, destination, period, store, running))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                Error::Io((e, "failed to spawn publisher thread"))
            })?;
        self.thread = Some(thread);

        info!("Motion publisher started towards {destination} with period {period:?}");
        Ok(())
    }

    /// Whether the publish loop is currently running
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stop the publish loop and wait for the background thread to exit.
    ///
    /// After return the socket is closed and no further frames are sent.
    /// Idempotent if already stopped.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        thread.join().expect("motion publisher thread panicked");
        info!("Motion publisher stopped");
    }
}

impl Drop for MotionPublisher {
    fn drop(&mut self) {
        self.stop()
    }
}

/// Publisher thread main function
fn run(
    socket: UdpSocket,
    destination: SocketAddr,
    period: Duration,
    store: Arc<DriveStateStore>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Acquire) {
        let frame = MotionFrame::from(store.get_state());
        let packet = frame.encode();
        if let Err(e) = socket.send_to(&packet, destination) {
            // transient; the next tick supersedes this frame anyway
            warn!("Failed to send motion frame to {destination}: {e}");
        }
        thread::sleep(period);
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DriveState, GEAR_FORWARD, MOTION_FRAME_SIZE};
    use std::io::ErrorKind;

    const PERIOD: Duration = Duration::from_millis(10);

    fn listener() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    fn recv_frame(socket: &UdpSocket) -> [u8; MOTION_FRAME_SIZE] {
        let mut buf = [0u8; MOTION_FRAME_SIZE];
        let (n, _) = socket.recv_from(&mut buf).unwrap();
        assert_eq!(n, MOTION_FRAME_SIZE);
        buf
    }

    #[test]
    fn rejects_zero_period() {
        let mut publisher = MotionPublisher::new(Arc::new(DriveStateStore::new()));
        assert!(matches!(
            publisher.start("127.0.0.1:9", Duration::ZERO),
            Err(Error::InvalidArgument(_))
        ));
        assert!(!publisher.is_running());
    }

    #[test]
    fn rejects_unresolvable_destination() {
        let mut publisher = MotionPublisher::new(Arc::new(DriveStateStore::new()));
        assert!(matches!(
            publisher.start("not-an-address", PERIOD),
            Err(Error::InvalidArgument(_))
        ));
        assert!(!publisher.is_running());
    }

    #[test]
    fn publishes_clamped_state() {
        let (socket, addr) = listener();
        let store = Arc::new(DriveStateStore::new());
        store.set_state(200, GEAR_FORWARD, 80);

        let mut publisher = MotionPublisher::new(Arc::clone(&store));
        publisher.start(addr, PERIOD).unwrap();
        assert_eq!(
            store.get_state(),
            DriveState {
                steering_deg: 180,
                gear: GEAR_FORWARD,
                speed: 80,
            }
        );
        assert_eq!(recv_frame(&socket), [0x00, 0xB4, 0x00, 0x50]);

        // a mutation is observed by a following tick, gear/speed untouched
        store.set_steering(-30);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            let frame = recv_frame(&socket);
            if frame == [0xFF, 0xE2, 0x00, 0x50] {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "update never published");
        }

        publisher.stop();
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let (_socket, addr) = listener();
        let mut publisher = MotionPublisher::new(Arc::new(DriveStateStore::new()));
        publisher.start(addr, PERIOD).unwrap();
        publisher.start(addr, PERIOD).unwrap();
        assert!(publisher.is_running());
        publisher.stop();
    }

    #[test]
    fn stop_joins_and_silences_the_link() {
        let (socket, addr) = listener();
        let mut publisher = MotionPublisher::new(Arc::new(DriveStateStore::new()));
        publisher.start(addr, PERIOD).unwrap();
        let _ = recv_frame(&socket);

        publisher.stop();
        assert!(!publisher.is_running());
        // stop is idempotent
        publisher.stop();

        // drain frames queued before the stop, then the link must stay quiet
        socket
            .set_read_timeout(Some(PERIOD * 5))
            .unwrap();
        let mut buf = [0u8; MOTION_FRAME_SIZE];
        loop {
            match socket.recv_from(&mut buf) {
                Ok(_) => continue,
                Err(e) => {
                    assert!(
                        matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
                        "unexpected recv error: {e}"
                    );
                    break;
                }
            }
        }
        assert!(socket.recv_from(&mut buf).is_err(), "frame sent after stop");
    }
}

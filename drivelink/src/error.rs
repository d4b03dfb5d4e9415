// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Drivelink Error implementation

/// Drivelink Error type
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Fewer bytes available than the wire format requires
    ShortPacket { expected: usize, actual: usize },
    /// Bad configuration passed to a component at start-up
    InvalidArgument(&'static str),
    /// I/O failure; loops log these and continue
    Io((std::io::Error, &'static str)),
    /// The CAN frame was not transferred completely
    BusWrite { written: usize, expected: usize },
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ShortPacket { expected, actual } => {
                write!(f, "Short packet, expected {expected} bytes, got {actual}")
            }
            Error::InvalidArgument(description) => {
                write!(f, "Invalid argument, {description}")
            }
            Error::Io((e, description)) => write!(f, "Io error: {description}, {e}"),
            Error::BusWrite { written, expected } => {
                write!(f, "Bus write incomplete, wrote {written} of {expected} bytes")
            }
        }
    }
}

//! Unified error types for the oven firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the superloop's error handling uniform. All variants are `Copy` so
//! they can be passed around without allocation.

use core::fmt;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple digitizer or one-wire bus failed.
    Sensor(SensorError),
    /// The host link failed.
    Link(LinkError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

/// One-wire sensor failures.
///
/// These never abort the control loop: the driver holds the last good
/// reading and counts consecutive failures instead (see
/// [`crate::sensors::max31850`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No presence pulse after a bus reset.
    NoPresence,
    /// Scratchpad CRC mismatch.
    CrcMismatch,
    /// The sensor's own fault bit is set (open/short thermocouple).
    SensorFault,
    /// GPIO read/write on the bus pin failed.
    BusPin,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::CrcMismatch => write!(f, "scratchpad CRC mismatch"),
            Self::SensorFault => write!(f, "thermocouple fault bit set"),
            Self::BusPin => write!(f, "bus pin I/O failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

/// Host-link transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The transport could not deliver or accept a frame.
    Io,
    /// An inbound frame exceeded the fixed buffer size.
    FrameTooLarge,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "transport I/O failed"),
            Self::FrameTooLarge => write!(f, "frame exceeds buffer"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

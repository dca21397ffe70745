//! Unified error types for the calibration fixture.
//!
//! A single attempt-level fault taxonomy plus a top-level `Error` that every
//! subsystem can convert into, keeping the control loop's error handling
//! uniform. Faults are `Copy` so they can travel through the sequencer and
//! into attempt records without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Attempt-level faults
// ---------------------------------------------------------------------------

/// Every way a single calibration attempt can fail.
///
/// All of these are recoverable: the sequencer maps them to
/// `AttemptResult::Failed`, powers the device down, and returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationFault {
    /// Fewer than the expected number of accepted characters arrived
    /// before the read deadline.
    Incomplete,
    /// The inbound frame's leading character was not the 'G' sentinel.
    BadSentinel,
    /// Recomputed checksum does not match the frame's trailing digit.
    ChecksumMismatch,
    /// The device reported a degenerate raw reading (zero, or one the
    /// model cannot divide through).
    InvalidReading,
    /// The computed set-point does not fit the 4-hex-digit encoding.
    ValueOutOfRange,
    /// The serial transport failed mid-read or mid-write.
    TransportError,
    /// The device did not echo the 'Y' acknowledgement.
    Unverified,
}

impl fmt::Display for CalibrationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "inbound frame incomplete"),
            Self::BadSentinel => write!(f, "bad sentinel character"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::InvalidReading => write!(f, "invalid raw reading"),
            Self::ValueOutOfRange => write!(f, "set-point out of range"),
            Self::TransportError => write!(f, "serial transport error"),
            Self::Unverified => write!(f, "acknowledgement missing or wrong"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Fixture-wide error type. Setup variants are the only fatal ones; a
/// `Fault` never terminates the process.
#[derive(Debug)]
pub enum Error {
    /// A calibration attempt failed (recoverable).
    Fault(CalibrationFault),
    /// The serial device could not be opened or configured.
    Serial(String),
    /// GPIO binding or initialisation failed.
    Gpio(String),
    /// Configuration file was present but invalid.
    Config(String),
    /// Filesystem error from the log sink or temperature probe.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(e) => write!(f, "attempt fault: {e}"),
            Self::Serial(msg) => write!(f, "serial: {msg}"),
            Self::Gpio(msg) => write!(f, "gpio: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CalibrationFault> for Error {
    fn from(e: CalibrationFault) -> Self {
        Self::Fault(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Fixture-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

//! Port traits — the boundary between the calibration engine and hardware.
//!
//! ```text
//!   Adapter (rppal / serialport / sysfs) ──▶ Port trait ──▶ Sequencer
//! ```
//!
//! Adapters implement these traits; the sequencer and channel consume them
//! via generics, so the protocol engine never touches hardware directly and
//! the whole attempt cycle runs under test with mock implementations.

use std::io;
use std::time::Duration;

use crate::sequencer::AttemptRecord;

// ───────────────────────────────────────────────────────────────
// Serial transport (driven adapter: UART → channel)
// ───────────────────────────────────────────────────────────────

/// Byte-level access to the half-duplex serial line.
///
/// No retries at this layer — retry policy belongs to the caller. Any line
/// fault surfaces as `Err`; the channel collapses all of them into
/// [`CalibrationFault::TransportError`](crate::error::CalibrationFault).
pub trait SerialTransport {
    /// Blocking read of at most one byte, bounded by `timeout`.
    /// `Ok(None)` means nothing arrived in time — not an error.
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>>;

    /// Write exactly one byte. Pacing between bytes is the channel's job.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// Mode control for the host's UART transmit pin.
///
/// The line is shared with the device during power sequencing: active means
/// UART-driven output, inactive means floating input (no bus contention).
/// The sequencer is the only component allowed to toggle it, and must leave
/// it inactive whenever it is not actively writing.
pub trait TransmitLine {
    fn set_active(&mut self, active: bool);
}

// ───────────────────────────────────────────────────────────────
// Fixture GPIO (power sequencing + trigger inputs)
// ───────────────────────────────────────────────────────────────

/// Digital control surface of the fixture: device power, programming
/// enable, and the two operator buttons.
///
/// Polarity is the adapter's concern — `set_programming_enable(true)` means
/// "signal the PIC to start calibrating" regardless of the wire level
/// (VPP is active-low on the current board).
pub trait FixtureGpio {
    /// Apply or remove VDD to the device under calibration.
    fn set_device_power(&mut self, on: bool);

    /// Assert or release the programming-enable (VPP) line.
    fn set_programming_enable(&mut self, active: bool);

    /// Sample the start-calibration trigger input.
    fn start_level(&mut self) -> bool;

    /// Sample the exit-application trigger input.
    fn exit_level(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Temperature probe (reference reading for the model)
// ───────────────────────────────────────────────────────────────

/// Ambient reference-temperature source.
///
/// `None` means the probe could not produce a reading this cycle; the
/// sequencer falls back to the configured reference constant.
pub trait TemperatureProbe {
    fn read_celsius(&mut self) -> Option<f64>;
}

// ───────────────────────────────────────────────────────────────
// Indicator panel (operator feedback)
// ───────────────────────────────────────────────────────────────

/// Pass/fail/busy signalling for the operator.
///
/// The pass and error indications are blocking by contract: they hold the
/// calling state for roughly 2 s (pass, solid green) and 2.5 s (error,
/// five red blinks). A non-blocking implementation may substitute its own
/// choreography but must still convey the same outcome.
pub trait IndicatorPanel {
    /// An attempt is running: idle lamp off, status lamp on.
    fn indicate_busy(&mut self);

    /// Back to idle: idle lamp on, status lamp off.
    fn indicate_idle(&mut self);

    /// Attempt passed. Blocks ~2 s while asserting the pass lamp.
    fn indicate_pass(&mut self);

    /// Attempt failed. Blocks ~2.5 s while blinking the idle lamp.
    fn indicate_error(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Attempt sink (per-attempt logging)
// ───────────────────────────────────────────────────────────────

/// Append-only record of calibration attempts.
///
/// One [`AttemptRecord`] per cycle; adapters decide the destination
/// (per-day text file in production, an in-memory vec under test).
pub trait AttemptSink {
    fn record(&mut self, record: &AttemptRecord);

    /// Note an operator-requested shutdown.
    fn record_exit(&mut self);
}

//! Deadline-bounded serial channel.
//!
//! Wraps a byte [`SerialTransport`] with the protocol's timing rules:
//! reads are bounded by a monotonic-clock deadline (never an iteration
//! count — that was speed-dependent on the old fixture software), writes
//! are paced one character at a time so the PIC's receive buffer is never
//! overrun, and the transmit pin can be parked as a floating input between
//! writes.

use std::time::{Duration, Instant};

use log::{trace, warn};

use crate::codec::accepted_char;
use crate::error::CalibrationFault;
use crate::ports::{SerialTransport, TransmitLine};

pub struct BoundedSerialChannel<T: SerialTransport, L: TransmitLine> {
    transport: T,
    tx_line: L,
    /// Pacing between transmitted characters.
    inter_char_delay: Duration,
    /// Upper bound on a single blocking transport read.
    byte_timeout: Duration,
    sleep: fn(Duration),
}

impl<T: SerialTransport, L: TransmitLine> BoundedSerialChannel<T, L> {
    pub fn new(
        transport: T,
        tx_line: L,
        inter_char_delay: Duration,
        byte_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            tx_line,
            inter_char_delay,
            byte_timeout,
            sleep: std::thread::sleep,
        }
    }

    /// Replace the pacing sleeper (tests run with a no-op).
    pub fn with_sleeper(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Collect up to `expected_len` accepted characters within `deadline`.
    ///
    /// Bytes outside the accepted whitelist are dropped as line noise
    /// without disturbing frame assembly. Returns whatever was collected
    /// when the deadline elapses — a short result is a valid return the
    /// caller must check, not an error. Only a transport fault errors.
    pub fn read_frame(
        &mut self,
        expected_len: usize,
        deadline: Duration,
    ) -> Result<Vec<char>, CalibrationFault> {
        let deadline_at = Instant::now() + deadline;
        let mut accepted = Vec::with_capacity(expected_len);

        while accepted.len() < expected_len {
            let now = Instant::now();
            if now >= deadline_at {
                break;
            }
            // Never block past the deadline: the per-read timeout is the
            // smaller of the byte timeout and the time remaining.
            let timeout = (deadline_at - now).min(self.byte_timeout);
            match self.transport.read_byte(timeout) {
                Ok(Some(byte)) => match accepted_char(byte) {
                    Some(c) => accepted.push(c),
                    None => trace!("dropping noise byte 0x{byte:02X}"),
                },
                Ok(None) => {}
                Err(e) => {
                    warn!("serial read failed: {e}");
                    return Err(CalibrationFault::TransportError);
                }
            }
        }

        Ok(accepted)
    }

    /// Transmit a frame one character at a time with fixed pacing after
    /// each character.
    pub fn write_frame(&mut self, frame: &[char]) -> Result<(), CalibrationFault> {
        for &c in frame {
            self.transport.write_byte(c as u8).map_err(|e| {
                warn!("serial write failed: {e}");
                CalibrationFault::TransportError
            })?;
            (self.sleep)(self.inter_char_delay);
        }
        Ok(())
    }

    /// Switch the transmit pin between UART-driven output and floating
    /// input. Kept inactive except while actually writing, to avoid
    /// driving the line against the device during power sequencing.
    pub fn set_transmit_active(&mut self, active: bool) {
        self.tx_line.set_active(active);
    }
}

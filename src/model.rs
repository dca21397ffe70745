//! Experimentally fitted linear calibration model.
//!
//! The PIC reports a raw averaged reading at ambient temperature; the model
//! extrapolates what the reading will be at the trigger temperature:
//!
//! ```text
//! slope     = (reference_c - offset) / raw
//! set_point = (trigger_c - offset) / slope
//!           = raw * (trigger_c - offset) / (reference_c - offset)
//! ```
//!
//! truncated toward zero. The constants were fitted on the bench and are
//! configuration, not derived state.

use crate::error::CalibrationFault;

/// Linear model parameters.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationModel {
    /// Fitted intercept term, in raw-reading units.
    average_offset: f64,
    /// Target trip temperature in the device's native units (°C).
    trigger_temperature: f64,
}

impl CalibrationModel {
    pub fn new(average_offset: f64, trigger_temperature: f64) -> Self {
        Self {
            average_offset,
            trigger_temperature,
        }
    }

    /// Compute the set-point for a raw device reading at the given
    /// reference (ambient) temperature.
    ///
    /// Deterministic and pure. A zero raw reading, or a reference equal to
    /// the offset (zero slope one step later in the reference formula),
    /// is a degenerate sensor condition and fails with
    /// [`CalibrationFault::InvalidReading`] — recoverable, not a crash.
    ///
    /// The result is returned as `i64` so a model extrapolating outside
    /// the encodable range is caught by the codec's range check rather
    /// than silently wrapped.
    pub fn compute_set_point(
        &self,
        raw_reading: u16,
        reference_c: f64,
    ) -> Result<i64, CalibrationFault> {
        if raw_reading == 0 {
            return Err(CalibrationFault::InvalidReading);
        }
        let denominator = reference_c - self.average_offset;
        if denominator == 0.0 {
            return Err(CalibrationFault::InvalidReading);
        }
        let value =
            f64::from(raw_reading) * (self.trigger_temperature - self.average_offset) / denominator;
        if !value.is_finite() {
            return Err(CalibrationFault::InvalidReading);
        }
        Ok(value.trunc() as i64)
    }
}

//! Fixture configuration.
//!
//! Everything that varies across fixture builds and firmware revisions in
//! one immutable structure, passed into the sequencer at construction.
//! Values can be overridden by a JSON file next to the binary; absent file
//! means defaults.
//!
//! Deliberately *not* here: the power-up settle delay. That is a hardware
//! requirement of the driver board, fixed in the sequencer.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pins;

/// Top-level fixture configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    pub serial: SerialConfig,
    pub framing: FramingConfig,
    pub model: ModelConfig,
    pub timing: TimingConfig,
    pub pins: PinConfig,
}

/// Serial line parameters. The wire format itself (9600-8-N with 1–2 stop
/// bits) is fixed by the PIC firmware; only the revision-dependent knobs
/// are exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path.
    pub device: String,
    /// Line baud rate.
    pub baud_rate: u32,
    /// Stop bits — 1 or 2, varies by firmware revision.
    pub stop_bits: u8,
}

/// Outbound frame shape knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Number of 'A' address bytes prefacing the set-point frame
    /// (0, 1 or 2 across firmware revisions).
    pub address_prefix_len: usize,
    /// Inter-character transmit pacing (ms). Must stay at or above the
    /// device receive buffer's tolerance (~1 ms).
    pub inter_char_delay_ms: u64,
    /// Hold after the last character before floating the transmit pin (ms).
    pub post_write_settle_ms: u64,
}

/// Linear-model constants (experimentally fitted) and the reference
/// fallback used when no probe reading is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fitted intercept, raw-reading units.
    pub average_offset: f64,
    /// Target trip temperature (°C).
    pub trigger_temperature_c: f64,
    /// Reference temperature assumed when the probe cannot be read (°C).
    pub fallback_reference_c: f64,
}

/// Wall-clock deadlines and loop pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Deadline for the 6-character inbound reading (ms).
    pub inbound_deadline_ms: u64,
    /// Deadline for the 1-character acknowledgement (ms).
    pub ack_deadline_ms: u64,
    /// Per-byte transport read timeout (ms); bounds how long one blocking
    /// read may overlap the deadline check.
    pub byte_timeout_ms: u64,
    /// Settle hold after process start before the fixture is ready (ms).
    pub startup_hold_ms: u64,
    /// Trigger-poll loop pacing (µs). Keeps the CPU from full-throttling.
    pub poll_interval_us: u64,
    /// Debounce window for the start/exit buttons (ms).
    pub button_debounce_ms: u64,
}

/// BCM pin assignments (defaults from [`pins`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub vdd: u8,
    pub vpp: u8,
    pub tx: u8,
    pub pass_led: u8,
    pub idle_led: u8,
    pub status_led: u8,
    pub start_button: u8,
    pub exit_button: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS0".to_owned(),
            baud_rate: 9600,
            stop_bits: 2,
        }
    }
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            address_prefix_len: 2,
            inter_char_delay_ms: 1,
            post_write_settle_ms: 5,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            average_offset: -671.0,
            trigger_temperature_c: 72.0,
            fallback_reference_c: 25.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inbound_deadline_ms: 5_000,
            ack_deadline_ms: 2_000,
            byte_timeout_ms: 200,
            startup_hold_ms: 3_000,
            poll_interval_us: 50,
            button_debounce_ms: 50,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            vdd: pins::VDD,
            vpp: pins::VPP,
            tx: pins::TX,
            pass_led: pins::PASS_LED,
            idle_led: pins::IDLE_LED,
            status_led: pins::STATUS_LED,
            start_button: pins::START_BUTTON,
            exit_button: pins::EXIT_BUTTON,
        }
    }
}

impl FixtureConfig {
    /// Load from a JSON file, falling back to defaults when the file does
    /// not exist. A present-but-invalid file is an error — a fixture
    /// running with silently ignored config is worse than one that
    /// refuses to start.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config: Self = serde_json::from_str(&text)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Reject values no firmware revision uses.
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=2).contains(&self.serial.stop_bits) {
            return Err(Error::Config("stop_bits must be 1 or 2".into()));
        }
        if self.framing.address_prefix_len > 2 {
            return Err(Error::Config("address_prefix_len must be 0, 1 or 2".into()));
        }
        if self.framing.inter_char_delay_ms == 0 {
            return Err(Error::Config(
                "inter_char_delay_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FixtureConfig::default().validate().is_ok());
    }

    #[test]
    fn default_matches_reference_fixture() {
        let cfg = FixtureConfig::default();
        assert_eq!(cfg.serial.baud_rate, 9600);
        assert_eq!(cfg.serial.stop_bits, 2);
        assert_eq!(cfg.framing.address_prefix_len, 2);
        assert_eq!(cfg.model.average_offset, -671.0);
        assert_eq!(cfg.pins.vdd, pins::VDD);
    }

    #[test]
    fn partial_overrides_keep_defaults() {
        let cfg: FixtureConfig =
            serde_json::from_str(r#"{ "framing": { "address_prefix_len": 1 } }"#).unwrap();
        assert_eq!(cfg.framing.address_prefix_len, 1);
        assert_eq!(cfg.serial.baud_rate, 9600);
    }

    #[test]
    fn bad_stop_bits_rejected() {
        let mut cfg = FixtureConfig::default();
        cfg.serial.stop_bits = 3;
        assert!(cfg.validate().is_err());
    }
}

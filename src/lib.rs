//! MPL2 temperature-calibration fixture controller.
//!
//! Drives one-shot calibration cycles against a PIC driver board: power
//! and VPP sequencing over GPIO, an ASCII framed/checksummed exchange over
//! half-duplex UART, a fitted linear model turning the device's raw
//! reading into a trip set-point, and pass/fail operator feedback.
//!
//! The protocol engine (codec, channel, model, sequencer) is pure logic
//! over port traits; everything hardware-specific lives in [`adapters`]
//! and is exercised only on the Pi (feature `rpi`).

#![deny(unused_must_use)]

pub mod channel;
pub mod codec;
pub mod config;
pub mod model;
pub mod ports;
pub mod sequencer;

pub mod adapters;
pub mod drivers;

mod error;
pub mod pins;

pub use error::{CalibrationFault, Error, Result};
pub use pins as default_pins;

//! Adapters — the only code that touches the outside world.
//!
//! Each adapter implements one of the port traits in [`crate::ports`]:
//! serialport-rs for the UART, rppal for the Pi's GPIO (feature `rpi`),
//! the 1-Wire sysfs interface for the reference probe, and a per-day text
//! file for the attempt log.

#[cfg(feature = "rpi")]
pub mod gpio;
pub mod log_sink;
pub mod probe;
pub mod serial;

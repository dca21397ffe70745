//! rppal GPIO adapter for the Raspberry Pi fixture board.
//!
//! Binds the BCM pins from [`PinConfig`] and maps the board's polarities
//! onto the logical port traits:
//!
//! - VDD is active-high (HIGH = device powered).
//! - VPP is active-low (pulled LOW to signal "start calibrating").
//! - The transmit pin is mode-switched between ALT5 (mini-UART TX) and a
//!   floating input, so the host never drives the line while the PIC is
//!   powering up.
//! - LEDs are active-high, buttons read active-high.

use rppal::gpio::{Gpio, InputPin, IoPin, Mode, OutputPin};

use crate::config::PinConfig;
use crate::drivers::indicator::LedLines;
use crate::error::Error;
use crate::ports::{FixtureGpio, TransmitLine};

fn bind_output(gpio: &Gpio, pin: u8) -> Result<OutputPin, Error> {
    Ok(gpio
        .get(pin)
        .map_err(|e| Error::Gpio(format!("BCM {pin}: {e}")))?
        .into_output())
}

fn bind_input(gpio: &Gpio, pin: u8) -> Result<InputPin, Error> {
    Ok(gpio
        .get(pin)
        .map_err(|e| Error::Gpio(format!("BCM {pin}: {e}")))?
        .into_input_pulldown())
}

// ───────────────────────────────────────────────────────────────
// Power / VPP / buttons
// ───────────────────────────────────────────────────────────────

pub struct RpiFixtureGpio {
    vdd: OutputPin,
    vpp: OutputPin,
    start: InputPin,
    exit: InputPin,
}

impl RpiFixtureGpio {
    /// Bind the sequencing pins and leave them in the safe state:
    /// device unpowered, VPP released.
    pub fn bind(gpio: &Gpio, pins: &PinConfig) -> Result<Self, Error> {
        let mut vdd = bind_output(gpio, pins.vdd)?;
        let mut vpp = bind_output(gpio, pins.vpp)?;
        vdd.set_low();
        vpp.set_high();
        Ok(Self {
            vdd,
            vpp,
            start: bind_input(gpio, pins.start_button)?,
            exit: bind_input(gpio, pins.exit_button)?,
        })
    }
}

impl FixtureGpio for RpiFixtureGpio {
    fn set_device_power(&mut self, on: bool) {
        if on {
            self.vdd.set_high();
        } else {
            self.vdd.set_low();
        }
    }

    fn set_programming_enable(&mut self, active: bool) {
        // Active-low: LOW tells the PIC to begin the calibration procedure.
        if active {
            self.vpp.set_low();
        } else {
            self.vpp.set_high();
        }
    }

    fn start_level(&mut self) -> bool {
        self.start.is_high()
    }

    fn exit_level(&mut self) -> bool {
        self.exit.is_high()
    }
}

// ───────────────────────────────────────────────────────────────
// Transmit line mode switch
// ───────────────────────────────────────────────────────────────

pub struct RpiTransmitLine {
    pin: IoPin,
}

impl RpiTransmitLine {
    /// Bind the TX pin, starting floated (input).
    pub fn bind(gpio: &Gpio, pins: &PinConfig) -> Result<Self, Error> {
        let pin = gpio
            .get(pins.tx)
            .map_err(|e| Error::Gpio(format!("BCM {}: {e}", pins.tx)))?
            .into_io(Mode::Input);
        Ok(Self { pin })
    }
}

impl TransmitLine for RpiTransmitLine {
    fn set_active(&mut self, active: bool) {
        if active {
            // ALT5 routes the mini-UART TX function back onto the pin.
            self.pin.set_mode(Mode::Alt5);
        } else {
            self.pin.set_mode(Mode::Input);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Indicator LED lines
// ───────────────────────────────────────────────────────────────

pub struct RpiLedLines {
    pass: OutputPin,
    idle: OutputPin,
    status: OutputPin,
}

impl RpiLedLines {
    pub fn bind(gpio: &Gpio, pins: &PinConfig) -> Result<Self, Error> {
        Ok(Self {
            pass: bind_output(gpio, pins.pass_led)?,
            idle: bind_output(gpio, pins.idle_led)?,
            status: bind_output(gpio, pins.status_led)?,
        })
    }
}

impl LedLines for RpiLedLines {
    fn set_pass(&mut self, on: bool) {
        if on {
            self.pass.set_high();
        } else {
            self.pass.set_low();
        }
    }

    fn set_idle(&mut self, on: bool) {
        if on {
            self.idle.set_high();
        } else {
            self.idle.set_low();
        }
    }

    fn set_status(&mut self, on: bool) {
        if on {
            self.status.set_high();
        } else {
            self.status.set_low();
        }
    }
}

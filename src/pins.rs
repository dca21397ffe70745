//! Default BCM pin assignments for the MPL2 programming fixture.
//!
//! Single source of truth — `FixtureConfig::default()` pulls from here
//! rather than hard-coding numbers. Assignments match the fixture wiring:
//! five pins to the driver board, three indicator LEDs, two buttons.

/// Device power rail (VDD) — digital output, HIGH = powered.
pub const VDD: u8 = 26;
/// Programming-enable (VPP) — digital output, pulled LOW to signal the
/// PIC that a calibration procedure should start.
pub const VPP: u8 = 24;
/// UART transmit pin — mode-switched between ALT5 (mini-UART TX) and
/// floating input while the device is not expecting data.
pub const TX: u8 = 14;
/// UART receive pin (owned by the kernel UART driver; listed for wiring
/// reference only).
pub const RX: u8 = 15;

/// Pass LED (green) — digital output.
pub const PASS_LED: u8 = 17;
/// Idle LED (red) — digital output; doubles as the error blinker.
pub const IDLE_LED: u8 = 18;
/// Status LED (white) — digital output, lit while an attempt is running.
pub const STATUS_LED: u8 = 23;

/// Start-calibration button — digital input, active HIGH.
pub const START_BUTTON: u8 = 27;
/// Exit-application button — digital input, active HIGH.
pub const EXIT_BUTTON: u8 = 22;

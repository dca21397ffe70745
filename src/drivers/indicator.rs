//! Three-LED indicator panel choreography.
//!
//! The fixture has a green pass LED, a red idle LED (doubling as the error
//! blinker) and a white status LED. The patterns are simple timed
//! sequences; durations are part of the [`IndicatorPanel`] contract so the
//! sequencer knows how long each indication holds its state.
//!
//! | Indication | Pattern                          | Blocks for |
//! |-----------|----------------------------------|-----------|
//! | busy      | idle off, status on              | —         |
//! | idle      | idle on, status off              | —         |
//! | pass      | green solid                      | ~2 s      |
//! | error     | red blink ×5 at 250 ms on/off    | ~2.5 s    |
//! | exit      | three-LED chase ×3 at 200 ms     | ~1.8 s    |

use std::time::Duration;

use crate::ports::IndicatorPanel;

const PASS_HOLD: Duration = Duration::from_millis(2_000);
const ERROR_BLINK_HALF: Duration = Duration::from_millis(250);
const ERROR_BLINKS: usize = 5;
const CHASE_STEP: Duration = Duration::from_millis(200);
const CHASE_ROUNDS: usize = 3;

/// Raw access to the three LED lines. The rppal adapter implements this
/// over output pins; tests implement it with a recorder.
pub trait LedLines {
    fn set_pass(&mut self, on: bool);
    fn set_idle(&mut self, on: bool);
    fn set_status(&mut self, on: bool);
}

/// Blocking indicator driver over a set of [`LedLines`].
pub struct Indicator<L: LedLines> {
    lines: L,
    sleep: fn(Duration),
}

impl<L: LedLines> Indicator<L> {
    pub fn new(lines: L) -> Self {
        Self {
            lines,
            sleep: std::thread::sleep,
        }
    }

    /// Replace the choreography sleeper (tests run with a no-op).
    pub fn with_sleeper(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Lamp test at process start: everything on.
    pub fn startup(&mut self) {
        self.lines.set_pass(true);
        self.lines.set_idle(true);
        self.lines.set_status(true);
    }

    /// System-ready indication after the startup hold: pass and status
    /// off, idle lamp left on.
    pub fn ready(&mut self) {
        self.lines.set_pass(false);
        self.lines.set_status(false);
    }

    /// Shutdown chase: status → pass → idle, three rounds. Blocks ~1.8 s
    /// and leaves every lamp off.
    pub fn exit_chase(&mut self) {
        self.lines.set_pass(false);
        self.lines.set_idle(false);
        self.lines.set_status(false);
        for _ in 0..CHASE_ROUNDS {
            self.lines.set_status(true);
            (self.sleep)(CHASE_STEP);
            self.lines.set_status(false);
            self.lines.set_pass(true);
            (self.sleep)(CHASE_STEP);
            self.lines.set_pass(false);
            self.lines.set_idle(true);
            (self.sleep)(CHASE_STEP);
            self.lines.set_idle(false);
        }
    }
}

impl<L: LedLines> IndicatorPanel for Indicator<L> {
    fn indicate_busy(&mut self) {
        self.lines.set_idle(false);
        self.lines.set_status(true);
    }

    fn indicate_idle(&mut self) {
        self.lines.set_idle(true);
        self.lines.set_status(false);
    }

    fn indicate_pass(&mut self) {
        self.lines.set_idle(false);
        self.lines.set_status(false);
        self.lines.set_pass(true);
        (self.sleep)(PASS_HOLD);
        self.lines.set_pass(false);
    }

    fn indicate_error(&mut self) {
        for _ in 0..ERROR_BLINKS {
            self.lines.set_idle(false);
            (self.sleep)(ERROR_BLINK_HALF);
            self.lines.set_idle(true);
            (self.sleep)(ERROR_BLINK_HALF);
        }
    }
}

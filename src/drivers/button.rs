//! Debounced trigger-button detector.
//!
//! The fixture buttons are level-polled from the control loop (no ISRs on
//! this board). A press fires exactly once after the level has been held
//! through the debounce window, and re-arms only after release — holding
//! the start button down cannot queue up a second attempt.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonState {
    Released,
    /// Level went high; waiting out the debounce window.
    DebounceWait { since: Instant },
    /// Fired; waiting for the level to drop before re-arming.
    Latched,
}

pub struct TriggerButton {
    debounce: Duration,
    state: ButtonState,
}

impl TriggerButton {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            state: ButtonState::Released,
        }
    }

    /// Feed one sampled level. Returns `true` exactly once per press.
    pub fn poll(&mut self, level: bool, now: Instant) -> bool {
        match self.state {
            ButtonState::Released => {
                if level {
                    self.state = ButtonState::DebounceWait { since: now };
                }
                false
            }
            ButtonState::DebounceWait { since } => {
                if !level {
                    self.state = ButtonState::Released;
                    false
                } else if now.duration_since(since) >= self.debounce {
                    self.state = ButtonState::Latched;
                    true
                } else {
                    false
                }
            }
            ButtonState::Latched => {
                if !level {
                    self.state = ButtonState::Released;
                }
                false
            }
        }
    }
}

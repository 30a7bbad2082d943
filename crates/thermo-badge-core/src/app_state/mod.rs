//! Badge-wide state and error types

use thiserror_no_std::Error;

/// Radio role of the badge.
///
/// Every badge starts in [`Mode::Send`] and nothing in the event handlers
/// switches it, so the receive-mode rejection in the radio handler is not
/// reachable on a running device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Send,
    Receive,
}

/// State shared between the event handlers.
///
/// Handlers receive it through [`crate::Badge`] rather than through globals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadgeState {
    mode: Mode,
    /// Running sum of accepted peer values. Never divided or reset.
    avg_temp: f64,
}

impl Default for BadgeState {
    fn default() -> Self {
        Self::new()
    }
}

impl BadgeState {
    /// Power-on state: send mode, empty accumulator
    pub const fn new() -> Self {
        Self {
            mode: Mode::Send,
            avg_temp: 0.0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current accumulator value, despite the name a running sum.
    pub fn avg_temp(&self) -> f64 {
        self.avg_temp
    }

    /// Add `amount` to the accumulator and return the new total.
    pub(crate) fn accumulate(&mut self, amount: f64) -> f64 {
        self.avg_temp += amount;
        self.avg_temp
    }

    #[cfg(test)]
    pub(crate) fn force_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }
}

/// Failure of a hardware port while a handler was running.
///
/// The port's own error is logged where it happens; this carries only the
/// operation that failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeError {
    #[error("display error during {0}")]
    Display(&'static str),
    #[error("audio error during {0}")]
    Audio(&'static str),
    #[error("pin error during {0}")]
    Pin(&'static str),
    #[error("radio error during {0}")]
    Radio(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let state = BadgeState::new();
        assert_eq!(state.mode(), Mode::Send);
        assert_eq!(state.avg_temp(), 0.0);
        assert_eq!(state, BadgeState::default());
    }

    #[test]
    fn test_accumulate_is_a_running_sum() {
        let mut state = BadgeState::new();
        assert_eq!(state.accumulate(21.5), 21.5);
        assert_eq!(state.accumulate(20.0), 41.5);
        assert_eq!(state.avg_temp(), 41.5);
    }
}

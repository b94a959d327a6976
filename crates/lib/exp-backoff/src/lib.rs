//! Exponential backoff calculator.

#![no_std]

use core::time::Duration;

/// An exponential backoff state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Factor to multiply the current delay to calculate the next one.
    pub factor: u32,

    /// Delay clamp.
    pub max: Duration,

    /// The first delay, restored by [`State::reset`].
    pub initial: Duration,

    /// Precomputed delay value to return.
    pub value: Duration,
}

impl State {
    /// Create a state that starts at `initial` and grows by `factor` up to `max`.
    pub const fn new(initial: Duration, factor: u32, max: Duration) -> Self {
        Self {
            factor,
            max,
            initial,
            value: initial,
        }
    }

    /// Obtain the stored delay value and precompute next one.
    pub fn advance(&mut self) -> Duration {
        let current = self.value;
        self.value = current.saturating_mul(self.factor).min(self.max);
        current
    }

    /// Peek the stored delay value.
    pub const fn peek(&self) -> Duration {
        self.value
    }

    /// Start over from the initial delay, e.g. after a successful attempt.
    pub fn reset(&mut self) {
        self.value = self.initial;
    }
}

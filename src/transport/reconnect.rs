//! Bounded reconnection policy
//!
//! Fixed delay, fixed attempt budget. The budget is refilled by every
//! successful open.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once the budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            Some(self.delay)
        } else {
            None
        }
    }

    /// Called after a successful open
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts made since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

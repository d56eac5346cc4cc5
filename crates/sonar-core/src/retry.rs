//! Retry policies for recovering from an unreadable world.

use std::time::Duration;

use crate::config::RetryConfig;

pub trait RetryStrategy {
    /// Delay before retry number `attempt` (1-based), or `None` to give up.
    fn delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration>;

    /// Attempt ceiling, used in diagnostics.
    fn max_attempts(&self) -> u32;
}

/// Constant delay with both an attempt ceiling and a wall-clock budget of
/// `delay * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.delay(), config.max_attempts)
    }

    pub fn budget(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts)
    }
}

impl RetryStrategy for FixedDelay {
    fn delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        if attempt > self.max_attempts || elapsed >= self.budget() {
            return None;
        }
        Some(self.delay)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Fail on the first fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn delay(&self, _attempt: u32, _elapsed: Duration) -> Option<Duration> {
        None
    }

    fn max_attempts(&self) -> u32 {
        0
    }
}

use std::time::Duration;

use crate::config::{JUDGE_PACING, MAX_ATTEMPTS};
use crate::models::CategoryQuota;

/// Attempt budget and model-call pacing handed to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay inserted between consecutive model calls
    pub pacing: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, pacing: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            pacing,
        }
    }

    /// No pacing at all. Used by tests and offline runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn attempts_for(&self, quota: &CategoryQuota) -> u32 {
        quota.max_attempts.unwrap_or(self.max_attempts).max(1)
    }

    pub fn pacer(&self) -> Pacer {
        Pacer {
            delay: self.pacing,
            primed: false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, JUDGE_PACING)
    }
}

/// Sleeps between calls, never before the first one.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    primed: bool,
}

impl Pacer {
    pub async fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.primed = true;
    }
}

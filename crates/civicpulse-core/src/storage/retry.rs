//! Retry loop for store writes that lose a race on the database lock.

use std::time::Duration;

use crate::error::Result;

/// How often, and how patiently, a contended write is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50))
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. Backoff grows linearly with the attempt number.
    ///
    /// `op` must re-read whatever it depends on; a retry never replays a
    /// value computed from a stale snapshot.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(attempt, max = self.max_attempts, "{what} contended, retrying: {err}");
                    std::thread::sleep(self.backoff * attempt);
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::error!(attempts = attempt, "{what} gave up: {err}");
                    }
                    return Err(err);
                }
            }
        }
    }
}

//! Retry and pacing policies
//!
//! Both are control-flow objects: business code hands them an operation (or
//! asks them to pace) instead of sleeping ad hoc.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::Result;

/// Linear backoff retry policy
///
/// Attempt `n` (1-based) that fails with a retryable error is followed by a
/// delay of `n * base_delay`. The error of the last attempt is returned
/// unchanged once `max_attempts` is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `operation` until it succeeds, fails terminally, or the attempt
    /// budget is spent. The operation receives the current attempt number.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Request succeeded on attempt {attempt}");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!("Giving up after attempt {attempt}: {e}");
                    return Err(e);
                }
            }
        }
    }
}

/// Fixed delay between consecutive steps
///
/// The first call to [`Throttle::pace`] returns immediately; every later call
/// waits `interval` first. [`Throttle::reset`] starts a new run of steps.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    primed: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            primed: false,
        }
    }

    pub async fn pace(&mut self) {
        if self.primed && !self.interval.is_zero() {
            debug!("Throttling for {:?}", self.interval);
            tokio::time::sleep(self.interval).await;
        }
        self.primed = true;
    }

    pub fn reset(&mut self) {
        self.primed = false;
    }
}

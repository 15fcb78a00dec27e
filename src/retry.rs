// src/retry.rs
//! Bounded exponential backoff around a single async call.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// `max_retries` extra attempts after the first one; the delay doubles after each
/// failure. No jitter, and every error is treated as retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delays slept between attempts, in order: d, 2d, 4d, ...
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let mut next = self.initial_delay;
        (0..self.max_retries).map(move |_| {
            let cur = next;
            next = next.checked_mul(2).unwrap_or(Duration::MAX);
            cur
        })
    }
}

/// Run `op` until it succeeds or the policy is exhausted, then return the last error.
/// Suspends the calling task for the backoff delays.
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delays = policy.delays();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match delays.next() {
                Some(delay) => {
                    warn!(
                        target: "retry",
                        %label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(target: "retry", %label, attempt, error = %e, "retries exhausted");
                    return Err(e);
                }
            },
        }
    }
}

//! Fixed-delay retry for connection-level transport failures.

use std::{thread, time::Duration};

use crate::error::TransportError;
use crate::http::HttpMethod;

/// How many times, and how far apart, a failed request is re-attempted.
///
/// `retries` counts attempts after the first one, so a request is tried at
/// most `retries + 1` times and sleeps `delay` before each retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_millis(100),
            retry_non_idempotent: true,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { retries: 0, ..Self::default() }
    }

    /// Whether `error` on a `method` request may be attempted again.
    pub fn should_retry(&self, method: HttpMethod, error: &TransportError) -> bool {
        if !error.is_retryable() {
            return false;
        }
        method.is_idempotent() || self.retry_non_idempotent || error.is_pre_send()
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent. The last error is returned.
    pub fn run<T, F>(&self, method: HttpMethod, mut attempt: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Result<T, TransportError>,
    {
        let mut retries_done = 0;
        loop {
            match attempt() {
                Ok(value) => {
                    if retries_done > 0 {
                        tracing::info!(retries = retries_done, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    tracing::warn!(
                        attempt = retries_done + 1,
                        max_attempts = self.retries + 1,
                        %method,
                        error = %error,
                        "request attempt failed"
                    );

                    if retries_done >= self.retries || !self.should_retry(method, &error) {
                        return Err(error);
                    }

                    tracing::debug!(delay_ms = self.delay.as_millis() as u64, "sleeping before retry");
                    thread::sleep(self.delay);
                    retries_done += 1;
                }
            }
        }
    }
}

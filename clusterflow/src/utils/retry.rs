//! Bounded retry with exponential backoff.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry configuration.
///
/// `max_attempts` counts the first try, so `1` disables retrying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_attempts: usize,
    /// Initial delay between retries, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries, in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Whether to add jitter.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 200,
            max_delay_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Disables jitter.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Calculates the delay for a given attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = base_delay.min(self.max_delay_ms as f64).max(0.0);

        let final_delay = if self.jitter {
            // Add up to 25% jitter
            let jitter = capped * 0.25 * rand::random::<f64>();
            capped + jitter
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay / 1000.0)
    }
}

/// Runs an operation until it succeeds, the policy is exhausted, or the
/// error is not worth retrying.
///
/// Always makes at least one attempt.
pub async fn run_with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = policy.delay_for_attempt(attempt - 1);
                tracing::debug!(
                    "Attempt {} failed: {}. Retrying in {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

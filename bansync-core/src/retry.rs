//! Bounded retry with optional exponential backoff

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Upper bound for a single backoff delay
const MAX_DELAY: Duration = Duration::from_secs(300);

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Wait after the first failure
    #[serde(with = "humantime_serde")]
    pub delay: Duration,

    /// Multiplier applied to the delay after each further failure
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            backoff: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: 1.0,
        }
    }

    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.delay.as_secs_f64() * self.backoff.max(1.0).powi(exponent);
        Duration::from_secs_f64(secs.min(MAX_DELAY.as_secs_f64()).max(0.0))
    }
}

/// Run `operation` until it succeeds or the policy runs out of attempts.
///
/// Every failure is logged; the error of the final attempt is returned. The
/// closure receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut f: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(operation, attempt, max_attempts, error = %e, "Attempt failed");
                if attempt >= max_attempts {
                    error!(operation, attempts = max_attempts, "Giving up");
                    return Err(e);
                }
                let delay = policy.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

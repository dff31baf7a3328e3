//!
//! # Retry Policy
//!
//! Exponential backoff applied uniformly to every retryable step
//! invocation. Delays are computed deterministically (no jitter): the saga
//! body must replay identically under a durable-execution substrate.
//!

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SagaConfig;
use crate::error::ProvisioningError;
use crate::port::StepFailure;

/// Backoff configuration for retryable step failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied per attempt.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_interval: Duration,
    /// Total invocation budget, including the first attempt.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// Default: 3 attempts, 1s initial delay doubling up to 60s.
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_interval: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay to sleep after the given failed attempt (1-indexed).
    ///
    /// `initial * multiplier^(attempt-1)`, capped at `max_interval`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis =
            self.initial_interval.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Drive one step invocation through the retry policy.
///
/// Each attempt is bounded by the configured step timeout; a timeout
/// counts as a retryable failure. Non-retryable failures propagate on the
/// first occurrence; retryable ones are re-attempted until the budget is
/// exhausted, after which they become terminal.
pub async fn execute_with_retry<T, F, Fut>(
    config: &SagaConfig,
    step: &'static str,
    mut operation: F,
) -> Result<T, ProvisioningError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StepFailure>>,
{
    let policy = &config.retry;
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(config.step_timeout, operation()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StepFailure::retryable(format!(
                "timed out after {}ms",
                config.step_timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(value) => {
                if attempt > 1 {
                    info!(step, attempt, "step succeeded after retry");
                }
                return Ok(value);
            }
            Err(failure) if !failure.retryable => {
                return Err(ProvisioningError::StepExecution {
                    step,
                    message: failure.message,
                    retryable: false,
                });
            }
            Err(failure) => {
                if attempt >= policy.max_attempts {
                    return Err(ProvisioningError::StepExecution {
                        step,
                        message: format!("{} (after {} attempts)", failure.message, attempt),
                        retryable: true,
                    });
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    step,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "step failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> SagaConfig {
        SagaConfig::default().with_retry(
            RetryPolicy::new()
                .with_initial_interval(Duration::from_millis(1))
                .with_max_interval(Duration::from_millis(2))
                .with_max_attempts(max_attempts),
        )
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let policy = RetryPolicy::new()
            .with_initial_interval(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_interval(Duration::from_millis(350));

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        // 400ms uncapped, clamped to the interval ceiling
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(350));
    }

    #[test]
    fn test_attempt_budget_floor() {
        let policy = RetryPolicy::new().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let config = fast_config(3);
        let result: Result<u32, _> =
            execute_with_retry(&config, "step", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retryable_failure_consumes_budget() {
        let config = fast_config(4);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = execute_with_retry(&config, "step", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StepFailure::retryable("boom")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result.unwrap_err() {
            ProvisioningError::StepExecution {
                retryable, message, ..
            } => {
                assert!(retryable);
                assert!(message.contains("after 4 attempts"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_failure_short_circuits() {
        let config = fast_config(5);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = execute_with_retry(&config, "step", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StepFailure::permanent("invalid input")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_recovery_after_transient_failures() {
        let config = fast_config(3);
        let calls = AtomicU32::new(0);

        let result = execute_with_retry(&config, "step", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StepFailure::retryable("transient"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let config = SagaConfig::default()
            .with_step_timeout(Duration::from_millis(5))
            .with_retry(
                RetryPolicy::new()
                    .with_initial_interval(Duration::from_millis(1))
                    .with_max_attempts(2),
            );
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = execute_with_retry(&config, "step", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let error = result.unwrap_err();
        assert!(error.to_string().contains("timed out"));
    }
}

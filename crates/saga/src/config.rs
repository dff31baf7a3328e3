//! # Saga Configuration
//!
//! Tunables for step retries and timeouts, with builder-style setters and
//! an environment loader for deployed workers.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for one saga controller instance.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Retry policy applied uniformly to every retryable step invocation.
    pub retry: RetryPolicy,
    /// Upper bound on a single step attempt.
    pub step_timeout: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            step_timeout: Duration::from_secs(300),
        }
    }
}

impl SagaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable:
    ///
    /// - `PROVISIONER_MAX_ATTEMPTS`
    /// - `PROVISIONER_RETRY_INITIAL_MS`
    /// - `PROVISIONER_RETRY_MAX_MS`
    /// - `PROVISIONER_STEP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry_defaults = defaults.retry;

        let retry = RetryPolicy::new()
            .with_max_attempts(
                env_parse("PROVISIONER_MAX_ATTEMPTS").unwrap_or(retry_defaults.max_attempts),
            )
            .with_initial_interval(
                env_parse("PROVISIONER_RETRY_INITIAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(retry_defaults.initial_interval),
            )
            .with_max_interval(
                env_parse("PROVISIONER_RETRY_MAX_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(retry_defaults.max_interval),
            );

        Self {
            retry,
            step_timeout: env_parse("PROVISIONER_STEP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.step_timeout),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SagaConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.step_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_builder() {
        let config = SagaConfig::new()
            .with_step_timeout(Duration::from_secs(30))
            .with_retry(RetryPolicy::new().with_max_attempts(5));

        assert_eq!(config.step_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_env_loading() {
        std::env::set_var("PROVISIONER_MAX_ATTEMPTS", "7");
        std::env::set_var("PROVISIONER_RETRY_INITIAL_MS", "250");

        let config = SagaConfig::from_env();
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.retry.initial_interval, Duration::from_millis(250));
        // unset vars keep defaults
        assert_eq!(config.step_timeout, Duration::from_secs(300));

        std::env::remove_var("PROVISIONER_MAX_ATTEMPTS");
        std::env::remove_var("PROVISIONER_RETRY_INITIAL_MS");
    }
}

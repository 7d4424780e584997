//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Time limit for a single attempt
    pub attempt_timeout: Duration,
    /// Stop retrying once the accumulated delay reaches this
    pub max_total_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(60),
            max_total_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before retry number `attempt` (1-based), without error hints
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return self.initial_delay.min(self.max_delay);
        }
        let secs = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt as f64 - 1.0);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Rate limit exceeded (with optional retry-after seconds)
    RateLimit(Option<u64>),
    /// Server error (5xx)
    ServerError,
    /// Request timeout
    Timeout,
}

impl TransientError {
    /// Classify a source error, `None` for permanent failures
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit(retry_after) => Some(TransientError::RateLimit(*retry_after)),
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Unavailable(_) => Some(TransientError::ServerError),
            SourceError::Timeout => Some(TransientError::Timeout),
            _ => None,
        }
    }

    /// Get the recommended delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit(Some(seconds)) => Duration::from_secs(*seconds + 1),
            TransientError::RateLimit(None) => Duration::from_secs(5),
            TransientError::ServerError => Duration::from_secs(2),
            TransientError::Timeout => Duration::from_secs(2),
            TransientError::Network => Duration::from_secs(1),
        }
    }
}

/// Execute an async operation, retrying transient failures with backoff.
///
/// Permanent errors are returned immediately. Each attempt is bounded by
/// `attempt_timeout`; a timed out attempt counts as a transient failure.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;
    let mut total_delay = Duration::ZERO;
    let mut operation = operation;

    loop {
        attempts += 1;

        let error = match timeout(config.attempt_timeout, operation()).await {
            Ok(Ok(result)) => {
                if attempts > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Ok(Err(error)) => error,
            Err(_) => SourceError::Timeout,
        };

        let Some(transient) = TransientError::from_source_error(&error) else {
            return Err(error);
        };

        // Error hints may lengthen the delay but never past max_delay
        let delay = config
            .backoff(attempts)
            .max(transient.recommended_delay())
            .min(config.max_delay);

        if attempts >= config.max_attempts || total_delay + delay > config.max_total_delay {
            tracing::warn!(
                "Operation failed after {} attempts (total delay: {:?}): {}",
                attempts,
                total_delay,
                error
            );
            return Err(error);
        }

        tracing::debug!(
            "Transient error on attempt {}: {:?}, retrying in {:?}",
            attempts,
            transient,
            delay
        );

        total_delay += delay;
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 4,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(5),
            max_total_delay: Duration::from_secs(5),
        }
    }

    /// Runs `with_retry` over an operation that fails with `fail` for the
    /// first `failures` calls, returning the result and the number of calls.
    async fn run(
        config: RetryConfig,
        failures: u32,
        fail: fn() -> SourceError,
    ) -> (Result<u32, SourceError>, u32) {
        let calls = AtomicU32::new(0);
        let result = with_retry(config, || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call <= failures {
                    Err(fail())
                } else {
                    Ok(call)
                }
            }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let (result, calls) = run(fast_config(), 0, || SourceError::Timeout).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_recovers_from_server_errors() {
        let (result, calls) = run(fast_config(), 2, || {
            SourceError::Unavailable("503 Service Unavailable".to_string())
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (result, calls) = run(fast_config().max_attempts(2), u32::MAX, || {
            SourceError::Network("connection reset".to_string())
        })
        .await;
        assert!(matches!(result, Err(SourceError::Network(_))));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let (result, calls) = run(fast_config(), u32::MAX, || {
            SourceError::NotFound("2301.00000".to_string())
        })
        .await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_total_delay_cap_stops_retries() {
        let config = RetryConfig {
            max_total_delay: Duration::from_millis(1),
            ..fast_config()
        };
        let (result, calls) = run(config, u32::MAX, || SourceError::RateLimit(None)).await;
        assert!(matches!(result, Err(SourceError::RateLimit(None))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_transient() {
        let config = RetryConfig {
            attempt_timeout: Duration::from_millis(10),
            ..fast_config()
        }
        .max_attempts(2);

        let result: Result<(), SourceError> = with_retry(config, || async {
            sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(SourceError::Timeout)));
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            TransientError::from_source_error(&SourceError::RateLimit(Some(3))),
            Some(TransientError::RateLimit(Some(3)))
        );
        assert!(TransientError::from_source_error(&SourceError::Network("x".into())).is_some());
        assert!(TransientError::from_source_error(&SourceError::Unavailable("x".into())).is_some());
        assert!(TransientError::from_source_error(&SourceError::Api("400".into())).is_none());
        assert!(TransientError::from_source_error(&SourceError::InvalidRequest("x".into())).is_none());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
            ..RetryConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(500));
        assert_eq!(config.backoff(2), Duration::from_secs(1));
        assert_eq!(config.backoff(3), Duration::from_secs(2));
        assert_eq!(config.backoff(4), Duration::from_secs(3));
    }

    #[test]
    fn test_rate_limit_hint_adds_a_second() {
        assert_eq!(
            TransientError::RateLimit(Some(30)).recommended_delay(),
            Duration::from_secs(31)
        );
        assert_eq!(TransientError::RateLimit(None).recommended_delay(), Duration::from_secs(5));
    }
}

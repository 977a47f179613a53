use super::error::ServiceError;
use crate::config::LimitsConfig;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded-retry policy shared by every remote call in the process.
///
/// Stages never retry on their own; this is the single place the retry
/// discipline lives.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per subsequent retry
    pub initial_delay: Duration,
    /// Backoff cap
    pub max_delay: Duration,
    /// Per-attempt timeout; an elapsed call counts as unavailable
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(limits.retry_initial_delay_ms),
            max_delay: Duration::from_millis(limits.retry_max_delay_ms),
            call_timeout: Duration::from_secs(limits.request_timeout_secs),
        }
    }

    /// Backoff to sleep before retry number `retry` (1-based), doubling
    /// from the initial delay and capped.
    pub fn delay_before(&self, retry: u32) -> Duration {
        let doubled = self
            .initial_delay
            .saturating_mul(1u32 << (retry.saturating_sub(1)).min(16));
        doubled.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_limits(&LimitsConfig::default())
    }
}

/// Run `call` under the policy: each attempt is bounded by the call
/// timeout, and only transient unavailability is retried. Authentication
/// and unsupported-response failures propagate on the first attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(policy.call_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Unavailable {
                capability: operation.to_string(),
                reason: format!("no response within {:?}", policy.call_timeout),
            }),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_before(attempt);
                warn!(
                    "{} unavailable (attempt {}/{}), retrying in {:?}: {}",
                    operation, attempt, policy.max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/*!
 * Retry/backoff executor for generation calls.
 *
 * Each attempt is bounded by a per-call timeout and, optionally, by a shared
 * semaphore capping external calls in flight across the process. Only hard
 * failures (provider errors, timeouts) are retried; soft failures return at
 * once.
 */

use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::app_config::DispatchConfig;
use crate::errors::{CallFailure, ProviderError};

/// Result of running an operation under the retry policy
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final success or the last failure
    pub result: Result<T, CallFailure>,

    /// Attempts made, first one included
    pub attempts: u32,
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs generation calls with bounded retries, exponential backoff and a timeout
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    /// Maximum attempts, first attempt included
    max_attempts: u32,

    /// Delay before the first retry, doubled for each further retry
    base_delay: Duration,

    /// Bound on a single attempt
    call_timeout: Duration,

    /// Shared cap on in-flight external calls
    limiter: Option<Arc<Semaphore>>,
}

impl RetryExecutor {
    pub fn new(max_attempts: u32, base_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            call_timeout,
            limiter: None,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.max_attempts, config.retry_base_delay(), config.call_timeout())
    }

    /// Gate every attempt behind a permit from `limiter`
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Delay before 0-indexed attempt `attempt`: none before the first, then
    /// `base`, `2 * base`, `4 * base`, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, soft-fails, or attempts run out.
    ///
    /// The operation receives the 0-indexed attempt number.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        let mut attempt = 0;

        loop {
            let delay = self.backoff_delay(attempt);
            if !delay.is_zero() {
                debug!("Retrying in {:?} (attempt {} of {})", delay, attempt + 1, self.max_attempts);
                tokio::time::sleep(delay).await;
            }

            let result = self.attempt_once(operation(attempt)).await;
            attempt += 1;

            match result {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(failure) if !failure.is_retryable() => {
                    debug!("Not retrying soft failure: {}", failure);
                    return RetryOutcome {
                        result: Err(failure),
                        attempts: attempt,
                    };
                }
                Err(failure) if attempt >= self.max_attempts => {
                    warn!("Giving up after {} attempt(s): {}", attempt, failure);
                    return RetryOutcome {
                        result: Err(failure),
                        attempts: attempt,
                    };
                }
                Err(failure) => {
                    debug!("Attempt {} failed: {}", attempt, failure);
                }
            }
        }
    }

    async fn attempt_once<T, Fut>(&self, call: Fut) -> Result<T, CallFailure>
    where
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        // Permit is held for the attempt only, never across backoff sleeps
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.clone().acquire_owned().await.map_err(|e| {
                CallFailure::Hard(ProviderError::ConnectionError(format!("call limiter closed: {}", e)))
            })?),
            None => None,
        };

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CallFailure::Timeout(self.call_timeout)),
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

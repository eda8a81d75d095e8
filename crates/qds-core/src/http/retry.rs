//! Retry logic with exponential backoff for HTTP requests
//!
//! Which failures are retried depends on the verb class: idempotent reads
//! retry on any transient failure, mutating calls only when the service
//! explicitly asks the caller to come back later.

use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Method;

use crate::http::error::HttpError;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 7;

/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(10);

/// Failure classes a call may be retried on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// GET: 502/504/449, 429/503, other 5xx and timeouts
    Idempotent,
    /// POST/PUT/DELETE: only 429/503
    ThrottledOnly,
}

impl RetryOn {
    /// Retry class for an HTTP method
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD {
            Self::Idempotent
        } else {
            Self::ThrottledOnly
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Factor applied to the delay after every retry
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Default::default()
        }
    }

    /// Create an exponential backoff instance
    ///
    /// No jitter and no cap; the attempt count bounds the loop.
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: f64::from(self.multiplier),
            max_interval: Duration::MAX,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Delay slept before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut backoff = self.create_backoff();
        let mut delay = self.base_delay;
        for _ in 0..retry.max(1) {
            delay = backoff.next_backoff().unwrap_or(delay);
        }
        delay
    }

    /// Run `request_fn`, retrying the failures `retry_on` allows
    ///
    /// After `max_retries` retries one last attempt is made and its error,
    /// retryable or not, is returned to the caller.
    pub async fn execute<F, Fut, T>(&self, mut request_fn: F, retry_on: RetryOn) -> Result<T, HttpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HttpError>>,
    {
        let mut remaining = self.max_retries;
        let mut backoff = self.create_backoff();
        let mut retry = 0;

        while remaining > 0 {
            match request_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if error.should_retry(retry_on) => {
                    retry += 1;
                    let delay = backoff.next_backoff().unwrap_or(self.base_delay);
                    tracing::warn!(
                        retry,
                        remaining,
                        delay_secs = delay.as_secs_f64(),
                        classification = %error.classification,
                        "Request failed, retrying: {}",
                        error.message
                    );
                    tokio::time::sleep(delay).await;
                    remaining -= 1;
                }
                Err(error) => return Err(error),
            }
        }

        request_fn().await.map_err(|error| {
            if retry > 0 {
                tracing::error!(
                    attempts = retry + 1,
                    classification = %error.classification,
                    "Request failed after exhausting retries: {}",
                    error.message
                );
            }
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorClassification;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn failure(code: u16) -> HttpError {
        HttpError::from_status(code, String::new(), None)
    }

    fn timeout() -> HttpError {
        HttpError {
            status_code: None,
            classification: ErrorClassification::Timeout,
            message: "Request timed out".to_string(),
            body: None,
            trace_id: None,
            url: None,
        }
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 7);
        assert_eq!(policy.base_delay, Duration::from_secs(10));
        assert_eq!(policy.multiplier, 2);
    }

    #[test]
    fn test_backoff_has_no_jitter_or_cap() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.create_backoff();
        let delays: Vec<u64> = (0..7)
            .map(|_| backoff.next_backoff().unwrap().as_secs())
            .collect();

        assert_eq!(delays, vec![10, 20, 40, 80, 160, 320, 640]);
        assert_eq!(backoff.max_elapsed_time, None);
        assert_eq!(backoff.randomization_factor, 0.0);
    }

    #[test]
    fn test_retry_class_for_method() {
        assert_eq!(RetryOn::for_method(&Method::GET), RetryOn::Idempotent);
        assert_eq!(RetryOn::for_method(&Method::POST), RetryOn::ThrottledOnly);
        assert_eq!(RetryOn::for_method(&Method::PUT), RetryOn::ThrottledOnly);
        assert_eq!(RetryOn::for_method(&Method::DELETE), RetryOn::ThrottledOnly);
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new(4, Duration::from_secs(3));
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for(2), Duration::from_secs(6));
        assert_eq!(policy.delay_for(3), Duration::from_secs(12));
        assert_eq!(policy.delay_for(4), Duration::from_secs(24));
    }

    /// Runs `policy` against an operation that always fails with `make_error`,
    /// returning the instants of each invocation.
    async fn record_attempts(
        policy: &RetryPolicy,
        retry_on: RetryOn,
        make_error: fn() -> HttpError,
    ) -> (Result<(), HttpError>, Vec<Instant>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let recorded = attempts.clone();

        let result = policy
            .execute(
                move || {
                    let recorded = recorded.clone();
                    async move {
                        recorded.lock().unwrap().push(Instant::now());
                        Err::<(), _>(make_error())
                    }
                },
                retry_on,
            )
            .await;

        let attempts = attempts.lock().unwrap().clone();
        (result, attempts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idempotent_timeout_exhausts_budget() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let (result, attempts) = record_attempts(&policy, RetryOn::Idempotent, timeout).await;

        assert_eq!(result.unwrap_err().classification, ErrorClassification::Timeout);
        assert_eq!(attempts.len(), 4);

        let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![Duration::from_secs(2), Duration::from_secs(4), Duration::from_secs(8)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idempotent_server_error_delays_double() {
        let policy = RetryPolicy::new(7, Duration::from_secs(10));
        let (result, attempts) = record_attempts(&policy, RetryOn::Idempotent, || failure(500)).await;

        assert_eq!(result.unwrap_err().classification, ErrorClassification::ServerError);
        assert_eq!(attempts.len(), 8);

        for (k, window) in attempts.windows(2).enumerate() {
            let expected = Duration::from_secs(10) * 2u32.pow(k as u32);
            assert_eq!(window[1] - window[0], expected, "gap after attempt {}", k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutating_server_error_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let (result, attempts) =
            record_attempts(&policy, RetryOn::ThrottledOnly, || failure(500)).await;

        assert_eq!(result.unwrap_err().classification, ErrorClassification::ServerError);
        assert_eq!(attempts.len(), 1);

        let (_, attempts) = record_attempts(&policy, RetryOn::ThrottledOnly, timeout).await;
        assert_eq!(attempts.len(), 1);

        let (_, attempts) = record_attempts(&policy, RetryOn::ThrottledOnly, || failure(502)).await;
        assert_eq!(attempts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutating_throttled_is_retried() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let (result, attempts) =
            record_attempts(&policy, RetryOn::ThrottledOnly, || failure(429)).await;

        assert_eq!(
            result.unwrap_err().classification,
            ErrorClassification::AlwaysRetryableDelay
        );
        assert_eq!(attempts.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_returns_immediately() {
        let policy = RetryPolicy::default();
        let (result, attempts) = record_attempts(&policy, RetryOn::Idempotent, || failure(404)).await;

        assert_eq!(result.unwrap_err().classification, ErrorClassification::NotFound);
        assert_eq!(attempts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = policy
            .execute(
                move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(failure(503))
                        } else {
                            Ok("ok")
                        }
                    }
                },
                RetryOn::ThrottledOnly,
            )
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let (_, attempts) = record_attempts(&policy, RetryOn::Idempotent, || failure(500)).await;
        assert_eq!(attempts.len(), 1);
    }
}

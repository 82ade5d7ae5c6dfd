//! # Rate-Limited Retrying Client
//!
//! This module provides the capability every per-source client composes: a
//! fixed-interval throttle combined with an exponential-backoff retry loop
//! around a single logical network call.
//!
//! ## Key Features:
//! - **Pacing**: `throttle()` suspends (without busy-waiting) until the
//!   minimum inter-request interval has elapsed since this instance's last
//!   dispatch. The very first call returns immediately.
//! - **Resilience**: `execute_with_retry()` re-attempts retryable failures
//!   with exponential backoff, honoring a remote `Retry-After` hint when one
//!   is present.
//! - **Additive composition**: every attempt, including retries, passes
//!   through the throttle again; backoff and pacing waits never overlap, so
//!   a retrying client still cannot violate its rate ceiling.
//! - **Containment**: intermediate failures stay inside the loop. Callers
//!   only ever observe the success payload or one final [`DataSourceError`].

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::error::{ConfigurationError, DataSourceError, RequestOutcome, TransportError};
use super::pacing::RateBudget;
use super::retry::RetryPolicy;

/// Construction options for a [`SourceClient`].
#[derive(Debug, Clone)]
pub struct SourceClientOptions {
    /// Requests per minute this instance may dispatch. Must be > 0.
    pub rate_limit: u32,
    /// Re-attempts after the first try, so up to `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Delay before the first re-attempt.
    pub base_backoff: Duration,
    /// Exponential growth factor between re-attempts.
    pub backoff_multiplier: f64,
    /// Optional ceiling on any single backoff delay.
    pub max_backoff: Option<Duration>,
}

impl Default for SourceClientOptions {
    fn default() -> Self {
        Self {
            rate_limit: 60,
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: None,
        }
    }
}

/// The throttle-and-retry capability exposed to per-source clients.
///
/// Concrete data-source clients hold an implementation as an owned field and
/// route every logical network call through [`RateLimited::execute_with_retry`].
#[async_trait]
pub trait RateLimited {
    /// Suspends until the minimum inter-request interval has elapsed since
    /// this instance's last dispatch, then claims the dispatch slot.
    async fn throttle(&self);

    /// Runs `operation` under the throttle with retry-on-transient-failure.
    ///
    /// The operation is a zero-argument callable producing one network
    /// result per invocation. It is invoked at most `max_retries + 1` times;
    /// each invocation is individually throttled.
    async fn execute_with_retry<T, F, Fut>(&self, operation: F) -> Result<T, DataSourceError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, TransportError>> + Send;
}

/// Owns the pacing state and retry policy for one data source.
///
/// Independent instances share nothing; concurrent callers on the same
/// instance serialize through the pacing mutex, which is held across the
/// throttle sleep so the dispatch slot is claimed atomically. A caller that
/// abandons the wait never updates the dispatch timestamp.
#[derive(Debug)]
pub struct SourceClient {
    budget: Mutex<RateBudget>,
    policy: RetryPolicy,
}

impl SourceClient {
    /// Validates the options and builds the client.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidRateLimit`] when `rate_limit`
    /// is zero. No network activity happens here or later in `throttle()`.
    pub fn new(options: SourceClientOptions) -> Result<Self, ConfigurationError> {
        let budget = RateBudget::per_minute(options.rate_limit)?;
        let mut policy = RetryPolicy::new(options.max_retries, options.base_backoff)
            .with_multiplier(options.backoff_multiplier);
        if let Some(cap) = options.max_backoff {
            policy = policy.with_max_backoff(cap);
        }
        Ok(Self {
            budget: Mutex::new(budget),
            policy,
        })
    }

    /// Convenience constructor with defaults for everything but the rate.
    pub fn with_rate_limit(rate_limit: u32) -> Result<Self, ConfigurationError> {
        Self::new(SourceClientOptions {
            rate_limit,
            ..SourceClientOptions::default()
        })
    }

    /// The retry policy this client applies to every call.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl RateLimited for SourceClient {
    async fn throttle(&self) {
        let mut budget = self.budget.lock().await;
        let wait = budget.wait_needed(Instant::now());
        if !wait.is_zero() {
            debug!(wait_secs = wait.as_secs_f64(), "Rate limiting: waiting for next dispatch slot");
            sleep(wait).await;
        }
        // Recorded only once the wait is over, so a caller dropped mid-sleep
        // leaves the budget untouched.
        budget.record_dispatch(Instant::now());
    }

    async fn execute_with_retry<T, F, Fut>(&self, operation: F) -> Result<T, DataSourceError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, TransportError>> + Send,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;
        loop {
            self.throttle().await;
            match RequestOutcome::classify(operation().await) {
                RequestOutcome::Success(payload) => return Ok(payload),
                RequestOutcome::FatalFailure(cause) => {
                    error!(attempts = attempt + 1, %cause, "Request failed with non-retryable error");
                    return Err(DataSourceError::Fatal {
                        attempts: attempt + 1,
                        source: cause,
                    });
                }
                RequestOutcome::RetryableFailure(cause) => {
                    if attempt + 1 >= max_attempts {
                        error!(attempts = max_attempts, %cause, "Retry budget exhausted");
                        return Err(DataSourceError::Exhausted {
                            attempts: max_attempts,
                            source: cause,
                        });
                    }
                    let delay = cause
                        .retry_after()
                        .unwrap_or_else(|| self.policy.backoff_for(attempt));
                    warn!(
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs_f64(),
                        %cause,
                        "Retryable failure, backing off"
                    );
                    sleep(delay).await;
                    // The interval restarts when the backoff ends; pacing and
                    // backoff are additive, never overlapping.
                    self.budget.lock().await.restart_interval(Instant::now());
                    attempt += 1;
                }
            }
        }
    }
}

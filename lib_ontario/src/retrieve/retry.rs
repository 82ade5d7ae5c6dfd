//! # Retry Policy
//!
//! Exponential backoff schedule for the retry loop, plus parsing of the
//! `Retry-After` header a remote may send alongside a 429.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Backoff configuration for one client instance.
///
/// Immutable once constructed and shared read-only across all calls made by
/// the client. `max_retries` counts re-attempts, so a client makes up to
/// `max_retries + 1` attempts in total.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_backoff: Duration,
    backoff_multiplier: f64,
    max_backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: None,
        }
    }
}

impl RetryPolicy {
    /// Builds a policy with the default multiplier of 2 and no delay cap.
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            ..Self::default()
        }
    }

    /// Overrides the exponential growth factor.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Caps every computed backoff delay at `cap`.
    pub fn with_max_backoff(mut self, cap: Duration) -> Self {
        self.max_backoff = Some(cap);
        self
    }

    /// Number of re-attempts allowed after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// The delay to wait after attempt `attempt_index` (counted from 0).
    ///
    /// Grows as `base_backoff * multiplier^attempt_index`, clamped to the
    /// cap when one is set.
    pub fn backoff_for(&self, attempt_index: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt_index as i32);
        let delay = self.base_backoff.mul_f64(factor);
        match self.max_backoff {
            Some(cap) if delay > cap => cap,
            _ => delay,
        }
    }
}

/// Parses a `Retry-After` header value into a delay.
///
/// Accepts the delta-seconds form ("120") and the HTTP-date form
/// ("Wed, 21 Oct 2015 07:28:00 GMT"). A date already in the past collapses
/// to a zero delay; anything unparsable yields `None` so the caller falls
/// back to its own backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_backoff_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_respects_cap() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1))
            .with_max_backoff(Duration::from_secs(3));
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(3));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(3));
    }

    #[test]
    fn test_custom_multiplier() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_multiplier(3.0);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(900));
    }

    #[test]
    fn test_attempt_accounting() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        // A date in the past collapses to an immediate retry.
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );

        // A date in the future yields roughly the remaining delay.
        let future = Utc::now() + TimeDelta::seconds(90);
        let parsed = parse_retry_after(&future.to_rfc2822()).unwrap();
        assert!(parsed > Duration::from_secs(80) && parsed <= Duration::from_secs(91));
    }

    #[test]
    fn test_parse_retry_after_garbage() {
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-3"), None);
    }
}

//! # Request Pacing
//!
//! Fixed-interval throttle state for one client instance. The budget knows
//! the minimum spacing between dispatches and the timestamp of the last
//! dispatch; the waiting itself is owned by the client so the pacing math
//! stays pure and testable.

use std::time::{Duration, Instant};

use super::error::ConfigurationError;

/// The quota window the per-minute rate is expressed against.
const WINDOW: Duration = Duration::from_secs(60);

/// Pacing state for one client instance.
///
/// The invariant it maintains: no two dispatches recorded against the same
/// budget are separated by less than `60s / rate_limit`. The very first
/// dispatch is never delayed.
#[derive(Debug, Clone)]
pub struct RateBudget {
    min_interval: Duration,
    last_dispatch: Option<Instant>,
}

impl RateBudget {
    /// Builds a budget for a requests-per-minute ceiling.
    ///
    /// Fails with [`ConfigurationError::InvalidRateLimit`] when the rate is
    /// zero, before any request could be made.
    pub fn per_minute(rate_limit: u32) -> Result<Self, ConfigurationError> {
        if rate_limit == 0 {
            return Err(ConfigurationError::InvalidRateLimit(rate_limit));
        }
        Ok(Self {
            min_interval: WINDOW / rate_limit,
            last_dispatch: None,
        })
    }

    /// The minimum spacing between two dispatches.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a caller must still wait before the next dispatch may leave.
    ///
    /// Zero before the first dispatch, and zero once the interval has
    /// already elapsed on its own.
    pub fn wait_needed(&self, now: Instant) -> Duration {
        match self.last_dispatch {
            Some(last) => self.min_interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Records that an attempt actually left at `now`.
    ///
    /// Only called once a dispatch happens, never when a wait begins, so an
    /// abandoned wait leaves the budget untouched.
    pub fn record_dispatch(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
    }

    /// Restarts the interval from `now` without counting a dispatch.
    ///
    /// Used after a backoff sleep so pacing and backoff never overlap: the
    /// next dispatch waits the full interval on top of the backoff.
    pub fn restart_interval(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_rate() {
        let err = RateBudget::per_minute(0).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRateLimit(0)));
    }

    #[test]
    fn test_interval_from_rate() {
        let budget = RateBudget::per_minute(60).unwrap();
        assert_eq!(budget.min_interval(), Duration::from_secs(1));
        let budget = RateBudget::per_minute(120).unwrap();
        assert_eq!(budget.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_first_dispatch_is_free() {
        let budget = RateBudget::per_minute(1).unwrap();
        assert_eq!(budget.wait_needed(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_wait_shrinks_with_elapsed_time() {
        let mut budget = RateBudget::per_minute(60).unwrap();
        let t0 = Instant::now();
        budget.record_dispatch(t0);

        let wait = budget.wait_needed(t0 + Duration::from_millis(300));
        assert_eq!(wait, Duration::from_millis(700));

        // Once the interval has fully elapsed there is nothing left to wait.
        assert_eq!(
            budget.wait_needed(t0 + Duration::from_secs(2)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_no_double_penalty() {
        let mut budget = RateBudget::per_minute(60).unwrap();
        let t0 = Instant::now();
        budget.record_dispatch(t0);

        // A dispatch one interval later resets the clock from that point,
        // not from two intervals out.
        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(budget.wait_needed(t1), Duration::ZERO);
        budget.record_dispatch(t1);
        assert_eq!(
            budget.wait_needed(t1 + Duration::from_millis(400)),
            Duration::from_millis(600)
        );
    }
}

//! Interval schedules for the smart poller.
//!
//! Mirrors [`PollingBackoffPolicy`][gateway_gax] in shape (a `wait_period`
//! decision keyed on attempt count and loop start), but the smart poller
//! needs two distinct schedules layered on top of each other: the steady
//! cadence of a healthy poll loop, and the backoff applied only after a
//! transient fetch error.

use std::time::{Duration, Instant};

/// The cadence a task type polls at while nothing has gone wrong.
pub trait PollIntervalPolicy: Send + Sync + std::fmt::Debug {
    /// The wait before issuing poll attempt `attempt_count` (1-based; the
    /// first attempt is issued immediately, so this is only consulted
    /// starting at `attempt_count == 2`).
    fn steady_interval(&self, attempt_count: u32) -> Duration;

    /// The upper bound on total attempts this policy expects to need,
    /// used to estimate elapsed-time progress.
    fn max_poll_count(&self) -> u32;
}

/// Image generation: short intervals, upstream usually finishes in seconds.
#[derive(Clone, Debug)]
pub struct ImagePollPolicy {
    pub interval: Duration,
    pub max_poll_count: u32,
}

impl Default for ImagePollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_poll_count: 900,
        }
    }
}

impl PollIntervalPolicy for ImagePollPolicy {
    fn steady_interval(&self, _attempt_count: u32) -> Duration {
        self.interval
    }

    fn max_poll_count(&self) -> u32 {
        self.max_poll_count
    }
}

/// Video generation: upstream renders take minutes, so poll less often.
#[derive(Clone, Debug)]
pub struct VideoPollPolicy {
    pub interval: Duration,
    pub max_poll_count: u32,
}

impl Default for VideoPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_poll_count: 360,
        }
    }
}

impl PollIntervalPolicy for VideoPollPolicy {
    fn steady_interval(&self, _attempt_count: u32) -> Duration {
        self.interval
    }

    fn max_poll_count(&self) -> u32 {
        self.max_poll_count
    }
}

/// The backoff applied to the *next* poll after a fetch-level error
/// (network failure, malformed response) rather than a normal
/// still-in-progress result. Grows the steady interval, capped.
#[derive(Clone, Debug)]
pub struct PollErrorBackoff {
    cap: Duration,
}

impl Default for PollErrorBackoff {
    fn default() -> Self {
        Self {
            cap: Duration::from_secs(30),
        }
    }
}

impl PollErrorBackoff {
    /// `consecutive_errors` is the number of fetch errors seen in a row,
    /// including the one that just happened.
    pub fn wait_period(
        &self,
        _loop_start: Instant,
        steady: Duration,
        consecutive_errors: u32,
    ) -> Duration {
        let factor = 2u32.saturating_pow(consecutive_errors.saturating_sub(1).min(8));
        (steady * factor).min(self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_policy_defaults_are_short() {
        let policy = ImagePollPolicy::default();
        assert_eq!(policy.steady_interval(1), Duration::from_secs(2));
        assert_eq!(policy.max_poll_count(), 900);
    }

    #[test]
    fn video_policy_defaults_are_longer() {
        let policy = VideoPollPolicy::default();
        assert_eq!(policy.steady_interval(1), Duration::from_secs(5));
    }

    #[test]
    fn error_backoff_grows_then_caps() {
        let backoff = PollErrorBackoff::default();
        let now = Instant::now();
        let steady = Duration::from_secs(2);
        assert_eq!(backoff.wait_period(now, steady, 1), Duration::from_secs(2));
        assert_eq!(backoff.wait_period(now, steady, 2), Duration::from_secs(4));
        assert_eq!(
            backoff.wait_period(now, steady, 20),
            Duration::from_secs(30)
        );
    }
}

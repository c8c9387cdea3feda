//! The [`BackoffPolicy`] trait and the gateway's default instance.

use crate::exponential_backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use std::time::Instant;

/// Decides how long to wait before the next retry attempt.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the wait duration before attempt `attempt_count` (1-based),
    /// given the instant the retry loop started.
    fn on_failure(&self, loop_start: Instant, attempt_count: u32) -> Duration;
}

impl BackoffPolicy for ExponentialBackoff {
    fn on_failure(&self, loop_start: Instant, attempt_count: u32) -> Duration {
        ExponentialBackoff::on_failure(self, loop_start, attempt_count)
    }
}

/// The default backoff used by the upload pipeline's network-error retries:
/// one second initial delay, capped at thirty seconds, doubling each time.
pub fn default_upload_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_delay(Duration::from_secs(1))
        .with_maximum_delay(Duration::from_secs(30))
        .with_scaling(2.0)
        .build()
        .expect("default backoff parameters are always valid")
}

//! Truncated exponential backoff with jitter.
//!
//! Used by the upload pipeline's retry loop and the smart poller's
//! post-network-error wait. See [`BackoffPolicy`][crate::backoff_policy::BackoffPolicy].

use std::time::Duration;
use std::time::Instant;

/// Builds an [`ExponentialBackoff`], validating parameters at `build()`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoffBuilder {
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
        }
    }

    pub fn with_initial_delay(mut self, v: Duration) -> Self {
        self.initial_delay = v;
        self
    }

    pub fn with_maximum_delay(mut self, v: Duration) -> Self {
        self.maximum_delay = v;
        self
    }

    pub fn with_scaling(mut self, v: f64) -> Self {
        self.scaling = v;
        self
    }

    /// Validates and builds the policy. Returns `Err` describing the first
    /// violated constraint.
    pub fn build(self) -> Result<ExponentialBackoff, String> {
        if self.scaling < 1.0 {
            return Err(format!("scaling ({}) must be >= 1.0", self.scaling));
        }
        if self.initial_delay.is_zero() {
            return Err("initial delay must be greater than zero".to_string());
        }
        if self.maximum_delay < self.initial_delay {
            return Err(format!(
                "maximum delay ({:?}) must be >= initial delay ({:?})",
                self.maximum_delay, self.initial_delay
            ));
        }
        Ok(ExponentialBackoff {
            initial_delay: self.initial_delay,
            maximum_delay: self.maximum_delay,
            scaling: self.scaling,
        })
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncated exponential backoff: `delay(n) = min(maximum, initial * scaling^(n-1))`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoff {
    /// The delay to wait before retry attempt number `attempt_count` (1-based).
    ///
    /// `loop_start` is accepted for symmetry with policies that bound total
    /// elapsed time, but this implementation only depends on `attempt_count`.
    pub fn on_failure(&self, _loop_start: Instant, attempt_count: u32) -> Duration {
        let exponent = attempt_count.saturating_sub(1) as i32;
        let factor = self.scaling.powi(exponent);
        let scaled = self.initial_delay.as_secs_f64() * factor;
        let scaled = Duration::from_secs_f64(scaled.max(0.0));
        scaled.min(self.maximum_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_is_capped() {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_maximum_delay(Duration::from_secs(10))
            .with_scaling(2.0)
            .build()
            .unwrap();
        let now = Instant::now();
        assert_eq!(backoff.on_failure(now, 1), Duration::from_secs(1));
        assert_eq!(backoff.on_failure(now, 2), Duration::from_secs(2));
        assert_eq!(backoff.on_failure(now, 3), Duration::from_secs(4));
        assert_eq!(backoff.on_failure(now, 10), Duration::from_secs(10));
    }

    #[test]
    fn rejects_invalid_scaling() {
        let err = ExponentialBackoffBuilder::new()
            .with_scaling(0.5)
            .build()
            .unwrap_err();
        assert!(err.contains("scaling"));
    }

    #[test]
    fn rejects_zero_initial_delay() {
        let err = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.contains("initial delay"));
    }
}

//! Decides which HTTP status codes and errors are worth retrying.
//!
//! Retries 408 (request timeout) and 429 (rate limited) and any 5xx. Never
//! retries 308 ("Resume Incomplete" in the upstream's resumable-upload
//! protocol is not an error, callers handle it separately) or any other
//! status.

/// Returns true if an HTTP response with `status` should be retried.
pub fn is_retryable_status(status: u16) -> bool {
    match status {
        308 => false,
        408 | 429 => true,
        500..=599 => true,
        _ => false,
    }
}

/// Caps the number of attempts (including the first) a retry loop will make.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Returns `true` if another attempt should be made given the number of
    /// attempts already made (including the one that just failed).
    fn should_retry(&self, attempts_made: u32, status: Option<u16>) -> bool;
}

/// A retry policy bounded by a maximum attempt count, deferring the
/// per-status decision to [`is_retryable_status`].
#[derive(Clone, Debug)]
pub struct MaxAttemptsRetryPolicy {
    max_attempts: u32,
}

impl MaxAttemptsRetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl RetryPolicy for MaxAttemptsRetryPolicy {
    fn should_retry(&self, attempts_made: u32, status: Option<u16>) -> bool {
        if attempts_made >= self.max_attempts {
            return false;
        }
        match status {
            Some(code) => is_retryable_status(code),
            None => true, // network-level errors carry no status; always transient
        }
    }
}

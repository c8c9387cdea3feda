//! Loop control types shared by retry and polling loops.

use crate::error::GatewayError;

/// The result of a loop control decision.
#[derive(Debug)]
pub enum LoopState {
    /// The error is non-retryable, stop the loop.
    Permanent(GatewayError),

    /// The error is retryable, but the policy is stopping the loop (for
    /// example, it ran out of attempts or wall time).
    Exhausted(GatewayError),

    /// The error was retryable, continue the loop.
    Continue(GatewayError),
}

impl LoopState {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Unwraps into the inner error regardless of which variant it came
    /// from, for callers that only care about reporting the failure.
    pub fn into_error(self) -> GatewayError {
        match self {
            Self::Permanent(e) | Self::Exhausted(e) | Self::Continue(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permanent_error() -> GatewayError {
        GatewayError::UploadAuth("bad signature".into())
    }

    fn transient_error() -> GatewayError {
        GatewayError::UploadNetwork {
            step: "apply",
            source: Box::new(std::io::Error::other("connection reset")),
        }
    }

    #[test]
    fn loop_state_predicates() {
        let flow = LoopState::Permanent(permanent_error());
        assert!(flow.is_permanent());
        assert!(!flow.is_exhausted());
        assert!(!flow.is_continue());

        let flow = LoopState::Exhausted(transient_error());
        assert!(!flow.is_permanent());
        assert!(flow.is_exhausted());
        assert!(!flow.is_continue());

        let flow = LoopState::Continue(transient_error());
        assert!(!flow.is_permanent());
        assert!(!flow.is_exhausted());
        assert!(flow.is_continue());
    }

    #[test]
    fn into_error_unwraps_any_variant() {
        assert!(matches!(
            LoopState::Continue(transient_error()).into_error(),
            GatewayError::UploadNetwork { .. }
        ));
    }
}

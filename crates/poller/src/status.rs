//! The shape a fetch closure reports back to the smart poller.

/// The status block a status-fetch call returns, independent of the
/// opaque payload (`data`) it is attached to.
#[derive(Clone, Debug, Default)]
pub struct PollStatus {
    /// Upstream state string, e.g. `"success"`, `"processing"`, `"failed"`.
    pub state: String,
    /// Non-zero indicates the upstream generation failed.
    pub fail_code: i64,
    /// Number of items observed so far in the terminal collection.
    pub item_count: usize,
    /// Unix timestamp the upstream recorded completion at, or `0` if not
    /// finished.
    pub finish_time: i64,
    /// Upstream correlation id for tracing, when present.
    pub correlation_id: Option<String>,
}

impl PollStatus {
    /// Whether the upstream reports its own success state, independent of
    /// `finish_time`.
    pub fn reports_success(&self) -> bool {
        matches!(self.state.as_str(), "success" | "completed" | "done")
    }
}

/// One fetch result: the status block plus whatever opaque payload the
/// caller wants returned once the poll loop terminates.
#[derive(Clone, Debug)]
pub struct PollOutcome<D> {
    pub status: PollStatus,
    pub data: D,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_success_matches_known_states() {
        let mut status = PollStatus {
            state: "success".into(),
            ..Default::default()
        };
        assert!(status.reports_success());
        status.state = "processing".into();
        assert!(!status.reports_success());
    }
}

//! The shared error taxonomy for the gateway.
//!
//! Every component in this workspace returns [`GatewayError`] (or a
//! `Result<T, GatewayError>` alias) so that the HTTP surface can map any
//! failure to a status code without re-parsing a message string.

/// All the ways a generation request, upload, or task operation can fail.
///
/// Each variant documents the condition that produces it and the resulting
/// HTTP-surface policy, matching the taxonomy table every caller relies on
/// to decide whether to retry, log, or surface the error to the client.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// The request was malformed: a missing prompt, an invalid image count,
    /// or a field that failed validation before any upstream call was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested model is not available in the caller's region and has
    /// no regional default to fall back to.
    #[error("model '{model}' is not supported in region '{region}'")]
    UnsupportedModel { model: String, region: String },

    /// The daily quota for this session and service type has been reached.
    #[error("quota exceeded for session '{session}', service '{service}': {current}/{limit}")]
    QuotaExceeded {
        session: String,
        service: String,
        current: u32,
        limit: u32,
    },

    /// The quota ledger's backing store could not be read or written.
    #[error("quota ledger storage error: {0}")]
    QuotaIo(String),

    /// The upload pipeline could not reach the blob store, or the attempt
    /// timed out.
    #[error("upload network error during '{step}': {source}")]
    UploadNetwork {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An upload attempt exceeded its per-attempt timeout.
    #[error("upload timed out during '{step}' after {elapsed_ms}ms")]
    UploadTimeout { step: &'static str, elapsed_ms: u64 },

    /// The upstream credential service or SigV4 signature was rejected.
    /// Not retried: re-signing the same request would fail identically.
    #[error("upload authentication rejected: {0}")]
    UploadAuth(String),

    /// The commit step returned a `UriStatus` other than `2000`.
    #[error("upload commit failed with uri_status={uri_status}: {detail}")]
    UploadCommitFailed { uri_status: i64, detail: String },

    /// The upstream submit response was missing a history id, or was
    /// otherwise structurally unexpected.
    #[error("upstream protocol error: {0}")]
    UpstreamProtocolError(String),

    /// The upstream reported a non-zero `fail_code` for the generation.
    #[error("upstream generation failed with fail_code={fail_code}")]
    UpstreamGenerationFailed { fail_code: i64 },

    /// The smart poller exhausted its poll-count or wall-time budget before
    /// observing a terminal state.
    #[error("poll timed out after {poll_count} attempts ({elapsed_ms}ms)")]
    PollTimeout { poll_count: u32, elapsed_ms: u64 },

    /// The terminal `item_list` was non-empty but no asset URL could be
    /// extracted from any entry.
    #[error("could not extract a result from {item_count} completed item(s)")]
    ResultExtractionFailed { item_count: usize },

    /// No task exists with the given id.
    #[error("task '{0}' not found")]
    TaskNotFound(String),

    /// The result of a task was requested while it is still pending or
    /// running.
    #[error("task '{0}' has not completed yet")]
    TaskNotCompleted(String),

    /// A cancel request could not be applied because the task is already
    /// terminal, or some other invariant prevents the transition.
    #[error("task '{0}' could not be cancelled: {reason}")]
    TaskCancelFailed { task_id: String, reason: String },

    /// A delete request could not be applied because the task is not yet
    /// terminal.
    #[error("task '{0}' could not be deleted: {reason}")]
    TaskDeleteFailed { task_id: String, reason: String },

    /// The task was cancelled between poll boundaries. This is a terminal
    /// state, not a failure reported back to the original submitter.
    #[error("task was cancelled")]
    Cancelled,
}

impl GatewayError {
    /// The HTTP status code the table in the error-handling design maps
    /// this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::InvalidRequest(_) => 400,
            GatewayError::UnsupportedModel { .. } => 400,
            GatewayError::QuotaExceeded { .. } => 429,
            GatewayError::QuotaIo(_) => 500,
            GatewayError::UploadNetwork { .. } => 502,
            GatewayError::UploadTimeout { .. } => 504,
            GatewayError::UploadAuth(_) => 401,
            GatewayError::UploadCommitFailed { .. } => 502,
            GatewayError::UpstreamProtocolError(_) => 502,
            GatewayError::UpstreamGenerationFailed { .. } => 502,
            GatewayError::PollTimeout { .. } => 504,
            GatewayError::ResultExtractionFailed { .. } => 502,
            GatewayError::TaskNotFound(_) => 404,
            GatewayError::TaskNotCompleted(_) => 409,
            GatewayError::TaskCancelFailed { .. } => 409,
            GatewayError::TaskDeleteFailed { .. } => 409,
            GatewayError::Cancelled => 200,
        }
    }

    /// True for errors a retry policy should consider transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::UploadNetwork { .. } | GatewayError::UploadTimeout { .. }
        )
    }
}

/// A `Result` alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GatewayError>;

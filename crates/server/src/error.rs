//! Maps [`GatewayError`] to an HTTP response, the way the teacher's
//! per-service error types compose into one top-level error with a
//! single place that knows about status codes (spec §7's "top-level
//! `GatewayError`" note, applied here since this workspace's taxonomy
//! already lives in one enum rather than per-crate ones).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_gax::GatewayError;
use serde_json::json;

/// New-type so this crate, not `gateway_gax`, owns the HTTP mapping —
/// the error taxonomy itself stays transport-agnostic.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // `Cancelled` is terminal but not an error surfaced to the
        // original submitter (spec §7); callers that reach this impl
        // directly (rather than via the task-status endpoints) still
        // need *some* response, so it maps to 200 with a cancelled body.
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": {
                "message": self.0.to_string(),
                "kind": error_kind(&self.0),
            }
        }));
        (status, body).into_response()
    }
}

fn error_kind(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::InvalidRequest(_) => "invalid_request",
        GatewayError::UnsupportedModel { .. } => "unsupported_model",
        GatewayError::QuotaExceeded { .. } => "quota_exceeded",
        GatewayError::QuotaIo(_) => "quota_io",
        GatewayError::UploadNetwork { .. } => "upload_network",
        GatewayError::UploadTimeout { .. } => "upload_timeout",
        GatewayError::UploadAuth(_) => "upload_auth",
        GatewayError::UploadCommitFailed { .. } => "upload_commit_failed",
        GatewayError::UpstreamProtocolError(_) => "upstream_protocol_error",
        GatewayError::UpstreamGenerationFailed { .. } => "upstream_generation_failed",
        GatewayError::PollTimeout { .. } => "poll_timeout",
        GatewayError::ResultExtractionFailed { .. } => "result_extraction_failed",
        GatewayError::TaskNotFound(_) => "task_not_found",
        GatewayError::TaskNotCompleted(_) => "task_not_completed",
        GatewayError::TaskCancelFailed { .. } => "task_cancel_failed",
        GatewayError::TaskDeleteFailed { .. } => "task_delete_failed",
        GatewayError::Cancelled => "cancelled",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exceeded_maps_to_429() {
        let err = ApiError(GatewayError::QuotaExceeded {
            session: "s".into(),
            service: "image".into(),
            current: 10,
            limit: 10,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn task_not_found_maps_to_404() {
        let err = ApiError(GatewayError::TaskNotFound("t1".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

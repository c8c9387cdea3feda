//! Pulls the opaque credential out of an incoming request and hands it
//! to [`gateway_session::parse`]. The surface is OpenAI-API-compatible
//! (it fronts a chat-completions passthrough), so the credential travels
//! as a standard bearer token.

use axum::http::HeaderMap;
use gateway_gax::GatewayError;
use gateway_session::Credential;

/// The raw bearer value, with any region marker still attached — what
/// an async task's stored params carry, since [`gateway_session::parse`]
/// needs to run again when the task is actually admitted.
pub fn extract_raw_credential(headers: &HeaderMap) -> Result<String, GatewayError> {
    let raw = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayError::InvalidRequest("missing or malformed Authorization header".into()))?;

    if raw.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("empty credential".into()));
    }

    Ok(raw.to_string())
}

pub fn extract_credential(headers: &HeaderMap) -> Result<Credential, GatewayError> {
    extract_raw_credential(headers).map(|raw| gateway_session::parse(&raw))
}

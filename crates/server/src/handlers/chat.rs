//! `/v1/chat/completions` passthrough: treats the last user message's
//! content as an image prompt and runs the ordinary text-to-image path
//! (spec §6). No model/ratio/resolution controls travel through this
//! endpoint; callers that need those use `/v1/images/generations`.

use crate::auth::extract_credential;
use crate::dto::ChatCompletionsBody;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use gateway_controller::ImageRequest;
use gateway_gax::GatewayError;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

pub async fn completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatCompletionsBody>,
) -> Result<Json<Value>, ApiError> {
    let credential = extract_credential(&headers)?;
    let prompt = body
        .last_user_prompt()
        .ok_or_else(|| GatewayError::InvalidRequest("no user message found".into()))?;
    let cancel = CancellationToken::new();
    let req = ImageRequest {
        model: &body.model,
        prompt,
        negative_prompt: None,
        ratio: None,
        resolution_tier: None,
        sample_strength: 0.5,
        seed: -1,
        intelligent_ratio: false,
        explicit_count: None,
    };
    let urls = state
        .controller
        .generate_image(req, &credential, &cancel, |_| {})
        .await?;

    let content = urls
        .iter()
        .map(|u| format!("![generated image]({u})"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Json(json!({
        "id": format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
    })))
}

//! Synchronous image-to-video endpoint (spec §4.9).

use crate::auth::extract_credential;
use crate::dto::{GenerationResponse, VideoGenerationBody};
use crate::error::ApiError;
use crate::files;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use gateway_controller::VideoRequest;
use tokio_util::sync::CancellationToken;

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VideoGenerationBody>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let credential = extract_credential(&headers)?;
    let images = files::read_all(&body.file_paths).await?;
    let cancel = CancellationToken::new();
    let req = VideoRequest {
        model: &body.model,
        prompt: &body.prompt,
        images: &images,
        ratio: body.ratio.as_deref(),
        resolution_tier: body.resolution.as_deref(),
        sample_strength: body.sample_strength,
        seed: body.seed,
    };
    let urls = state
        .controller
        .generate_video(req, &credential, &cancel, |_| {})
        .await?;
    Ok(Json(GenerationResponse { urls }))
}

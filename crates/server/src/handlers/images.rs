//! Synchronous text-to-image and image-to-image endpoints: the
//! controller is awaited inline and the result returned in the same
//! response (spec §4.9).

use crate::auth::extract_credential;
use crate::dto::{GenerationResponse, ImageCompositionBody, ImageGenerationBody};
use crate::error::ApiError;
use crate::files;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use gateway_controller::{CompositionRequest, ImageRequest};
use tokio_util::sync::CancellationToken;

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImageGenerationBody>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let credential = extract_credential(&headers)?;
    let cancel = CancellationToken::new();
    let req = ImageRequest {
        model: &body.model,
        prompt: &body.prompt,
        negative_prompt: body.negative_prompt.as_deref(),
        ratio: body.ratio.as_deref(),
        resolution_tier: body.resolution.as_deref(),
        sample_strength: body.sample_strength,
        seed: body.seed,
        intelligent_ratio: body.intelligent_ratio,
        explicit_count: body.count,
    };
    let urls = state
        .controller
        .generate_image(req, &credential, &cancel, |_| {})
        .await?;
    Ok(Json(GenerationResponse { urls }))
}

pub async fn compose(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImageCompositionBody>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let credential = extract_credential(&headers)?;
    let images = files::read_all(&body.file_paths).await?;
    let cancel = CancellationToken::new();
    let req = CompositionRequest {
        model: &body.model,
        prompt: &body.prompt,
        negative_prompt: body.negative_prompt.as_deref(),
        images: &images,
        ratio: body.ratio.as_deref(),
        resolution_tier: body.resolution.as_deref(),
        sample_strength: body.sample_strength,
        seed: body.seed,
        intelligent_ratio: body.intelligent_ratio,
    };
    let urls = state
        .controller
        .generate_image_composition(req, &credential, &cancel, |_| {})
        .await?;
    Ok(Json(GenerationResponse { urls }))
}

//! Batch submission and cancellation over the async task surface: each
//! item in the request is handled independently, so one bad item never
//! sinks the rest of the batch (spec §9's batch scenario).

use crate::auth::extract_raw_credential;
use crate::dto::{BatchCancelBody, BatchCancelResult, BatchSubmitBody, BatchSubmitItem, BatchSubmitResult};
use crate::error::ApiError;
use crate::runners::{StoredCompositionParams, StoredImageParams, StoredVideoParams};
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use gateway_task::TaskType;

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BatchSubmitBody>,
) -> Result<Json<Vec<BatchSubmitResult>>, ApiError> {
    let credential = extract_raw_credential(&headers)?;
    let mut results = Vec::with_capacity(body.items.len());

    for item in body.items {
        let (task_type, params) = match item {
            BatchSubmitItem::ImageGeneration(b) => (
                TaskType::ImageGeneration,
                serde_json::to_value(StoredImageParams {
                    credential: credential.clone(),
                    model: b.model,
                    prompt: b.prompt,
                    negative_prompt: b.negative_prompt,
                    ratio: b.ratio,
                    resolution: b.resolution,
                    sample_strength: b.sample_strength,
                    seed: b.seed,
                    intelligent_ratio: b.intelligent_ratio,
                    count: b.count,
                }),
            ),
            BatchSubmitItem::ImageComposition(b) => (
                TaskType::ImageComposition,
                serde_json::to_value(StoredCompositionParams {
                    credential: credential.clone(),
                    model: b.model,
                    prompt: b.prompt,
                    negative_prompt: b.negative_prompt,
                    file_paths: b.file_paths,
                    ratio: b.ratio,
                    resolution: b.resolution,
                    sample_strength: b.sample_strength,
                    seed: b.seed,
                    intelligent_ratio: b.intelligent_ratio,
                }),
            ),
            BatchSubmitItem::VideoGeneration(b) => (
                TaskType::VideoGeneration,
                serde_json::to_value(StoredVideoParams {
                    credential: credential.clone(),
                    model: b.model,
                    prompt: b.prompt,
                    file_paths: b.file_paths,
                    ratio: b.ratio,
                    resolution: b.resolution,
                    sample_strength: b.sample_strength,
                    seed: b.seed,
                }),
            ),
        };

        match params {
            Ok(value) => {
                let task = state.tasks.create(task_type, value, 0, None).await;
                results.push(BatchSubmitResult {
                    task_id: Some(task.id),
                    error: None,
                });
            }
            Err(e) => results.push(BatchSubmitResult {
                task_id: None,
                error: Some(e.to_string()),
            }),
        }
    }

    Ok(Json(results))
}

pub async fn cancel(
    State(state): State<AppState>,
    Json(body): Json<BatchCancelBody>,
) -> Result<Json<Vec<BatchCancelResult>>, ApiError> {
    let mut results = Vec::with_capacity(body.task_ids.len());
    for id in body.task_ids {
        match state.tasks.cancel(&id).await {
            Ok(_) => results.push(BatchCancelResult {
                task_id: id,
                cancelled: true,
                error: None,
            }),
            Err(e) => results.push(BatchCancelResult {
                task_id: id,
                cancelled: false,
                error: Some(e.to_string()),
            }),
        }
    }
    Ok(Json(results))
}

//! The async surface: enqueue a task and return its id immediately;
//! separate endpoints poll status, fetch the result, or cancel/delete
//! (spec §4.9).

use crate::auth::extract_raw_credential;
use crate::dto::{
    ImageCompositionBody, ImageGenerationBody, TaskAccepted, TaskResultResponse, TaskStatusResponse, VideoGenerationBody,
};
use crate::error::ApiError;
use crate::runners::{StoredCompositionParams, StoredImageParams, StoredVideoParams};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use gateway_gax::GatewayError;
use gateway_task::{Task, TaskStatus, TaskType};

fn accepted(task: Task) -> Json<TaskAccepted> {
    Json(TaskAccepted {
        task_id: task.id,
        status: "pending",
        created_at: task.created_at,
    })
}

pub async fn submit_image_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImageGenerationBody>,
) -> Result<Json<TaskAccepted>, ApiError> {
    let credential = extract_raw_credential(&headers)?;
    let params = StoredImageParams {
        credential,
        model: body.model,
        prompt: body.prompt,
        negative_prompt: body.negative_prompt,
        ratio: body.ratio,
        resolution: body.resolution,
        sample_strength: body.sample_strength,
        seed: body.seed,
        intelligent_ratio: body.intelligent_ratio,
        count: body.count,
    };
    let task = state
        .tasks
        .create(TaskType::ImageGeneration, serde_json::to_value(&params).unwrap(), 0, None)
        .await;
    Ok(accepted(task))
}

pub async fn submit_image_composition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImageCompositionBody>,
) -> Result<Json<TaskAccepted>, ApiError> {
    let credential = extract_raw_credential(&headers)?;
    let params = StoredCompositionParams {
        credential,
        model: body.model,
        prompt: body.prompt,
        negative_prompt: body.negative_prompt,
        file_paths: body.file_paths,
        ratio: body.ratio,
        resolution: body.resolution,
        sample_strength: body.sample_strength,
        seed: body.seed,
        intelligent_ratio: body.intelligent_ratio,
    };
    let task = state
        .tasks
        .create(TaskType::ImageComposition, serde_json::to_value(&params).unwrap(), 0, None)
        .await;
    Ok(accepted(task))
}

pub async fn submit_video_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VideoGenerationBody>,
) -> Result<Json<TaskAccepted>, ApiError> {
    let credential = extract_raw_credential(&headers)?;
    let params = StoredVideoParams {
        credential,
        model: body.model,
        prompt: body.prompt,
        file_paths: body.file_paths,
        ratio: body.ratio,
        resolution: body.resolution,
        sample_strength: body.sample_strength,
        seed: body.seed,
    };
    let task = state
        .tasks
        .create(TaskType::VideoGeneration, serde_json::to_value(&params).unwrap(), 0, None)
        .await;
    Ok(accepted(task))
}

pub async fn status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TaskStatusResponse>, ApiError> {
    let task = state.tasks.get(&id).await.ok_or_else(|| GatewayError::TaskNotFound(id.clone()))?;
    Ok(Json(TaskStatusResponse {
        task_id: task.id,
        status: task.status,
        progress: task.progress,
        created_at: task.created_at,
        updated_at: task.updated_at,
    }))
}

pub async fn result(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TaskResultResponse>, ApiError> {
    let task = state.tasks.get(&id).await.ok_or_else(|| GatewayError::TaskNotFound(id.clone()))?;
    match task.status {
        TaskStatus::Completed => Ok(Json(TaskResultResponse {
            task_id: task.id,
            result: task.result.unwrap_or(serde_json::Value::Null),
        })),
        TaskStatus::Failed => Err(GatewayError::InvalidRequest(
            task.error.unwrap_or_else(|| "task failed".to_string()),
        )
        .into()),
        _ => Err(GatewayError::TaskNotCompleted(id).into()),
    }
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Task>, ApiError> {
    // Idempotent per spec S4: a cancel of an already-cancelled task
    // returns the (terminal) task rather than an error.
    let task = state.tasks.get(&id).await.ok_or_else(|| GatewayError::TaskNotFound(id.clone()))?;
    if task.status == TaskStatus::Cancelled {
        return Ok(Json(task));
    }
    let cancelled = state.tasks.cancel(&id).await?;
    Ok(Json(cancelled))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<(), ApiError> {
    state.tasks.delete(&id).await?;
    Ok(())
}

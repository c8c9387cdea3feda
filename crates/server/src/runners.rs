//! [`TaskRunner`] implementations that bridge the task engine to the
//! Generation Controller. A task's `params` is the serialized form of
//! one of the `Stored*Params` structs below, written by the async
//! handlers in [`crate::handlers::tasks`] at submission time and read
//! back here when the scheduler admits the task — the controller itself
//! stays unaware that tasks exist (spec §4.5 vs §4.8).

use crate::files;
use async_trait::async_trait;
use gateway_controller::{CompositionRequest, GenerationController, ImageRequest, VideoRequest};
use gateway_gax::GatewayError;
use gateway_task::{ProgressSink, Task, TaskRunner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn parse_params<T: serde::de::DeserializeOwned>(task: &Task) -> Result<T, GatewayError> {
    serde_json::from_value(task.params.clone())
        .map_err(|e| GatewayError::InvalidRequest(format!("corrupt task params: {e}")))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredImageParams {
    /// The raw `Authorization` bearer value, re-parsed by
    /// [`gateway_session::parse`] when the task runs — a task may be
    /// admitted long after the original request's connection closed.
    pub credential: String,
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
    pub count: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredCompositionParams {
    pub credential: String,
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub file_paths: Vec<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredVideoParams {
    pub credential: String,
    pub model: String,
    pub prompt: String,
    pub file_paths: Vec<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    pub sample_strength: f32,
    pub seed: i64,
}

pub struct ImageTaskRunner {
    controller: Arc<GenerationController>,
}

impl ImageTaskRunner {
    pub fn new(controller: Arc<GenerationController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl TaskRunner for ImageTaskRunner {
    async fn run(&self, task: Task, progress: ProgressSink, cancel: CancellationToken) -> Result<serde_json::Value, GatewayError> {
        let params: StoredImageParams = parse_params(&task)?;
        let credential = gateway_session::parse(&params.credential);
        let req = ImageRequest {
            model: &params.model,
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            ratio: params.ratio.as_deref(),
            resolution_tier: params.resolution.as_deref(),
            sample_strength: params.sample_strength,
            seed: params.seed,
            intelligent_ratio: params.intelligent_ratio,
            explicit_count: params.count,
        };
        let urls = self
            .controller
            .generate_image(req, &credential, &cancel, |p| progress.report(p))
            .await?;
        Ok(serde_json::json!({ "urls": urls }))
    }
}

pub struct CompositionTaskRunner {
    controller: Arc<GenerationController>,
}

impl CompositionTaskRunner {
    pub fn new(controller: Arc<GenerationController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl TaskRunner for CompositionTaskRunner {
    async fn run(&self, task: Task, progress: ProgressSink, cancel: CancellationToken) -> Result<serde_json::Value, GatewayError> {
        let params: StoredCompositionParams = parse_params(&task)?;
        let credential = gateway_session::parse(&params.credential);
        let images = files::read_all(&params.file_paths).await?;
        let req = CompositionRequest {
            model: &params.model,
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            images: &images,
            ratio: params.ratio.as_deref(),
            resolution_tier: params.resolution.as_deref(),
            sample_strength: params.sample_strength,
            seed: params.seed,
            intelligent_ratio: params.intelligent_ratio,
        };
        let urls = self
            .controller
            .generate_image_composition(req, &credential, &cancel, |p| progress.report(p))
            .await?;
        Ok(serde_json::json!({ "urls": urls }))
    }
}

pub struct VideoTaskRunner {
    controller: Arc<GenerationController>,
}

impl VideoTaskRunner {
    pub fn new(controller: Arc<GenerationController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl TaskRunner for VideoTaskRunner {
    async fn run(&self, task: Task, progress: ProgressSink, cancel: CancellationToken) -> Result<serde_json::Value, GatewayError> {
        let params: StoredVideoParams = parse_params(&task)?;
        let credential = gateway_session::parse(&params.credential);
        let images = files::read_all(&params.file_paths).await?;
        let req = VideoRequest {
            model: &params.model,
            prompt: &params.prompt,
            images: &images,
            ratio: params.ratio.as_deref(),
            resolution_tier: params.resolution.as_deref(),
            sample_strength: params.sample_strength,
            seed: params.seed,
        };
        let urls = self
            .controller
            .generate_video(req, &credential, &cancel, |p| progress.report(p))
            .await?;
        Ok(serde_json::json!({ "urls": urls }))
    }
}

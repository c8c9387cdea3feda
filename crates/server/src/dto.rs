//! Wire-level request/response bodies. Deliberately kept separate from
//! [`gateway_controller::request`]'s transport-agnostic structs — this
//! module owns JSON field names and defaults, the controller module
//! owns generation semantics.

use serde::{Deserialize, Serialize};

fn default_sample_strength() -> f32 {
    0.5
}

fn default_seed() -> i64 {
    -1
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImageGenerationBody {
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    #[serde(default = "default_sample_strength")]
    pub sample_strength: f32,
    #[serde(default = "default_seed")]
    pub seed: i64,
    pub intelligent_ratio: bool,
    /// Explicit multi-image count (spec §9: preferred over the `N张`
    /// prompt heuristic).
    pub count: Option<u32>,
}

impl Default for ImageGenerationBody {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            negative_prompt: None,
            ratio: None,
            resolution: None,
            sample_strength: default_sample_strength(),
            seed: default_seed(),
            intelligent_ratio: false,
            count: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImageCompositionBody {
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// Local paths the gateway process reads the source images from.
    pub file_paths: Vec<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    #[serde(default = "default_sample_strength")]
    pub sample_strength: f32,
    #[serde(default = "default_seed")]
    pub seed: i64,
    pub intelligent_ratio: bool,
}

impl Default for ImageCompositionBody {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            negative_prompt: None,
            file_paths: Vec::new(),
            ratio: None,
            resolution: None,
            sample_strength: default_sample_strength(),
            seed: default_seed(),
            intelligent_ratio: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VideoGenerationBody {
    pub model: String,
    pub prompt: String,
    pub file_paths: Vec<String>,
    pub ratio: Option<String>,
    pub resolution: Option<String>,
    #[serde(default = "default_sample_strength")]
    pub sample_strength: f32,
    #[serde(default = "default_seed")]
    pub seed: i64,
    /// Accepted for client compatibility; the upstream envelope has no
    /// duration slot (spec §4.3), so it is not forwarded anywhere.
    pub duration: Option<u32>,
}

impl Default for VideoGenerationBody {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            file_paths: Vec::new(),
            ratio: None,
            resolution: None,
            sample_strength: default_sample_strength(),
            seed: default_seed(),
            duration: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionsBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatCompletionsBody {
    /// The passthrough only looks at the most recent user message's
    /// content, treated as the image prompt (spec §6).
    pub fn last_user_prompt(&self) -> Option<&str> {
        self.messages.iter().rev().find(|m| m.role == "user").map(|m| m.content.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationResponse {
    pub urls: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskAccepted {
    pub task_id: String,
    pub status: &'static str,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: gateway_task::TaskStatus,
    pub progress: u8,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskResultResponse {
    pub task_id: String,
    pub result: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchSubmitBody {
    pub items: Vec<BatchSubmitItem>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchSubmitItem {
    ImageGeneration(ImageGenerationBody),
    ImageComposition(ImageCompositionBody),
    VideoGeneration(VideoGenerationBody),
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchSubmitResult {
    pub task_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchCancelBody {
    pub task_ids: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchCancelResult {
    pub task_id: String,
    pub cancelled: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ModelListEntry {
    pub name: &'static str,
    pub region: &'static str,
    pub kind: &'static str,
}

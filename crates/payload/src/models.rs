//! The upstream request envelope, one type per generation mode's
//! distinct shape, built from shared sub-structures (spec §4.3).

use serde::Serialize;

/// Generation controls shared by every mode.
#[derive(Clone, Debug, Serialize)]
pub struct CoreParam {
    pub width: u32,
    pub height: u32,
    pub is_forced_resolution: bool,
    pub ratio: Option<String>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
    pub model_req_key: String,
}

/// One text prompt slot in a component's ability tree.
#[derive(Clone, Debug, Serialize)]
pub struct PromptPlaceholder {
    pub placeholder_id: String,
    pub prompt: String,
}

/// One generation "ability" (text-to-image, blend, reference, etc.) and
/// the strength it contributes, used in `metrics_extra` ability
/// strengths and the component's ability list.
#[derive(Clone, Debug, Serialize)]
pub struct Ability {
    pub ability_type: String,
    pub strength: f32,
}

/// Post-edit parameters carried on a component; empty for a fresh
/// generation, populated when the request references prior uploaded
/// images (image-to-image / image-to-video).
#[derive(Clone, Debug, Default, Serialize)]
pub struct PostEditParam {
    pub uploaded_image_uris: Vec<String>,
    pub negative_prompt: Option<String>,
}

/// One node of the draft-content component tree.
#[derive(Clone, Debug, Serialize)]
pub struct DraftComponent {
    pub component_id: String,
    pub generate_type: String,
    pub ability_list: Vec<Ability>,
    pub prompt_placeholder_list: Vec<PromptPlaceholder>,
    pub postedit_param: PostEditParam,
}

/// Upstream telemetry scene tag (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Scene {
    #[serde(rename = "ImageBasicGenerate")]
    ImageBasicGenerate,
    #[serde(rename = "ImageMultiGenerate")]
    ImageMultiGenerate,
    #[serde(rename = "ImageComposition")]
    ImageComposition,
    #[serde(rename = "VideoGenerate")]
    VideoGenerate,
}

/// The telemetry envelope included with every submit.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsExtra {
    pub scene: Scene,
    pub submit_id: String,
    pub resolution_type: String,
    pub ability_strengths: Vec<Ability>,
    /// Present only for `ImageMultiGenerate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
}

/// The full upstream `aigc_draft/generate` request body.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationEnvelope {
    pub core_param: CoreParam,
    pub draft_content: DraftComponent,
    pub metrics_extra: MetricsExtra,
}

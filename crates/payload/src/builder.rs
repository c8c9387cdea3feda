//! The pure payload-building function: one envelope shape per
//! generation mode, assembled from [`CoreParam`]/[`DraftComponent`]/
//! [`MetricsExtra`] sub-structures. No ad-hoc field assembly happens
//! anywhere outside this module (spec §9).

use crate::models::{
    Ability, CoreParam, DraftComponent, GenerationEnvelope, MetricsExtra, PostEditParam,
    PromptPlaceholder, Scene,
};
use crate::multi_image::resolve_count;
use crate::resolution::resolve as resolve_resolution;
use gateway_gax::GatewayError;
use gateway_session::Region;

/// The four distinct envelope shapes the upstream `aigc_draft/generate`
/// endpoint accepts (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    Text2Img,
    Img2Img,
    MultiImg,
    Img2Video,
}

/// Everything the builder needs to assemble one envelope. Deliberately a
/// flat struct of plain values (no client objects, no IO) so the
/// function stays pure and trivially testable (spec Testable Property
/// 11: deterministic given inputs, modulo `seed`/`submit_id`).
pub struct BuildRequest<'a> {
    pub mode: GenerationMode,
    pub upstream_model: &'a str,
    pub prompt: &'a str,
    pub negative_prompt: Option<&'a str>,
    pub region: Region,
    pub ratio: Option<&'a str>,
    pub resolution_tier: Option<&'a str>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
    pub uploaded_image_uris: &'a [String],
    pub explicit_count: Option<u32>,
    pub submit_id: String,
    pub component_id: String,
}

fn ability_list_for(mode: GenerationMode, sample_strength: f32) -> Vec<Ability> {
    let ability_type = match mode {
        GenerationMode::Text2Img | GenerationMode::MultiImg => "text_to_image",
        GenerationMode::Img2Img => "blend",
        GenerationMode::Img2Video => "image_to_video",
    };
    vec![Ability {
        ability_type: ability_type.to_string(),
        strength: sample_strength,
    }]
}

fn generate_type_for(mode: GenerationMode) -> &'static str {
    match mode {
        GenerationMode::Text2Img => "text2img",
        GenerationMode::Img2Img => "img2img",
        GenerationMode::MultiImg => "multi_img",
        GenerationMode::Img2Video => "img2video",
    }
}

/// Builds the upstream request envelope for `req`. Pure: the same
/// inputs (including `seed`/`submit_id`, which callers treat as
/// external) always produce the same envelope.
pub fn build(req: &BuildRequest<'_>) -> Result<GenerationEnvelope, GatewayError> {
    if req.prompt.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("prompt must not be empty".into()));
    }
    if matches!(req.mode, GenerationMode::Img2Img | GenerationMode::Img2Video)
        && req.uploaded_image_uris.is_empty()
    {
        return Err(GatewayError::InvalidRequest(
            "this mode requires at least one uploaded image".into(),
        ));
    }

    let resolution = resolve_resolution(req.upstream_model, req.region, req.ratio, req.resolution_tier);

    let core_param = CoreParam {
        width: resolution.width,
        height: resolution.height,
        is_forced_resolution: resolution.is_forced,
        ratio: req.ratio.map(str::to_string),
        sample_strength: req.sample_strength,
        seed: req.seed,
        intelligent_ratio: req.intelligent_ratio,
        model_req_key: req.upstream_model.to_string(),
    };

    let draft_content = DraftComponent {
        component_id: req.component_id.clone(),
        generate_type: generate_type_for(req.mode).to_string(),
        ability_list: ability_list_for(req.mode, req.sample_strength),
        prompt_placeholder_list: vec![PromptPlaceholder {
            placeholder_id: format!("{}-prompt", req.component_id),
            prompt: req.prompt.to_string(),
        }],
        postedit_param: PostEditParam {
            uploaded_image_uris: req.uploaded_image_uris.to_vec(),
            negative_prompt: req.negative_prompt.map(str::to_string),
        },
    };

    let target_count = if req.mode == GenerationMode::MultiImg {
        resolve_count(req.explicit_count, req.prompt)
    } else {
        None
    };

    let scene = match req.mode {
        GenerationMode::Text2Img => Scene::ImageBasicGenerate,
        GenerationMode::MultiImg => Scene::ImageMultiGenerate,
        GenerationMode::Img2Img => Scene::ImageComposition,
        GenerationMode::Img2Video => Scene::VideoGenerate,
    };

    let metrics_extra = MetricsExtra {
        scene,
        submit_id: req.submit_id.clone(),
        resolution_type: req
            .resolution_tier
            .map(str::to_string)
            .unwrap_or_else(|| "default".to_string()),
        ability_strengths: ability_list_for(req.mode, req.sample_strength),
        target_count,
    };

    Ok(GenerationEnvelope {
        core_param,
        draft_content,
        metrics_extra,
    })
}

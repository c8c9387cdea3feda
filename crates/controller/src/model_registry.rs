//! Maps a user-facing model name to the upstream model code for a
//! region, with the region-default substitution rule from spec §4.5
//! step 1.

use gateway_gax::GatewayError;
use gateway_session::Region;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Image,
    Video,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Image => "image",
            ModelKind::Video => "video",
        }
    }
}

struct ModelEntry {
    user_facing: &'static str,
    upstream_code: &'static str,
    region: Region,
    kind: ModelKind,
}

/// Every (user-facing model, region) combination the gateway recognizes.
/// Adding a model/region pair to the upstream's lineup is a matter of
/// adding a row here.
const MODEL_TABLE: &[ModelEntry] = &[
    ModelEntry {
        user_facing: "jimeng-4.5",
        upstream_code: "jimeng-4.5",
        region: Region::Cn,
        kind: ModelKind::Image,
    },
    ModelEntry {
        user_facing: "jimeng-xl-lite",
        upstream_code: "jimeng-xl-lite",
        region: Region::Cn,
        kind: ModelKind::Image,
    },
    ModelEntry {
        user_facing: "dreamina-xl",
        upstream_code: "dreamina-xl",
        region: Region::Us,
        kind: ModelKind::Image,
    },
    ModelEntry {
        user_facing: "dreamina-xl",
        upstream_code: "dreamina-xl",
        region: Region::Hk,
        kind: ModelKind::Image,
    },
    ModelEntry {
        user_facing: "jimeng-video-2.0",
        upstream_code: "jimeng-video-2.0",
        region: Region::Cn,
        kind: ModelKind::Video,
    },
    ModelEntry {
        user_facing: "dreamina-video-1.0",
        upstream_code: "dreamina-video-1.0",
        region: Region::Us,
        kind: ModelKind::Video,
    },
    ModelEntry {
        user_facing: "dreamina-video-1.0",
        upstream_code: "dreamina-video-1.0",
        region: Region::Hk,
        kind: ModelKind::Video,
    },
];

/// The model each region falls back to for a given kind, keyed by the
/// region whose catalog it is native to. `resolve` uses this both to
/// pick a region's own default and to decide whether an unsupported
/// model name is "somebody else's default" (and thus substitutable)
/// rather than simply unknown.
const REGION_DEFAULTS: &[(Region, ModelKind, &str)] = &[
    (Region::Cn, ModelKind::Image, "jimeng-4.5"),
    (Region::Us, ModelKind::Image, "dreamina-xl"),
    (Region::Hk, ModelKind::Image, "dreamina-xl"),
    (Region::Cn, ModelKind::Video, "jimeng-video-2.0"),
    (Region::Us, ModelKind::Video, "dreamina-video-1.0"),
    (Region::Hk, ModelKind::Video, "dreamina-video-1.0"),
];

/// One row of the catalog as the HTTP surface's `/v1/models` handler
/// wants to render it: a user-facing name plus the region and kind it
/// is valid for.
#[derive(Clone, Copy, Debug)]
pub struct ModelInfo {
    pub name: &'static str,
    pub region: Region,
    pub kind: ModelKind,
}

/// Every model/region/kind combination the gateway recognizes, for the
/// `/v1/models` listing endpoint.
pub fn available_models() -> Vec<ModelInfo> {
    MODEL_TABLE
        .iter()
        .map(|e| ModelInfo {
            name: e.user_facing,
            region: e.region,
            kind: e.kind,
        })
        .collect()
}

fn region_default(region: Region, kind: ModelKind) -> Option<&'static str> {
    REGION_DEFAULTS
        .iter()
        .find(|(r, k, _)| *r == region && *k == kind)
        .map(|(_, _, name)| *name)
}

/// Resolves `user_model` to the upstream code to submit for `region`.
///
/// If `user_model` is directly supported in `region`, returns its code.
/// Otherwise, if `user_model` is the *default* model of some other
/// region (the caller likely just wants "the good model for my kind",
/// not this exact name), substitutes `region`'s own default instead of
/// failing. Any other miss is `UnsupportedModel`.
pub fn resolve_model(user_model: &str, region: Region, kind: ModelKind) -> Result<String, GatewayError> {
    if let Some(entry) = MODEL_TABLE
        .iter()
        .find(|e| e.user_facing == user_model && e.region == region && e.kind == kind)
    {
        return Ok(entry.upstream_code.to_string());
    }

    let is_default_elsewhere = REGION_DEFAULTS
        .iter()
        .any(|(r, k, name)| *k == kind && *r != region && *name == user_model);

    if is_default_elsewhere {
        if let Some(default) = region_default(region, kind) {
            tracing::info!(
                requested = user_model,
                substituted = default,
                region = region.as_str(),
                "model unsupported in region, substituting regional default"
            );
            return Ok(default.to_string());
        }
    }

    Err(GatewayError::UnsupportedModel {
        model: user_model.to_string(),
        region: region.as_str().to_string(),
    })
}

//! The plain input structs the three generation operations accept. Kept
//! separate from wire-level HTTP types so the HTTP surface crate owns
//! request deserialization and this crate stays transport-agnostic.

pub struct ImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub negative_prompt: Option<&'a str>,
    pub ratio: Option<&'a str>,
    pub resolution_tier: Option<&'a str>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
    pub explicit_count: Option<u32>,
}

pub struct CompositionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub negative_prompt: Option<&'a str>,
    pub images: &'a [Vec<u8>],
    pub ratio: Option<&'a str>,
    pub resolution_tier: Option<&'a str>,
    pub sample_strength: f32,
    pub seed: i64,
    pub intelligent_ratio: bool,
}

pub struct VideoRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: &'a [Vec<u8>],
    pub ratio: Option<&'a str>,
    pub resolution_tier: Option<&'a str>,
    pub sample_strength: f32,
    pub seed: i64,
}

//! Resolution resolution: forced model resolutions, ratio/tier parsing,
//! and multiple-of rounding (spec §4.3 "Resolution resolution rules").

use gateway_session::Region;

/// A resolved pixel size, plus whether it was forced by model policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub is_forced: bool,
}

/// The requested quality tier, mapped to a target long-edge pixel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionTier {
    P480,
    P720,
    P1080,
    K2,
}

impl ResolutionTier {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "480p" => Some(Self::P480),
            "720p" => Some(Self::P720),
            "1080p" => Some(Self::P1080),
            "2k" => Some(Self::K2),
            _ => None,
        }
    }

    /// The target long edge, in pixels, for this tier.
    fn long_edge(&self) -> u32 {
        match self {
            ResolutionTier::P480 => 854,
            ResolutionTier::P720 => 1280,
            ResolutionTier::P1080 => 1920,
            ResolutionTier::K2 => 2560,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::P480 => "480p",
            ResolutionTier::P720 => "720p",
            ResolutionTier::P1080 => "1080p",
            ResolutionTier::K2 => "2k",
        }
    }
}

/// Edges are rounded down to a multiple of this many pixels, matching
/// the block size most upstream models require.
const SUPPORTED_MULTIPLE: u32 = 8;

/// `width:height`, e.g. `16:9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ratio {
    pub w: u32,
    pub h: u32,
}

impl Ratio {
    pub fn parse(raw: &str) -> Option<Self> {
        let (w, h) = raw.split_once(':')?;
        let w: u32 = w.trim().parse().ok()?;
        let h: u32 = h.trim().parse().ok()?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self { w, h })
    }

    fn ratio_f64(&self) -> f64 {
        self.w as f64 / self.h as f64
    }
}

/// The default resolution used when a request supplies no parseable
/// ratio/tier, per region (spec §4.3 rule 3).
fn default_for_region(region: Region) -> Resolution {
    match region {
        Region::Cn => Resolution {
            width: 1328,
            height: 1328,
            is_forced: false,
        },
        Region::Us | Region::Hk => Resolution {
            width: 1024,
            height: 1024,
            is_forced: false,
        },
    }
}

/// Models whose output size is fixed regardless of requested ratio/tier,
/// keyed by (upstream model code, region). Mirrors the "forced
/// resolution" concept in the glossary: the policy source is
/// model+region, not a global constant.
fn forced_resolution(upstream_model: &str, region: Region) -> Option<Resolution> {
    match (upstream_model, region) {
        ("jimeng-xl-lite", Region::Cn) => Some(Resolution {
            width: 1024,
            height: 1024,
            is_forced: true,
        }),
        ("dreamina-avatar-v1", _) => Some(Resolution {
            width: 512,
            height: 512,
            is_forced: true,
        }),
        _ => None,
    }
}

fn round_down_to_multiple(value: u32, multiple: u32) -> u32 {
    let rounded = (value / multiple) * multiple;
    rounded.max(multiple)
}

/// Resolves the pixel dimensions for a request, following the
/// three-rule order in spec §4.3.
pub fn resolve(
    upstream_model: &str,
    region: Region,
    ratio: Option<&str>,
    tier: Option<&str>,
) -> Resolution {
    if let Some(forced) = forced_resolution(upstream_model, region) {
        return forced;
    }

    let ratio = ratio.and_then(Ratio::parse);
    let tier = tier.and_then(ResolutionTier::parse);

    let (Some(ratio), Some(tier)) = (ratio, tier) else {
        return default_for_region(region);
    };

    let long_edge = tier.long_edge();
    let (raw_w, raw_h) = if ratio.w >= ratio.h {
        (long_edge, (long_edge as f64 / ratio.ratio_f64()).round() as u32)
    } else {
        ((long_edge as f64 * ratio.ratio_f64()).round() as u32, long_edge)
    };

    Resolution {
        width: round_down_to_multiple(raw_w, SUPPORTED_MULTIPLE),
        height: round_down_to_multiple(raw_h, SUPPORTED_MULTIPLE),
        is_forced: false,
    }
}

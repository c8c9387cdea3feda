//! Service types and their configured daily caps.

use serde::{Deserialize, Serialize};

/// The billable generation kinds the ledger tracks separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Image,
    Video,
    Avatar,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Image => "image",
            ServiceType::Video => "video",
            ServiceType::Avatar => "avatar",
        }
    }
}

/// Per-service-type daily caps, one row per session per day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLimits {
    pub image: u32,
    pub video: u32,
    pub avatar: u32,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            image: 10,
            video: 2,
            avatar: 1,
        }
    }
}

impl ServiceLimits {
    pub fn for_service(&self, service: ServiceType) -> u32 {
        match service {
            ServiceType::Image => self.image,
            ServiceType::Video => self.video,
            ServiceType::Avatar => self.avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let limits = ServiceLimits::default();
        assert_eq!(limits.image, 10);
        assert_eq!(limits.video, 2);
        assert_eq!(limits.avatar, 1);
    }
}

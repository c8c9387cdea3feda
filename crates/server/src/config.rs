//! Layered configuration: compiled-in defaults, overlaid by `config.yaml`,
//! overlaid by environment variables (spec §11).
//!
//! Each fragment is its own small, independently-testable struct with
//! `#[serde(default)]` per field, the way the teacher's `ClientConfig`
//! composes small option structs rather than one monolithic bag of
//! fields with ad-hoc access.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scheduler admission limits (spec §4.7, §6 `TASK_MAX_CONCURRENT`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskConfig {
    pub max_concurrent: usize,
    /// How long a terminal task stays queryable before the reaper drops it.
    pub reap_retention_hours: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            reap_retention_hours: 24,
        }
    }
}

impl TaskConfig {
    pub fn reap_retention(&self) -> Duration {
        Duration::from_secs(self.reap_retention_hours * 3600)
    }
}

/// Outbound proxy settings for the upstream HTTP clients (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub kind: ProxyKind,
    pub auth: Option<String>,
    pub bypass: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    #[default]
    Socks5,
}

/// Upstream base-URL overrides (spec §6's `*_MIRROR` environment
/// variables), one optional override per mirror point.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MirrorConfig {
    pub dreamina_us_mirror: Option<String>,
    pub dreamina_hk_mirror: Option<String>,
    pub imagex_us_mirror: Option<String>,
    pub imagex_hk_mirror: Option<String>,
    pub imagex_cn_mirror: Option<String>,
    pub jimeng_cn_mirror: Option<String>,
    pub commerce_us_mirror: Option<String>,
    pub commerce_hk_mirror: Option<String>,
}

impl MirrorConfig {
    fn apply_env(&mut self) {
        apply_env_string(&mut self.dreamina_us_mirror, "DREAMINA_US_MIRROR");
        apply_env_string(&mut self.dreamina_hk_mirror, "DREAMINA_HK_MIRROR");
        apply_env_string(&mut self.imagex_us_mirror, "IMAGEX_US_MIRROR");
        apply_env_string(&mut self.imagex_hk_mirror, "IMAGEX_HK_MIRROR");
        apply_env_string(&mut self.imagex_cn_mirror, "IMAGEX_CN_MIRROR");
        apply_env_string(&mut self.jimeng_cn_mirror, "JIMENG_CN_MIRROR");
        apply_env_string(&mut self.commerce_us_mirror, "COMMERCE_US_MIRROR");
        apply_env_string(&mut self.commerce_hk_mirror, "COMMERCE_HK_MIRROR");
    }
}

/// Daily quota limits and retention, mirroring
/// [`gateway_quota::ServiceLimits`] but kept as its own config fragment
/// so the YAML/env surface doesn't reach into the quota crate's types.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuotaConfig {
    pub image_daily_limit: u32,
    pub video_daily_limit: u32,
    pub avatar_daily_limit: u32,
    pub retention_days: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            image_daily_limit: 10,
            video_daily_limit: 2,
            avatar_daily_limit: 1,
            retention_days: 30,
        }
    }
}

impl QuotaConfig {
    pub fn to_service_limits(&self) -> gateway_quota::ServiceLimits {
        gateway_quota::ServiceLimits {
            image: self.image_daily_limit,
            video: self.video_daily_limit,
            avatar: self.avatar_daily_limit,
        }
    }
}

/// `pretty` for local development, `json` for production log shipping
/// (spec §10).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// The top-level, composed configuration. Never read ad hoc from env at
/// call sites; every field is resolved once at startup by [`load`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub log_format: LogFormat,
    pub quota_path: String,
    pub task: TaskConfig,
    pub proxy: ProxyConfig,
    pub mirrors: MirrorConfig,
    pub quota: QuotaConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_format: LogFormat::Pretty,
            quota_path: "data/session_usage.json".to_string(),
            task: TaskConfig::default(),
            proxy: ProxyConfig::default(),
            mirrors: MirrorConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

fn apply_env_string(field: &mut Option<String>, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *field = Some(value);
    }
}

/// Loads the layered configuration: compiled-in defaults, then
/// `config_path` (if the file exists), then process environment
/// variables. Later layers win (spec §11).
///
/// A missing config file is not an error (the defaults stand in); a
/// present-but-unparseable file is.
pub fn load(config_path: &Path) -> Result<GatewayConfig, String> {
    let mut config = GatewayConfig::default();

    if config_path.exists() {
        let raw = std::fs::read_to_string(config_path)
            .map_err(|e| format!("reading {config_path:?}: {e}"))?;
        config = serde_yaml::from_str(&raw).map_err(|e| format!("parsing {config_path:?}: {e}"))?;
    }

    if let Ok(addr) = std::env::var("GATEWAY_LISTEN_ADDR") {
        config.listen_addr = addr;
    }
    if let Ok(format) = std::env::var("GATEWAY_LOG_FORMAT") {
        config.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
    }
    if let Ok(max) = std::env::var("TASK_MAX_CONCURRENT") {
        if let Ok(max) = max.parse() {
            config.task.max_concurrent = max;
        }
    }
    config.mirrors.apply_env();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.task.max_concurrent, 10);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "listen_addr: \"127.0.0.1:9000\"\ntask:\n  max_concurrent: 3\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.task.max_concurrent, 3);
        assert_eq!(config.task.reap_retention_hours, 24);
    }

    #[test]
    fn env_wins_over_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "listen_addr: \"127.0.0.1:9000\"\n").unwrap();
        std::env::set_var("GATEWAY_LISTEN_ADDR", "127.0.0.1:9999");
        let config = load(&path).unwrap();
        std::env::remove_var("GATEWAY_LISTEN_ADDR");
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
    }

    #[test]
    fn mirror_env_overrides_are_individually_applied() {
        let mut mirrors = MirrorConfig::default();
        std::env::set_var("IMAGEX_US_MIRROR", "https://mirror.example.com");
        mirrors.apply_env();
        std::env::remove_var("IMAGEX_US_MIRROR");
        assert_eq!(mirrors.imagex_us_mirror.as_deref(), Some("https://mirror.example.com"));
        assert_eq!(mirrors.dreamina_us_mirror, None);
    }
}

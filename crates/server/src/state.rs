//! Shared, cheaply-cloneable application state every handler closes
//! over. Constructed once at startup (spec §4.10) and passed into the
//! router; no handler reaches for a global singleton.

use crate::config::GatewayConfig;
use chrono::{DateTime, Utc};
use gateway_controller::GenerationController;
use gateway_quota::QuotaLedger;
use gateway_task::TaskStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<GenerationController>,
    pub tasks: Arc<TaskStore>,
    pub quota: Arc<QuotaLedger>,
    pub config: Arc<GatewayConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        controller: Arc<GenerationController>,
        tasks: Arc<TaskStore>,
        quota: Arc<QuotaLedger>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            controller,
            tasks,
            quota,
            config,
            started_at: Utc::now(),
        }
    }
}

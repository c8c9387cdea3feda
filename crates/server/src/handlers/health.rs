//! `GET /ping`: a liveness probe reporting uptime, not a full readiness
//! check — it never touches the quota ledger or upstream.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct PingResponse {
    status: &'static str,
    uptime_seconds: i64,
}

pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

//! `GET /usage/...`: read-only views over the quota ledger's aggregates,
//! for dashboards and support tooling rather than enforcement (spec
//! §5's `SessionDailyUsage` row, surfaced via `gateway_quota::stats`).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use gateway_gax::GatewayError;
use gateway_quota::DailyAggregate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct DailyQuery {
    date: Option<NaiveDate>,
}

pub async fn daily(State(state): State<AppState>, Query(q): Query<DailyQuery>) -> Json<DailyAggregate> {
    let date = q.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    Json(state.quota.daily_aggregate(date).await)
}

#[derive(Deserialize)]
pub struct RangeQuery {
    start: NaiveDate,
    end: NaiveDate,
}

pub async fn range(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> Result<Json<Vec<DailyAggregate>>, ApiError> {
    if q.start > q.end {
        return Err(GatewayError::InvalidRequest("start date must not be after end date".into()).into());
    }
    Ok(Json(state.quota.range_aggregate(q.start, q.end).await))
}

#[derive(Deserialize)]
pub struct SessionHistoryQuery {
    #[serde(default = "default_days")]
    days: i64,
}

fn default_days() -> i64 {
    30
}

pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(q): Query<SessionHistoryQuery>,
) -> Json<Vec<gateway_quota::SessionDailyUsage>> {
    Json(state.quota.history(&session_id, q.days).await)
}

//! `GET /v1/models`: the static catalog the region/model resolver uses,
//! exposed read-only so callers can discover what's available without
//! guessing at model names (spec §4.4).

use crate::dto::ModelListEntry;
use axum::Json;
use gateway_controller::available_models;

pub async fn list() -> Json<Vec<ModelListEntry>> {
    let entries = available_models()
        .into_iter()
        .map(|m| ModelListEntry {
            name: m.name,
            region: m.region.as_str(),
            kind: m.kind.as_str(),
        })
        .collect();
    Json(entries)
}

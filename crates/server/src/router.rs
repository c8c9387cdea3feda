//! The HTTP surface: one route per operation, routed straight to its
//! handler function — no business logic lives here (spec §4.9, echoing
//! the teacher's thin `Router::new().route(...)` style).

use crate::handlers::{batch, chat, health, images, models, tasks, usage, videos};
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/v1/models", get(models::list))
        .route("/v1/chat/completions", post(chat::completions))
        .route("/v1/images/generations", post(images::generate))
        .route("/v1/images/compositions", post(images::compose))
        .route("/v1/videos/generations", post(videos::generate))
        .route("/v1/async/images/generations", post(tasks::submit_image_generation))
        .route("/v1/async/images/compositions", post(tasks::submit_image_composition))
        .route("/v1/async/videos/generations", post(tasks::submit_video_generation))
        .route("/v1/async/tasks/:id/status", get(tasks::status))
        .route("/v1/async/tasks/:id/result", get(tasks::result))
        .route("/v1/async/tasks/:id/cancel", delete(tasks::cancel))
        .route("/v1/async/tasks/:id", delete(tasks::delete))
        .route("/v1/async/batch/submit", post(batch::submit))
        .route("/v1/async/batch/cancel", delete(batch::cancel))
        .route("/usage/daily", get(usage::daily))
        .route("/usage/range", get(usage::range))
        .route("/usage/session/:session_id", get(usage::session_history))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gateway_controller::GenerationController;
    use gateway_quota::{QuotaLedger, ServiceLimits};
    use gateway_task::TaskStore;
    use gateway_upload::transport::MockUploadTransport;
    use gateway_upload::{RegionEndpoints, UploadPipeline};
    use gateway_upstream::client::MockUpstreamClient;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(
            QuotaLedger::open(dir.path().join("usage.json"), ServiceLimits::default())
                .await
                .unwrap(),
        );
        let upload = UploadPipeline::new(Arc::new(MockUploadTransport::new()), Arc::new(RegionEndpoints::for_region));
        let upstream = MockUpstreamClient::new();
        let controller = Arc::new(GenerationController::new(Arc::clone(&ledger), Arc::new(upload), Arc::new(upstream)));
        let state = AppState::new(controller, TaskStore::new(), ledger, Arc::new(GatewayConfig::default()));
        (state, dir)
    }

    #[tokio::test]
    async fn ping_reports_ok() {
        let (state, _dir) = test_state().await;
        let app = build(state);
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_task_status_is_404() {
        let (state, _dir) = test_state().await;
        let app = build(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/async/tasks/nope/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn models_list_is_non_empty() {
        let (state, _dir) = test_state().await;
        let app = build(state);
        let response = app
            .oneshot(Request::builder().uri("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

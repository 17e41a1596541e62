//! Health and readiness endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health, get_ready))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/ready", get(get_ready))
}

/// Heartbeat endpoint.
///
/// Returns `{"status": "ok", "version": "..."}` with HTTP 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health() -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness endpoint.
///
/// Both stores must answer and the task simulator must not be shut down.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Server is ready", body = Value),
        (status = 503, description = "Server is shutting down", body = Value)
    )
)]
pub async fn get_ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let stats = state.content.read().await.stats();
    let tasks = state.tasks.store().read().await.len();
    let simulator_up = !state.tasks.is_shut_down();

    let (status, label, simulator) = if simulator_up {
        (StatusCode::OK, "ready", "running")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready", "stopped")
    };
    let body = json!({
        "status": label,
        "checks": {
            "content_store": { "status": "ok", "subjects": stats.subjects },
            "task_store":    { "status": "ok", "tasks": tasks },
            "simulator":     simulator,
        },
    });
    (status, Json(body))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::Method;

    use super::*;
    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn health_response_has_ok_status() {
        let Json(body) = get_health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn health_response_has_version() {
        let Json(body) = get_health().await;
        assert!(!body["version"].as_str().unwrap_or("").is_empty());
    }

    #[tokio::test]
    async fn ready_reports_store_checks() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["content_store"]["subjects"], 4);
        assert_eq!(body["checks"]["task_store"]["tasks"], 4);
    }

    #[tokio::test]
    async fn ready_fails_after_shutdown() {
        let (app, state) = app();
        state.tasks.shutdown();
        let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["simulator"], "stopped");
    }
}

//! Content view state: the focused entity, subject filters and counts.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use mindforge_core::content::FiltersPatch;
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::content::{
    FiltersRequest, FiltersResponse, SelectionBody, SelectionResponse, StatsResponse,
    SubjectResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        get_selection,
        set_selection,
        get_filters,
        set_filters,
        clear_filters,
        get_filtered_subjects,
        get_stats
    ),
    components(schemas(
        SelectionBody,
        SelectionResponse,
        FiltersRequest,
        FiltersResponse,
        StatsResponse
    ))
)]
pub struct ContentApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/content/selection", get(get_selection).put(set_selection))
        .route(
            "/content/filters",
            get(get_filters).put(set_filters).delete(clear_filters),
        )
        .route("/content/subjects", get(get_filtered_subjects))
        .route("/content/stats", get(get_stats))
}

/// The current selection and the entity it resolves to.
///
/// A selection whose entity was deleted reports `not_found`.
#[utoipa::path(
    get,
    path = "/v1/content/selection",
    tag = "content",
    responses(
        (status = 200, description = "Current selection", body = SelectionResponse),
    )
)]
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionResponse> {
    let content = state.content.read().await;
    Json(SelectionResponse::new(
        content.selection(),
        content.resolve_selection(),
    ))
}

#[utoipa::path(
    put,
    path = "/v1/content/selection",
    tag = "content",
    request_body = SelectionBody,
    responses(
        (status = 200, description = "Selection replaced", body = SelectionResponse),
        (status = 400, description = "Unknown kind"),
    )
)]
pub async fn set_selection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> Result<Json<SelectionResponse>, ServerError> {
    let selection = body.into_selection().map_err(ServerError::BadRequest)?;
    let mut content = state.content.write().await;
    content.set_selection(selection);
    debug!(selection = ?content.selection(), "selection changed");
    Ok(Json(SelectionResponse::new(
        content.selection(),
        content.resolve_selection(),
    )))
}

#[utoipa::path(
    get,
    path = "/v1/content/filters",
    tag = "content",
    responses(
        (status = 200, description = "Current filters", body = FiltersResponse),
    )
)]
pub async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    Json(state.content.read().await.filters().to_response())
}

/// Merge into the current filters. Missing fields are kept, `null` clears.
#[utoipa::path(
    put,
    path = "/v1/content/filters",
    tag = "content",
    request_body = FiltersRequest,
    responses(
        (status = 200, description = "Filters updated", body = FiltersResponse),
    )
)]
pub async fn set_filters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FiltersRequest>,
) -> Json<FiltersResponse> {
    let mut content = state.content.write().await;
    Json(content.set_filters(req.into()).to_response())
}

#[utoipa::path(
    delete,
    path = "/v1/content/filters",
    tag = "content",
    responses(
        (status = 200, description = "Filters reset", body = FiltersResponse),
    )
)]
pub async fn clear_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    let mut content = state.content.write().await;
    Json(content.set_filters(FiltersPatch::clear()).to_response())
}

/// Subjects passing the stored filters.
#[utoipa::path(
    get,
    path = "/v1/content/subjects",
    tag = "content",
    responses(
        (status = 200, description = "Filtered subjects", body = [SubjectResponse]),
    )
)]
pub async fn get_filtered_subjects(State(state): State<Arc<AppState>>) -> Json<Vec<SubjectResponse>> {
    let content = state.content.read().await;
    Json(
        content
            .filtered_subjects()
            .into_iter()
            .map(|s| s.to_response())
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/v1/content/stats",
    tag = "content",
    responses(
        (status = 200, description = "Entity and task counts", body = StatsResponse),
    )
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.content.read().await.stats();
    let tasks = state.tasks.store().read().await.count_by_status();
    Json(StatsResponse::new(stats, tasks))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn selection_starts_empty() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/v1/content/selection", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "empty");
        assert!(body["selection"].is_null());
    }

    #[tokio::test]
    async fn selection_goes_dangling_after_delete() {
        let (app, _) = app();
        let selection = json!({
            "kind": "cluster",
            "subject_id": "subj-math-9-algebra",
            "cluster_id": "clust-inequ",
        });
        let (status, body) = send(&app, Method::PUT, "/v1/content/selection", Some(selection)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "resolved");
        assert_eq!(body["entity"]["topic"], "Ungleichungen");

        let (status, _) = send(&app, Method::DELETE, "/v1/clusters/clust-inequ", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/v1/content/selection", None).await;
        assert_eq!(body["state"], "not_found");
        assert_eq!(body["selection"]["cluster_id"], "clust-inequ");
        assert!(body["entity"].is_null());
    }

    #[tokio::test]
    async fn answer_selection_resolves_to_variant() {
        let (app, _) = app();
        let selection = json!({
            "kind": "answer",
            "subject_id": "subj-math-9-algebra",
            "cluster_id": "clust-quad-eq",
            "variant_id": "var-quad-001",
        });
        let (_, body) = send(&app, Method::PUT, "/v1/content/selection", Some(selection)).await;
        assert_eq!(body["state"], "resolved");
        assert_eq!(body["entity"]["id"], "var-quad-001");
    }

    #[tokio::test]
    async fn unknown_selection_kind_is_rejected() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/content/selection",
            Some(json!({ "kind": "chapter" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filters_merge_and_narrow_subjects() {
        let (app, _) = app();
        let (_, body) = send(
            &app,
            Method::PUT,
            "/v1/content/filters",
            Some(json!({ "search": "mathe", "task_id": "task-demo-variants" })),
        )
        .await;
        assert_eq!(body["search"], "mathe");
        assert_eq!(body["task_id"], "task-demo-variants");

        // Only task_id is cleared; search survives.
        let (_, body) = send(
            &app,
            Method::PUT,
            "/v1/content/filters",
            Some(json!({ "task_id": null })),
        )
        .await;
        assert_eq!(body["search"], "mathe");
        assert!(body["task_id"].is_null());

        let (_, subjects) = send(&app, Method::GET, "/v1/content/subjects", None).await;
        assert_eq!(subjects.as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::DELETE, "/v1/content/filters", None).await;
        assert_eq!(body["search"], "");
        let (_, subjects) = send(&app, Method::GET, "/v1/content/subjects", None).await;
        assert_eq!(subjects.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn stats_count_content_and_tasks() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/v1/content/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subjects"], 4);
        assert_eq!(body["clusters"], 7);
        assert_eq!(body["variants"], 13);
        assert_eq!(body["answers"], 20);
        assert_eq!(body["tasks"]["completed"], 2);
        assert_eq!(body["tasks"]["failed"], 1);
        assert_eq!(body["tasks"]["cancelled"], 1);
    }
}

//! Question cluster endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mindforge_core::content::{ClusterPatch, NewCluster};
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::content::{
    ClusterQuery, ClusterResponse, CreateClusterRequest, DeleteResponse, UpdateClusterRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_clusters, create_cluster, get_cluster, update_cluster, delete_cluster),
    components(schemas(ClusterResponse, CreateClusterRequest, UpdateClusterRequest))
)]
pub struct ClustersApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clusters", get(list_clusters).post(create_cluster))
        .route(
            "/clusters/{id}",
            get(get_cluster).put(update_cluster).delete(delete_cluster),
        )
}

#[utoipa::path(
    get,
    path = "/v1/clusters",
    tag = "clusters",
    params(ClusterQuery),
    responses(
        (status = 200, description = "Clusters listed", body = [ClusterResponse]),
    )
)]
pub async fn list_clusters(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ClusterQuery>,
) -> Result<Json<Vec<ClusterResponse>>, ServerError> {
    let content = state.content.read().await;
    let clusters: Vec<ClusterResponse> = match &q.subject_id {
        Some(subject_id) => content
            .get_clusters_by_subject(subject_id)
            .into_iter()
            .map(|c| c.to_response())
            .collect(),
        None => content.clusters().iter().map(|c| c.to_response()).collect(),
    };
    Ok(Json(clusters))
}

#[utoipa::path(
    post,
    path = "/v1/clusters",
    tag = "clusters",
    request_body = CreateClusterRequest,
    responses(
        (status = 201, description = "Cluster created", body = ClusterResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Subject not found"),
    )
)]
pub async fn create_cluster(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateClusterRequest>,
) -> Result<(StatusCode, Json<ClusterResponse>), ServerError> {
    req.validate()?;
    let cluster = state.content.write().await.create_cluster(NewCluster {
        subject_id: req.subject_id,
        topic: req.topic,
        canonical_template: req.canonical_template,
        difficulty_baseline: req.difficulty_baseline,
    })?;
    Ok((StatusCode::CREATED, Json(cluster.to_response())))
}

#[utoipa::path(
    get,
    path = "/v1/clusters/{id}",
    tag = "clusters",
    params(("id" = String, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Cluster retrieved", body = ClusterResponse),
        (status = 404, description = "Cluster not found"),
    )
)]
pub async fn get_cluster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClusterResponse>, ServerError> {
    let content = state.content.read().await;
    let cluster = content
        .get_cluster_by_id(&id)
        .ok_or_else(|| ServerError::NotFound(format!("cluster {id} not found")))?;
    Ok(Json(cluster.to_response()))
}

#[utoipa::path(
    put,
    path = "/v1/clusters/{id}",
    tag = "clusters",
    params(("id" = String, Path, description = "Cluster ID")),
    request_body = UpdateClusterRequest,
    responses(
        (status = 200, description = "Cluster updated", body = ClusterResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cluster or new subject not found"),
    )
)]
pub async fn update_cluster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClusterRequest>,
) -> Result<Json<ClusterResponse>, ServerError> {
    req.validate()?;
    let patch = ClusterPatch {
        subject_id: req.subject_id,
        topic: req.topic,
        canonical_template: req.canonical_template,
        difficulty_baseline: req.difficulty_baseline,
    };
    let cluster = state
        .content
        .write()
        .await
        .update_cluster(&id, patch)?
        .ok_or_else(|| ServerError::NotFound(format!("cluster {id} not found")))?;
    Ok(Json(cluster.to_response()))
}

#[utoipa::path(
    delete,
    path = "/v1/clusters/{id}",
    tag = "clusters",
    params(("id" = String, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Cluster and its variants deleted", body = DeleteResponse),
        (status = 404, description = "Cluster not found"),
    )
)]
pub async fn delete_cluster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let summary = state.content.write().await.delete_cluster(&id);
    if summary.is_empty() {
        return Err(ServerError::NotFound(format!("cluster {id} not found")));
    }
    Ok(Json(summary.to_response()))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn list_by_subject() {
        let (app, _) = app();
        let (status, body) =
            send(&app, Method::GET, "/v1/clusters?subject_id=subj-deutsch-9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], "clust-grammar-cases");
    }

    #[tokio::test]
    async fn update_difficulty_clamps_and_touches() {
        let (app, _) = app();
        let (_, before) = send(&app, Method::GET, "/v1/clusters/clust-lin-eq", None).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/clusters/clust-lin-eq",
            Some(json!({ "difficulty_baseline": 6 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["difficulty_baseline"], 6);
        assert_ne!(body["updated_at"], before["updated_at"]);
        assert_eq!(body["created_at"], before["created_at"]);

        let (_, body) = send(
            &app,
            Method::PUT,
            "/v1/clusters/clust-lin-eq",
            Some(json!({ "difficulty_baseline": 99 })),
        )
        .await;
        assert_eq!(body["difficulty_baseline"], 10);
    }

    #[tokio::test]
    async fn create_under_missing_subject_is_404() {
        let (app, _) = app();
        let req = json!({ "subject_id": "subj-gone", "topic": "Brüche" });
        let (status, body) = send(&app, Method::POST, "/v1/clusters", Some(req)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("subj-gone"));
    }

    #[tokio::test]
    async fn create_defaults_difficulty() {
        let (app, _) = app();
        let req = json!({ "subject_id": "subj-englisch-9", "topic": "Past Perfect" });
        let (status, body) = send(&app, Method::POST, "/v1/clusters", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["difficulty_baseline"], 5);
    }
}

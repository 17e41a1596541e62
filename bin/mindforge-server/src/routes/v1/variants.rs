//! Question variant endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mindforge_core::content::{NewVariant, VariantPatch};
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::content::{
    CreateVariantRequest, DeleteResponse, QuestionWithAnswersResponse, UpdateVariantRequest,
    VariantQuery, VariantResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_variants,
        create_variant,
        get_variant,
        get_variant_full,
        update_variant,
        delete_variant
    ),
    components(schemas(
        VariantResponse,
        QuestionWithAnswersResponse,
        CreateVariantRequest,
        UpdateVariantRequest
    ))
)]
pub struct VariantsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/variants", get(list_variants).post(create_variant))
        .route(
            "/variants/{id}",
            get(get_variant).put(update_variant).delete(delete_variant),
        )
        .route("/variants/{id}/full", get(get_variant_full))
}

#[utoipa::path(
    get,
    path = "/v1/variants",
    tag = "variants",
    params(VariantQuery),
    responses(
        (status = 200, description = "Variants listed", body = [VariantResponse]),
    )
)]
pub async fn list_variants(
    State(state): State<Arc<AppState>>,
    Query(q): Query<VariantQuery>,
) -> Result<Json<Vec<VariantResponse>>, ServerError> {
    let content = state.content.read().await;
    let variants: Vec<VariantResponse> = match &q.cluster_id {
        Some(cluster_id) => content
            .get_variants_by_cluster(cluster_id)
            .into_iter()
            .map(|v| v.to_response())
            .collect(),
        None => content.variants().iter().map(|v| v.to_response()).collect(),
    };
    Ok(Json(variants))
}

#[utoipa::path(
    post,
    path = "/v1/variants",
    tag = "variants",
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant created", body = VariantResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cluster not found"),
    )
)]
pub async fn create_variant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<VariantResponse>), ServerError> {
    req.validate()?;
    let variant = state.content.write().await.create_variant(NewVariant {
        cluster_id: req.cluster_id,
        question_text: req.question_text,
    })?;
    Ok((StatusCode::CREATED, Json(variant.to_response())))
}

#[utoipa::path(
    get,
    path = "/v1/variants/{id}",
    tag = "variants",
    params(("id" = String, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant retrieved", body = VariantResponse),
        (status = 404, description = "Variant not found"),
    )
)]
pub async fn get_variant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VariantResponse>, ServerError> {
    let content = state.content.read().await;
    let variant = content
        .get_variant_by_id(&id)
        .ok_or_else(|| ServerError::NotFound(format!("variant {id} not found")))?;
    Ok(Json(variant.to_response()))
}

/// The variant together with its answers, cluster and subject.
#[utoipa::path(
    get,
    path = "/v1/variants/{id}/full",
    tag = "variants",
    params(("id" = String, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant with answers and context", body = QuestionWithAnswersResponse),
        (status = 404, description = "Variant not found"),
    )
)]
pub async fn get_variant_full(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuestionWithAnswersResponse>, ServerError> {
    let content = state.content.read().await;
    let question = content
        .get_question_with_answers(&id)
        .ok_or_else(|| ServerError::NotFound(format!("variant {id} not found")))?;
    Ok(Json(question.to_response()))
}

#[utoipa::path(
    put,
    path = "/v1/variants/{id}",
    tag = "variants",
    params(("id" = String, Path, description = "Variant ID")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "Variant updated", body = VariantResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Variant or new cluster not found"),
    )
)]
pub async fn update_variant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateVariantRequest>,
) -> Result<Json<VariantResponse>, ServerError> {
    req.validate()?;
    let patch = VariantPatch {
        cluster_id: req.cluster_id,
        question_text: req.question_text,
    };
    let variant = state
        .content
        .write()
        .await
        .update_variant(&id, patch)?
        .ok_or_else(|| ServerError::NotFound(format!("variant {id} not found")))?;
    Ok(Json(variant.to_response()))
}

#[utoipa::path(
    delete,
    path = "/v1/variants/{id}",
    tag = "variants",
    params(("id" = String, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant and its answers deleted", body = DeleteResponse),
        (status = 404, description = "Variant not found"),
    )
)]
pub async fn delete_variant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let summary = state.content.write().await.delete_variant(&id);
    if summary.is_empty() {
        return Err(ServerError::NotFound(format!("variant {id} not found")));
    }
    Ok(Json(summary.to_response()))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn move_variant_to_other_cluster() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/variants/var-lin-005",
            Some(json!({ "cluster_id": "clust-inequ" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cluster_id"], "clust-inequ");

        let (_, list) = send(&app, Method::GET, "/v1/variants?cluster_id=clust-inequ", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/variants/var-lin-005",
            Some(json!({ "cluster_id": "clust-gone" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_variant_includes_answers_and_context() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/v1/variants/var-quad-001/full", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["variant"]["id"], "var-quad-001");
        assert_eq!(body["answers"].as_array().unwrap().len(), 4);
        assert_eq!(body["cluster"]["id"], "clust-quad-eq");
        assert_eq!(body["subject"]["key"], "mathe-9-algebra");

        let (status, body) = send(&app, Method::GET, "/v1/variants/var-gone/full", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("var-gone"));
    }

    #[tokio::test]
    async fn delete_reports_removed_answers() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::DELETE, "/v1/variants/var-quad-001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["variants"], 1);
        assert_eq!(body["answers"], 4);
    }
}

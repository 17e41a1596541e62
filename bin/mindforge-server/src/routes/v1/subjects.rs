//! Subject endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mindforge_core::content::{NewSubject, SubjectPatch};
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::content::{
    CreateSubjectRequest, DeleteResponse, QuestionWithAnswersResponse, SubjectQuery,
    SubjectResponse, UpdateSubjectRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_subjects,
        create_subject,
        get_subject,
        update_subject,
        delete_subject,
        random_question
    ),
    components(schemas(
        SubjectResponse,
        CreateSubjectRequest,
        UpdateSubjectRequest,
        DeleteResponse
    ))
)]
pub struct SubjectsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route("/subjects/by-key/{key}/random-question", get(random_question))
}

#[utoipa::path(
    get,
    path = "/v1/subjects",
    tag = "subjects",
    params(SubjectQuery),
    responses(
        (status = 200, description = "Subjects listed", body = [SubjectResponse]),
    )
)]
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SubjectQuery>,
) -> Result<Json<Vec<SubjectResponse>>, ServerError> {
    let content = state.content.read().await;
    let subjects = content.filter_subjects(&q.to_filters());
    Ok(Json(subjects.into_iter().map(|s| s.to_response()).collect()))
}

#[utoipa::path(
    post,
    path = "/v1/subjects",
    tag = "subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Key already in use"),
    )
)]
pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<SubjectResponse>), ServerError> {
    req.validate()?;
    let subject = state.content.write().await.create_subject(NewSubject {
        key: req.key,
        name: req.name,
        description: req.description,
    })?;
    Ok((StatusCode::CREATED, Json(subject.to_response())))
}

#[utoipa::path(
    get,
    path = "/v1/subjects/{id}",
    tag = "subjects",
    params(("id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject retrieved", body = SubjectResponse),
        (status = 404, description = "Subject not found"),
    )
)]
pub async fn get_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubjectResponse>, ServerError> {
    let content = state.content.read().await;
    let subject = content
        .get_subject_by_id(&id)
        .ok_or_else(|| ServerError::NotFound(format!("subject {id} not found")))?;
    Ok(Json(subject.to_response()))
}

#[utoipa::path(
    put,
    path = "/v1/subjects/{id}",
    tag = "subjects",
    params(("id" = String, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Subject not found"),
        (status = 409, description = "Key already in use"),
    )
)]
pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, ServerError> {
    req.validate()?;
    let patch = SubjectPatch {
        key: req.key,
        name: req.name,
        description: req.description,
    };
    let subject = state
        .content
        .write()
        .await
        .update_subject(&id, patch)?
        .ok_or_else(|| ServerError::NotFound(format!("subject {id} not found")))?;
    Ok(Json(subject.to_response()))
}

#[utoipa::path(
    delete,
    path = "/v1/subjects/{id}",
    tag = "subjects",
    params(("id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject and its content deleted", body = DeleteResponse),
        (status = 404, description = "Subject not found"),
    )
)]
pub async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let summary = state.content.write().await.delete_subject(&id);
    if summary.is_empty() {
        return Err(ServerError::NotFound(format!("subject {id} not found")));
    }
    info!(subject_id = %id, removed = summary.total(), "subject deleted via api");
    Ok(Json(summary.to_response()))
}

/// A random variant from any cluster of the subject, with its answers.
#[utoipa::path(
    get,
    path = "/v1/subjects/by-key/{key}/random-question",
    tag = "subjects",
    params(("key" = String, Path, description = "Subject key")),
    responses(
        (status = 200, description = "Randomly picked question", body = QuestionWithAnswersResponse),
        (status = 404, description = "Unknown subject or no variants yet"),
    )
)]
pub async fn random_question(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<QuestionWithAnswersResponse>, ServerError> {
    let content = state.content.read().await;
    let question = content
        .get_random_question_for_subject(&key, &mut rand::thread_rng())
        .ok_or_else(|| ServerError::NotFound(format!("no question for subject {key}")))?;
    Ok(Json(question.to_response()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

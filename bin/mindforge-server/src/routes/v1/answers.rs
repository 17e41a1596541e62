//! Answer endpoints, including all-or-nothing bulk creation.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mindforge_core::content::{AnswerPatch, NewAnswer};
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::content::{
    AnswerOptionRequest, AnswerQuery, AnswerResponse, BulkAnswersRequest, CreateAnswerRequest,
    DeleteResponse, UpdateAnswerRequest,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_answers, create_answer, create_answers_bulk, get_answer, update_answer, delete_answer),
    components(schemas(
        AnswerResponse,
        CreateAnswerRequest,
        AnswerOptionRequest,
        BulkAnswersRequest,
        UpdateAnswerRequest
    ))
)]
pub struct AnswersApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/answers", get(list_answers).post(create_answer))
        .route("/answers/bulk", post(create_answers_bulk))
        .route(
            "/answers/{id}",
            get(get_answer).put(update_answer).delete(delete_answer),
        )
}

#[utoipa::path(
    get,
    path = "/v1/answers",
    tag = "answers",
    params(AnswerQuery),
    responses(
        (status = 200, description = "Answers listed", body = [AnswerResponse]),
    )
)]
pub async fn list_answers(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AnswerQuery>,
) -> Result<Json<Vec<AnswerResponse>>, ServerError> {
    let content = state.content.read().await;
    let answers = match &q.variant_id {
        Some(variant_id) => content
            .get_answers_by_variant(variant_id)
            .into_iter()
            .map(|a| a.to_response())
            .collect(),
        None => content.answers().iter().map(|a| a.to_response()).collect(),
    };
    Ok(Json(answers))
}

#[utoipa::path(
    post,
    path = "/v1/answers",
    tag = "answers",
    request_body = CreateAnswerRequest,
    responses(
        (status = 201, description = "Answer created", body = AnswerResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Variant not found"),
    )
)]
pub async fn create_answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAnswerRequest>,
) -> Result<(StatusCode, Json<AnswerResponse>), ServerError> {
    req.validate()?;
    let answer = state.content.write().await.create_answer(NewAnswer {
        variant_id: req.variant_id,
        answer_text: req.answer_text,
        is_correct: req.is_correct,
        distractor_type: req.distractor_type,
    })?;
    Ok((StatusCode::CREATED, Json(answer.to_response())))
}

/// Create several answers for one variant. Nothing is stored if any answer
/// is rejected.
#[utoipa::path(
    post,
    path = "/v1/answers/bulk",
    tag = "answers",
    request_body = BulkAnswersRequest,
    responses(
        (status = 201, description = "Answers created", body = [AnswerResponse]),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Variant not found"),
    )
)]
pub async fn create_answers_bulk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkAnswersRequest>,
) -> Result<(StatusCode, Json<Vec<AnswerResponse>>), ServerError> {
    req.validate()?;
    let options = req.answers.into_iter().map(Into::into).collect();
    let created = state
        .content
        .write()
        .await
        .create_answers_bulk(&req.variant_id, options)?;
    Ok((
        StatusCode::CREATED,
        Json(created.iter().map(|a| a.to_response()).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/answers/{id}",
    tag = "answers",
    params(("id" = String, Path, description = "Answer ID")),
    responses(
        (status = 200, description = "Answer retrieved", body = AnswerResponse),
        (status = 404, description = "Answer not found"),
    )
)]
pub async fn get_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AnswerResponse>, ServerError> {
    let content = state.content.read().await;
    let answer = content
        .get_answer_by_id(&id)
        .ok_or_else(|| ServerError::NotFound(format!("answer {id} not found")))?;
    Ok(Json(answer.to_response()))
}

#[utoipa::path(
    put,
    path = "/v1/answers/{id}",
    tag = "answers",
    params(("id" = String, Path, description = "Answer ID")),
    request_body = UpdateAnswerRequest,
    responses(
        (status = 200, description = "Answer updated", body = AnswerResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Answer or new variant not found"),
    )
)]
pub async fn update_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAnswerRequest>,
) -> Result<Json<AnswerResponse>, ServerError> {
    req.validate()?;
    let patch = AnswerPatch {
        variant_id: req.variant_id,
        answer_text: req.answer_text,
        is_correct: req.is_correct,
        distractor_type: req.distractor_type,
    };
    let answer = state
        .content
        .write()
        .await
        .update_answer(&id, patch)?
        .ok_or_else(|| ServerError::NotFound(format!("answer {id} not found")))?;
    Ok(Json(answer.to_response()))
}

#[utoipa::path(
    delete,
    path = "/v1/answers/{id}",
    tag = "answers",
    params(("id" = String, Path, description = "Answer ID")),
    responses(
        (status = 200, description = "Answer deleted", body = DeleteResponse),
        (status = 404, description = "Answer not found"),
    )
)]
pub async fn delete_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let summary = state.content.write().await.delete_answer(&id);
    if summary.is_empty() {
        return Err(ServerError::NotFound(format!("answer {id} not found")));
    }
    Ok(Json(summary.to_response()))
}

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn bulk_create_under_variant() {
        let (app, _) = app();
        let req = json!({
            "variant_id": "var-lin-003",
            "answers": [
                { "answer_text": "x = 3", "is_correct": true },
                { "answer_text": "x = 5", "distractor_type": "calculation_error" },
                { "answer_text": "x = 4.33", "distractor_type": "misread" },
            ],
        });
        let (status, body) = send(&app, Method::POST, "/v1/answers/bulk", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["is_correct"], true);
        assert_eq!(body[1]["is_correct"], false);

        let (_, list) = send(&app, Method::GET, "/v1/answers?variant_id=var-lin-003", None).await;
        assert_eq!(list.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn bulk_create_is_all_or_nothing() {
        let (app, _) = app();
        let req = json!({
            "variant_id": "var-lin-003",
            "answers": [
                { "answer_text": "x = 3", "is_correct": true },
                { "answer_text": "" },
            ],
        });
        let (status, _) = send(&app, Method::POST, "/v1/answers/bulk", Some(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&app, Method::GET, "/v1/answers?variant_id=var-lin-003", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_create_for_missing_variant_is_404() {
        let (app, _) = app();
        let req = json!({
            "variant_id": "var-gone",
            "answers": [{ "answer_text": "42" }],
        });
        let (status, _) = send(&app, Method::POST, "/v1/answers/bulk", Some(req)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_update_delete_single_answer() {
        let (app, _) = app();
        let req = json!({ "variant_id": "var-term-002", "answer_text": "24ab", "is_correct": true });
        let (status, created) = send(&app, Method::POST, "/v1/answers", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/v1/answers/{}", created["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "is_correct": false, "distractor_type": "sign_error" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_correct"], false);
        assert_eq!(body["distractor_type"], "sign_error");
        assert_eq!(body["answer_text"], "24ab");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answers"], 1);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

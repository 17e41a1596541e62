pub mod answers;
pub mod clusters;
pub mod content;
pub mod subjects;
pub mod tasks;
pub mod variants;

use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;

use crate::state::AppState;

/// Routes nested under `/v1`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(subjects::router())
        .merge(clusters::router())
        .merge(variants::router())
        .merge(answers::router())
        .merge(content::router())
        .merge(tasks::router())
}

#[derive(OpenApi)]
#[openapi()]
pub struct V1Api;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut docs = V1Api::openapi();
    docs.merge(subjects::SubjectsApi::openapi());
    docs.merge(clusters::ClustersApi::openapi());
    docs.merge(variants::VariantsApi::openapi());
    docs.merge(answers::AnswersApi::openapi());
    docs.merge(content::ContentApi::openapi());
    docs.merge(tasks::TasksApi::openapi());
    docs
}

//! Generation task endpoints.
//!
//! Operator actions that do not apply in the task's current state (cancelling
//! a finished task, accepting a failed one) answer 400 and leave the task as
//! it was.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mindforge_core::tasks::{NewTask, StatusFilter, TaskPayload, TaskType, Transition};
use mindforge_core::ContentKind;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::v1::ToResponse;
use crate::schemas::v1::task::{
    ContentLogResponse, CreateTaskRequest, RevertResponse, StatusFilterBody, TaskListQuery,
    TaskListResponse, TaskResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_tasks,
        create_task,
        get_task,
        cancel_task,
        retry_task,
        accept_task,
        revert_task,
        get_filter,
        set_filter,
        list_visible_tasks
    ),
    components(schemas(
        TaskResponse,
        ContentLogResponse,
        TaskListResponse,
        CreateTaskRequest,
        RevertResponse,
        StatusFilterBody
    ))
)]
pub struct TasksApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/filter", get(get_filter).put(set_filter))
        .route("/tasks/visible", get(list_visible_tasks))
        .route("/tasks/{id}", get(get_task))
        .route("/tasks/{id}/cancel", post(cancel_task))
        .route("/tasks/{id}/retry", post(retry_task))
        .route("/tasks/{id}/accept", post(accept_task))
        .route("/tasks/{id}/revert", post(revert_task))
}

/// Turn a no-op transition into a 400 naming the task's status.
fn applied(transition: Transition, action: &str) -> Result<TaskResponse, ServerError> {
    match transition {
        Transition::Applied(task) => Ok(task.to_response()),
        Transition::Unchanged(task) => Err(ServerError::BadRequest(format!(
            "task {} cannot be {action} while {}",
            task.id, task.status
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/v1/tasks",
    tag = "tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "One page of tasks, most recent first", body = TaskListResponse),
        (status = 400, description = "Unknown status or type, or limit out of range"),
    )
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TaskListQuery>,
) -> Result<Json<TaskListResponse>, ServerError> {
    q.validate()?;
    let query = q.to_query().map_err(ServerError::BadRequest)?;
    let store = state.tasks.store().read().await;
    let (page, total) = store.list_tasks(&query);
    Ok(Json(TaskListResponse {
        tasks: page.into_iter().map(|t| t.to_response()).collect(),
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task queued", body = TaskResponse),
        (status = 400, description = "Unknown task type, invalid payload or size out of range"),
        (status = 404, description = "Target entity not found"),
    )
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ServerError> {
    req.validate()?;
    let task_type: TaskType = req
        .task_type
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("unknown task type '{}'", req.task_type)))?;
    let payload = TaskPayload::from_parts(task_type, req.payload)?;

    let target = payload.target_id();
    let content = state.content.read().await;
    let (parent, exists) = match task_type {
        TaskType::GenerateClusters => (ContentKind::Subject, content.get_subject_by_id(target).is_some()),
        TaskType::GenerateVariants => (ContentKind::Cluster, content.get_cluster_by_id(target).is_some()),
        TaskType::RegenerateAnswers => (ContentKind::Variant, content.get_variant_by_id(target).is_some()),
    };
    drop(content);
    if !exists {
        return Err(ServerError::NotFound(format!("{parent} {target} not found")));
    }

    let task = state
        .tasks
        .create_task(NewTask {
            payload,
            user_context: req.user_context,
            delayed_until: req.delayed_until,
        })
        .await?;
    info!(task_id = %task.id, %task_type, "task queued via api");
    Ok((StatusCode::CREATED, Json(task.to_response())))
}

#[utoipa::path(
    get,
    path = "/v1/tasks/{id}",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task with its content log", body = TaskResponse),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServerError> {
    let store = state.tasks.store().read().await;
    let task = store
        .get_task_by_id(&id)
        .ok_or_else(|| ServerError::NotFound(format!("task {id} not found")))?;
    Ok(Json(task.to_response().with_log(store.content_log_for(&id))))
}

#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/cancel",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task cancelled", body = TaskResponse),
        (status = 400, description = "Task already finished"),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServerError> {
    let transition = state.tasks.cancel_task(&id).await?;
    Ok(Json(applied(transition, "cancelled")?))
}

#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/retry",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task queued again", body = TaskResponse),
        (status = 400, description = "Task has not failed"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Retry limit reached"),
    )
)]
pub async fn retry_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServerError> {
    let transition = state.tasks.retry_task(&id).await?;
    Ok(Json(applied(transition, "retried")?))
}

#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/accept",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Result accepted", body = TaskResponse),
        (status = 400, description = "Task not completed or already reviewed"),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn accept_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServerError> {
    let transition = state.tasks.accept_task(&id).await?;
    Ok(Json(applied(transition, "accepted")?))
}

/// Mark the result as reverted and report the logged content per type.
#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/revert",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Result reverted", body = RevertResponse),
        (status = 400, description = "Task not completed or already reviewed"),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn revert_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RevertResponse>, ServerError> {
    let transition = state.tasks.revert_task(&id).await?;
    let task = applied(transition, "reverted")?;
    let reverted_count = state.tasks.store().read().await.reverted_counts(&id);
    Ok(Json(RevertResponse {
        id: task.id,
        status: task.status,
        reverted_at: task.reverted_at.unwrap_or_default(),
        reverted_count,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/tasks/filter",
    tag = "tasks",
    responses(
        (status = 200, description = "Current status filter", body = StatusFilterBody),
    )
)]
pub async fn get_filter(State(state): State<Arc<AppState>>) -> Json<StatusFilterBody> {
    let filter = state.tasks.store().read().await.filter_status();
    Json(StatusFilterBody {
        status: filter.to_string(),
    })
}

#[utoipa::path(
    put,
    path = "/v1/tasks/filter",
    tag = "tasks",
    request_body = StatusFilterBody,
    responses(
        (status = 200, description = "Status filter replaced", body = StatusFilterBody),
        (status = 400, description = "Unknown status"),
    )
)]
pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusFilterBody>,
) -> Result<Json<StatusFilterBody>, ServerError> {
    let filter: StatusFilter = body
        .status
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("unknown task status '{}'", body.status)))?;
    state.tasks.store().write().await.set_filter_status(filter);
    Ok(Json(StatusFilterBody {
        status: filter.to_string(),
    }))
}

/// Tasks passing the stored status filter, most recent first.
#[utoipa::path(
    get,
    path = "/v1/tasks/visible",
    tag = "tasks",
    responses(
        (status = 200, description = "Filtered tasks", body = [TaskResponse]),
    )
)]
pub async fn list_visible_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<TaskResponse>> {
    let store = state.tasks.store().read().await;
    Json(
        store
            .visible_tasks()
            .into_iter()
            .map(|t| t.to_response())
            .collect(),
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn create_queues_pending_task_first() {
        let (app, _) = app();
        let req = json!({
            "task_type": "generate_variants",
            "payload": { "cluster_id": "clust-inequ", "count": 4, "answers_per_variant": 4 },
            "user_context": "Mit Brüchen",
        });
        let (status, body) = send(&app, Method::POST, "/v1/tasks", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["task_type"], "generate_variants");
        assert_eq!(body["payload"]["count"], 4);
        assert_eq!(body["progress_total"], 100);
        assert_eq!(body["max_retries"], 3);

        let (_, list) = send(&app, Method::GET, "/v1/tasks", None).await;
        assert_eq!(list["total"], 5);
        assert_eq!(list["tasks"][0]["id"], body["id"]);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let (app, _) = app();
        let unknown = json!({ "task_type": "generate_poems", "payload": {} });
        let (status, _) = send(&app, Method::POST, "/v1/tasks", Some(unknown)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing_field = json!({ "task_type": "regenerate_answers", "payload": { "count": 4 } });
        let (status, _) = send(&app, Method::POST, "/v1/tasks", Some(missing_field)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let zero = json!({
            "task_type": "regenerate_answers",
            "payload": { "variant_id": "var-lin-001", "count": 0 },
        });
        let (status, _) = send(&app, Method::POST, "/v1/tasks", Some(zero)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let huge = json!({
            "task_type": "regenerate_answers",
            "payload": { "variant_id": "var-lin-001", "count": 4294967295u32 },
        });
        let (status, body) = send(&app, Method::POST, "/v1/tasks", Some(huge)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("count"));

        let no_answers = json!({
            "task_type": "generate_clusters",
            "payload": {
                "subject_id": "subj-math-9",
                "count": 3,
                "variants_per_cluster": 5,
                "answers_per_variant": 0,
            },
        });
        let (status, body) = send(&app, Method::POST, "/v1/tasks", Some(no_answers)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("answers_per_variant"));

        let (_, list) = send(&app, Method::GET, "/v1/tasks", None).await;
        assert_eq!(list["total"], 4);

        let no_target = json!({
            "task_type": "regenerate_answers",
            "payload": { "variant_id": "var-gone", "count": 4 },
        });
        let (status, body) = send(&app, Method::POST, "/v1/tasks", Some(no_target)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("var-gone"));
    }

    #[tokio::test]
    async fn get_includes_content_log() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/v1/tasks/task-demo-variants", None).await;
        assert_eq!(status, StatusCode::OK);
        let log = body["content_log"].as_array().unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log[0]["entity_type"], "variant");
        assert_eq!(log[0]["action"], "created");

        let (status, _) = send(&app, Method::GET, "/v1/tasks/task-nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let (app, _) = app();
        let (_, body) = send(&app, Method::GET, "/v1/tasks?status=completed", None).await;
        assert_eq!(body["total"], 2);

        let (_, body) = send(&app, Method::GET, "/v1/tasks?task_type=generate_variants&limit=1", None).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/v1/tasks?limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/v1/tasks?status=sleeping", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancel_only_applies_to_active_tasks() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::POST, "/v1/tasks/task-demo-cancelled/cancel", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("cancelled"));

        let req = json!({
            "task_type": "generate_clusters",
            "payload": {
                "subject_id": "subj-englisch-9",
                "count": 2,
                "variants_per_cluster": 3,
                "answers_per_variant": 4,
            },
        });
        let (_, created) = send(&app, Method::POST, "/v1/tasks", Some(req)).await;
        let uri = format!("/v1/tasks/{}/cancel", created["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");
    }

    #[tokio::test]
    async fn retry_requeues_failed_task() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::POST, "/v1/tasks/task-demo-answers/retry", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["retry_count"], 2);
        assert_eq!(body["progress_current"], 0);
        assert!(body["error_message"].is_null());

        let (status, _) = send(&app, Method::POST, "/v1/tasks/task-demo-variants/retry", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn accept_and_revert_are_exclusive() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::POST, "/v1/tasks/task-demo-clusters/revert", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/v1/tasks/task-demo-variants/revert", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["reverted_count"]["variants"], 5);
        assert!(!body["reverted_at"].as_str().unwrap().is_empty());

        let (status, _) = send(&app, Method::POST, "/v1/tasks/task-demo-variants/accept", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, "/v1/tasks/task-demo-answers/accept", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_filter_narrows_visible_tasks() {
        let (app, _) = app();
        let (_, body) = send(&app, Method::GET, "/v1/tasks/filter", None).await;
        assert_eq!(body["status"], "all");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/tasks/filter",
            Some(json!({ "status": "failed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failed");

        let (_, visible) = send(&app, Method::GET, "/v1/tasks/visible", None).await;
        let visible = visible.as_array().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0]["id"], "task-demo-answers");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/tasks/filter",
            Some(json!({ "status": "sleeping" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mindforge_core::tasks::{
    GenerationTask, MAX_LIST_LIMIT, TaskContentLog, TaskQuery, TaskStatus, TaskType,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::ToResponse;

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateTaskRequest {
    /// `generate_clusters`, `generate_variants` or `regenerate_answers`.
    pub task_type: String,
    /// Fields required by `task_type`.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    #[validate(length(max = 2000))]
    pub user_context: Option<String>,
    /// The task does not start before this instant.
    pub delayed_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[serde(default)]
pub struct TaskListQuery {
    /// Only tasks in this status.
    pub status: Option<String>,
    /// Only tasks of this type.
    pub task_type: Option<String>,
    /// Page size, 1-1000 (default 100).
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TaskListQuery {
    /// Parse into the core query, rejecting unknown status or type names.
    pub fn to_query(&self) -> Result<TaskQuery, String> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<TaskStatus>()
                    .map_err(|_| format!("unknown task status '{s}'"))
            })
            .transpose()?;
        let task_type = self
            .task_type
            .as_deref()
            .map(|t| {
                t.parse::<TaskType>()
                    .map_err(|_| format!("unknown task type '{t}'"))
            })
            .transpose()?;
        let defaults = TaskQuery::default();
        Ok(TaskQuery {
            status,
            task_type,
            limit: self.limit.unwrap_or(defaults.limit).min(MAX_LIST_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentLogResponse {
    pub id: String,
    pub task_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    #[schema(value_type = Option<Object>)]
    pub previous_data: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: String,
    pub task_type: String,
    pub status: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub user_context: Option<String>,
    pub created_at: String,
    pub delayed_until: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub progress_current: u8,
    pub progress_total: u8,
    pub progress_message: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub accepted_at: Option<String>,
    pub reverted_at: Option<String>,
    /// Content touched by the task. Empty in list views.
    pub content_log: Vec<ContentLogResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    /// Matching tasks across all pages.
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevertResponse {
    pub id: String,
    pub status: String,
    pub reverted_at: String,
    /// Logged entities per plural type, e.g. `{"clusters": 3}`.
    pub reverted_count: BTreeMap<String, usize>,
}

fn rfc3339(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(|t| t.to_rfc3339())
}

impl ToResponse for TaskContentLog {
    type Response = ContentLogResponse;

    fn to_response(&self) -> ContentLogResponse {
        ContentLogResponse {
            id: self.id.clone(),
            task_id: self.task_id.clone(),
            entity_type: self.entity_type.to_string(),
            entity_id: self.entity_id.clone(),
            action: self.action.to_string(),
            previous_data: self.previous_data.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl ToResponse for GenerationTask {
    type Response = TaskResponse;

    fn to_response(&self) -> TaskResponse {
        // The payload serializes tagged with its type; the wire format keeps
        // the two apart.
        let payload = serde_json::to_value(&self.payload)
            .ok()
            .and_then(|mut v| v.get_mut("payload").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null);

        TaskResponse {
            id: self.id.clone(),
            task_type: self.task_type().to_string(),
            status: self.status.to_string(),
            payload,
            user_context: self.user_context.clone(),
            created_at: self.created_at.to_rfc3339(),
            delayed_until: rfc3339(self.delayed_until),
            started_at: rfc3339(self.started_at),
            completed_at: rfc3339(self.completed_at),
            progress_current: self.progress_current,
            progress_total: self.progress_total,
            progress_message: self.progress_message.clone(),
            error_message: self.error_message.clone(),
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            accepted_at: rfc3339(self.accepted_at),
            reverted_at: rfc3339(self.reverted_at),
            content_log: Vec::new(),
        }
    }
}

impl TaskResponse {
    pub fn with_log<'a>(mut self, log: impl IntoIterator<Item = &'a TaskContentLog>) -> Self {
        self.content_log = log.into_iter().map(|e| e.to_response()).collect();
        self
    }
}

/// Status filter of the task list view: `all` or a single status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusFilterBody {
    pub status: String,
}

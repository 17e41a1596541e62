use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::content::ContentKind;
use crate::error::TaskError;

/// Upper bound of `progress_current`; every task reports progress out of 100.
pub const PROGRESS_TOTAL: u8 = 100;
/// Retries allowed after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Entities one task may ask for.
pub const COUNT_RANGE: RangeInclusive<u32> = 1..=20;
/// Answers one `regenerate_answers` task may ask for.
pub const ANSWER_COUNT_RANGE: RangeInclusive<u32> = 1..=6;
pub const VARIANTS_PER_CLUSTER_RANGE: RangeInclusive<u32> = 1..=20;
pub const ANSWERS_PER_VARIANT_RANGE: RangeInclusive<u32> = 2..=6;

pub const MESSAGE_STARTING: &str = "Starting generation...";
pub const MESSAGE_RETRYING: &str = "Retrying generation...";

/// Lifecycle status of a generation task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// `true` while the task can still be cancelled.
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskType {
    GenerateClusters,
    GenerateVariants,
    RegenerateAnswers,
}

impl TaskType {
    /// The kind of content this task type produces.
    pub fn produces(self) -> ContentKind {
        match self {
            TaskType::GenerateClusters => ContentKind::Cluster,
            TaskType::GenerateVariants => ContentKind::Variant,
            TaskType::RegenerateAnswers => ContentKind::Answer,
        }
    }
}

/// What a task should generate, keyed by its task type.
///
/// Serializes as `{"task_type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task_type", content = "payload", rename_all = "snake_case")]
pub enum TaskPayload {
    GenerateClusters {
        subject_id: String,
        count: u32,
        variants_per_cluster: u32,
        answers_per_variant: u32,
    },
    GenerateVariants {
        cluster_id: String,
        count: u32,
        answers_per_variant: u32,
    },
    RegenerateAnswers {
        variant_id: String,
        count: u32,
    },
}

impl TaskPayload {
    /// Decode an untyped payload for `task_type`.
    pub fn from_parts(task_type: TaskType, payload: serde_json::Value) -> Result<Self, TaskError> {
        let tagged = serde_json::json!({
            "task_type": task_type,
            "payload": payload,
        });
        let payload: Self =
            serde_json::from_value(tagged).map_err(|e| TaskError::InvalidPayload(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Check every size field against its allowed range.
    pub fn validate(&self) -> Result<(), TaskError> {
        match self {
            TaskPayload::GenerateClusters {
                count,
                variants_per_cluster,
                answers_per_variant,
                ..
            } => {
                check_range("count", *count, &COUNT_RANGE)?;
                check_range("variants_per_cluster", *variants_per_cluster, &VARIANTS_PER_CLUSTER_RANGE)?;
                check_range("answers_per_variant", *answers_per_variant, &ANSWERS_PER_VARIANT_RANGE)
            }
            TaskPayload::GenerateVariants {
                count,
                answers_per_variant,
                ..
            } => {
                check_range("count", *count, &COUNT_RANGE)?;
                check_range("answers_per_variant", *answers_per_variant, &ANSWERS_PER_VARIANT_RANGE)
            }
            TaskPayload::RegenerateAnswers { count, .. } => {
                check_range("count", *count, &ANSWER_COUNT_RANGE)
            }
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            TaskPayload::GenerateClusters { .. } => TaskType::GenerateClusters,
            TaskPayload::GenerateVariants { .. } => TaskType::GenerateVariants,
            TaskPayload::RegenerateAnswers { .. } => TaskType::RegenerateAnswers,
        }
    }

    /// Number of top-level entities the task asks for.
    pub fn count(&self) -> u32 {
        match self {
            TaskPayload::GenerateClusters { count, .. }
            | TaskPayload::GenerateVariants { count, .. }
            | TaskPayload::RegenerateAnswers { count, .. } => *count,
        }
    }

    /// The id of the entity the task generates content under.
    pub fn target_id(&self) -> &str {
        match self {
            TaskPayload::GenerateClusters { subject_id, .. } => subject_id,
            TaskPayload::GenerateVariants { cluster_id, .. } => cluster_id,
            TaskPayload::RegenerateAnswers { variant_id, .. } => variant_id,
        }
    }
}

fn check_range(field: &str, value: u32, range: &RangeInclusive<u32>) -> Result<(), TaskError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(TaskError::InvalidPayload(format!(
        "{field} must be between {} and {}, got {value}",
        range.start(),
        range.end()
    )))
}

/// A request to generate content, tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: String,
    #[serde(flatten)]
    pub payload: TaskPayload,
    pub status: TaskStatus,
    pub user_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The start is not scheduled before this instant.
    pub delayed_until: Option<DateTime<Utc>>,
    pub progress_current: u8,
    pub progress_total: u8,
    pub progress_message: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub accepted_at: Option<DateTime<Utc>>,
    pub reverted_at: Option<DateTime<Utc>>,
}

impl GenerationTask {
    pub fn task_type(&self) -> TaskType {
        self.payload.task_type()
    }

    /// `true` once an operator accepted or reverted the result.
    pub fn is_reviewed(&self) -> bool {
        self.accepted_at.is_some() || self.reverted_at.is_some()
    }

    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.max_retries
    }
}

/// Input for [`TaskStore::create_task`](super::TaskStore::create_task).
#[derive(Debug, Clone)]
pub struct NewTask {
    pub payload: TaskPayload,
    pub user_context: Option<String>,
    pub delayed_until: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(payload: TaskPayload) -> Self {
        Self {
            payload,
            user_context: None,
            delayed_until: None,
        }
    }
}

/// Result of an operator action or progress update.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The task changed; carries the updated record.
    Applied(GenerationTask),
    /// The trigger does not apply in the task's current state.
    Unchanged(GenerationTask),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn task(&self) -> &GenerationTask {
        match self {
            Transition::Applied(task) | Transition::Unchanged(task) => task,
        }
    }

    pub fn into_task(self) -> GenerationTask {
        match self {
            Transition::Applied(task) | Transition::Unchanged(task) => task,
        }
    }
}

/// A progress event from whatever executes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskUpdate {
    Started { message: String },
    Progress { current: u8, message: Option<String> },
    Completed,
    Failed { error: String },
}

/// Status filter for the task list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 1000;

/// Paged task listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    /// Clamped to `[1, MAX_LIST_LIMIT]`.
    pub limit: usize,
    pub offset: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            task_type: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl TaskQuery {
    fn matches(&self, task: &GenerationTask) -> bool {
        self.status.is_none_or(|s| s == task.status)
            && self.task_type.is_none_or(|t| t == task.task_type())
    }

    pub(crate) fn page<'a>(
        &self,
        tasks: impl Iterator<Item = &'a GenerationTask>,
    ) -> (Vec<&'a GenerationTask>, usize) {
        let limit = self.limit.clamp(1, MAX_LIST_LIMIT);
        let matching: Vec<_> = tasks.filter(|t| self.matches(t)).collect();
        let total = matching.len();
        let page = matching.into_iter().skip(self.offset).take(limit).collect();
        (page, total)
    }
}

// ── Content log ───────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentAction {
    Created,
    Updated,
    Deleted,
}

/// One audit entry: a task touched a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContentLog {
    pub id: String,
    pub task_id: String,
    pub entity_type: ContentKind,
    pub entity_id: String,
    pub action: ContentAction,
    pub previous_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Summary of one simulator tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub advanced: Vec<String>,
    pub completed: Vec<String>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.advanced.is_empty() && self.completed.is_empty()
    }
}

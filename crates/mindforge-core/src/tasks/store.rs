use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::content::ContentKind;
use crate::error::TaskError;

use super::types::*;

/// Progress added to every running task per tick.
pub const PROGRESS_STEP: u8 = 2;

/// Messages a running task reports between ticks.
pub const PROGRESS_MESSAGES: [&str; 4] = [
    "Generating content...",
    "Processing data...",
    "Creating variants...",
    "Checking quality...",
];

/// In-memory owner of generation tasks and their content log.
///
/// Tasks are kept most recent first.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: VecDeque<GenerationTask>,
    content_log: Vec<TaskContentLog>,
    filter_status: StatusFilter,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing tasks, given most recent first.
    pub fn from_tasks(tasks: Vec<GenerationTask>) -> Self {
        Self {
            tasks: tasks.into(),
            ..Default::default()
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn tasks(&self) -> impl Iterator<Item = &GenerationTask> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_task_by_id(&self, id: &str) -> Option<&GenerationTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter_status(&self) -> StatusFilter {
        self.filter_status
    }

    pub fn set_filter_status(&mut self, filter: StatusFilter) {
        self.filter_status = filter;
    }

    /// Tasks passing the current status filter, most recent first.
    pub fn visible_tasks(&self) -> Vec<&GenerationTask> {
        self.tasks
            .iter()
            .filter(|t| self.filter_status.matches(t.status))
            .collect()
    }

    /// One page of tasks matching `query` and the number of matches overall.
    pub fn list_tasks(&self, query: &TaskQuery) -> (Vec<&GenerationTask>, usize) {
        query.page(self.tasks.iter())
    }

    /// Tasks counted by status.
    pub fn count_by_status(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for task in &self.tasks {
            *counts.entry(task.status.to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut GenerationTask, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_owned()))
    }

    // ── Creation ─────────────────────────────────────────────────────────────

    /// Insert a new `pending` task at the front of the collection.
    pub fn create_task(&mut self, new: NewTask) -> GenerationTask {
        let task = GenerationTask {
            id: Uuid::new_v4().to_string(),
            payload: new.payload,
            status: TaskStatus::Pending,
            user_context: new.user_context,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            delayed_until: new.delayed_until,
            progress_current: 0,
            progress_total: PROGRESS_TOTAL,
            progress_message: None,
            error_message: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            accepted_at: None,
            reverted_at: None,
        };
        info!(task_id = %task.id, task_type = %task.task_type(), "task created");
        self.tasks.push_front(task.clone());
        task
    }

    // ── Operator actions ─────────────────────────────────────────────────────

    /// `pending`/`in_progress` → `cancelled`.
    pub fn cancel_task(&mut self, id: &str) -> Result<Transition, TaskError> {
        let task = self.find_mut(id)?;
        if !task.status.is_active() {
            return Ok(Transition::Unchanged(task.clone()));
        }
        task.status = TaskStatus::Cancelled;
        task.progress_message = None;
        info!(task_id = %id, "task cancelled");
        Ok(Transition::Applied(task.clone()))
    }

    /// `failed` → `pending`, counting the retry.
    ///
    /// Progress and run timestamps are reset so the next run starts clean.
    pub fn retry_task(&mut self, id: &str) -> Result<Transition, TaskError> {
        let task = self.find_mut(id)?;
        if task.status != TaskStatus::Failed {
            return Ok(Transition::Unchanged(task.clone()));
        }
        if task.retry_count >= task.max_retries {
            return Err(TaskError::RetryLimitReached {
                id: id.to_owned(),
                max_retries: task.max_retries,
            });
        }
        task.status = TaskStatus::Pending;
        task.retry_count += 1;
        task.error_message = None;
        task.delayed_until = None;
        task.started_at = None;
        task.completed_at = None;
        task.progress_current = 0;
        task.progress_message = None;
        info!(task_id = %id, attempt = task.retry_count, "task queued for retry");
        Ok(Transition::Applied(task.clone()))
    }

    /// Mark an unreviewed completed task as accepted.
    pub fn accept_task(&mut self, id: &str) -> Result<Transition, TaskError> {
        let task = self.find_mut(id)?;
        if task.status != TaskStatus::Completed || task.is_reviewed() {
            return Ok(Transition::Unchanged(task.clone()));
        }
        task.accepted_at = Some(Utc::now());
        info!(task_id = %id, "task accepted");
        Ok(Transition::Applied(task.clone()))
    }

    /// Mark an unreviewed completed task as reverted.
    pub fn revert_task(&mut self, id: &str) -> Result<Transition, TaskError> {
        let task = self.find_mut(id)?;
        if task.status != TaskStatus::Completed || task.is_reviewed() {
            return Ok(Transition::Unchanged(task.clone()));
        }
        task.reverted_at = Some(Utc::now());
        info!(task_id = %id, "task reverted");
        Ok(Transition::Applied(task.clone()))
    }

    /// `in_progress` → `failed` with `error`.
    pub fn fail_task(&mut self, id: &str, error: impl Into<String>) -> Result<Transition, TaskError> {
        self.on_task_progress(
            id,
            TaskUpdate::Failed {
                error: error.into(),
            },
        )
    }

    // ── Progress ─────────────────────────────────────────────────────────────

    /// Apply a progress event from whatever executes the task.
    ///
    /// `Started` only applies to a `pending` task; the other updates only to
    /// an `in_progress` one. Progress never moves backwards and reaching
    /// [`PROGRESS_TOTAL`] completes the task.
    pub fn on_task_progress(&mut self, id: &str, update: TaskUpdate) -> Result<Transition, TaskError> {
        let task = self.find_mut(id)?;
        let applies = match update {
            TaskUpdate::Started { .. } => task.status == TaskStatus::Pending,
            _ => task.status == TaskStatus::InProgress,
        };
        if !applies {
            debug!(task_id = %id, status = %task.status, ?update, "progress update ignored");
            return Ok(Transition::Unchanged(task.clone()));
        }

        match update {
            TaskUpdate::Started { message } => {
                task.status = TaskStatus::InProgress;
                task.started_at = Some(Utc::now());
                task.progress_message = Some(message);
                info!(task_id = %id, "task started");
            }
            TaskUpdate::Progress { current, message } => {
                let current = current.min(PROGRESS_TOTAL).max(task.progress_current);
                if current >= PROGRESS_TOTAL {
                    complete(task);
                } else {
                    task.progress_current = current;
                    task.progress_message = message;
                }
            }
            TaskUpdate::Completed => complete(task),
            TaskUpdate::Failed { error } => {
                warn!(task_id = %id, %error, "task failed");
                task.status = TaskStatus::Failed;
                task.error_message = Some(error);
                task.progress_message = None;
            }
        }
        Ok(Transition::Applied(task.clone()))
    }

    /// Advance every running task by one simulator step.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickReport {
        let mut report = TickReport::default();
        let running: Vec<(String, u8)> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| (t.id.clone(), t.progress_current))
            .collect();

        for (id, current) in running {
            let message = PROGRESS_MESSAGES.choose(rng).map(|m| m.to_string());
            let update = TaskUpdate::Progress {
                current: current.saturating_add(PROGRESS_STEP),
                message,
            };
            match self.on_task_progress(&id, update) {
                Ok(Transition::Applied(task)) if task.status == TaskStatus::Completed => {
                    report.completed.push(id)
                }
                Ok(Transition::Applied(_)) => report.advanced.push(id),
                _ => {}
            }
        }
        report
    }

    /// The instant a scheduled start for `id` may apply, if the task is pending.
    pub fn start_not_before(&self, id: &str) -> Option<Option<DateTime<Utc>>> {
        self.get_task_by_id(id)
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.delayed_until)
    }

    // ── Content log ──────────────────────────────────────────────────────────

    pub fn log_content(
        &mut self,
        task_id: &str,
        entity_type: ContentKind,
        entity_id: impl Into<String>,
        action: ContentAction,
        previous_data: Option<serde_json::Value>,
    ) -> Result<TaskContentLog, TaskError> {
        if self.get_task_by_id(task_id).is_none() {
            return Err(TaskError::NotFound(task_id.to_owned()));
        }
        let entry = TaskContentLog {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_owned(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            previous_data,
            created_at: Utc::now(),
        };
        debug!(task_id, entity_id = %entry.entity_id, %action, "content logged");
        self.content_log.push(entry.clone());
        Ok(entry)
    }

    /// Log entries of one task in append order.
    pub fn content_log_for(&self, task_id: &str) -> Vec<&TaskContentLog> {
        self.content_log
            .iter()
            .filter(|e| e.task_id == task_id)
            .collect()
    }

    /// Logged entities of one task, counted per plural entity type.
    pub fn reverted_counts(&self, task_id: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.content_log_for(task_id) {
            *counts
                .entry(entry.entity_type.plural().to_owned())
                .or_insert(0) += 1;
        }
        counts
    }
}

fn complete(task: &mut GenerationTask) {
    task.status = TaskStatus::Completed;
    task.progress_current = PROGRESS_TOTAL;
    task.progress_message = None;
    task.completed_at = Some(Utc::now());
    info!(task_id = %task.id, "task completed");
}

//! Background progress simulator.
//!
//! Stands in for the external content-generation service: a single periodic
//! tick advances every running task and scheduled one-shot starts move
//! pending tasks to `in_progress`. Both go through
//! [`TaskStore::on_task_progress`], the same entry point a real executor
//! would drive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::TaskError;

use super::store::TaskStore;
use super::types::*;

/// Timing of the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Delay between creating (or retrying) a task and its start.
    pub start_delay: Duration,
    pub tick_interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(1000),
            tick_interval: Duration::from_millis(2000),
        }
    }
}

/// Shared handle to the task store plus the simulator driving it.
///
/// Cheap to clone; every clone talks to the same store and loop.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    store: Arc<RwLock<TaskStore>>,
    config: SimulatorConfig,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl TaskRunner {
    pub fn new(store: TaskStore, config: SimulatorConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store: Arc::new(RwLock::new(store)),
            config,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    /// The underlying store, for reads.
    pub fn store(&self) -> &Arc<RwLock<TaskStore>> {
        &self.store
    }

    /// Spawn the tick loop.
    pub fn start(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let interval = self.config.tick_interval;
        let shutdown_rx = self.shutdown_tx.subscribe();
        info!(tick_ms = interval.as_millis() as u64, "task simulator started");
        tokio::spawn(run_loop(store, interval, shutdown_rx))
    }

    /// Stop the tick loop and every scheduled start.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    // ── Operations ───────────────────────────────────────────────────────────

    /// Create a task and schedule its start.
    ///
    /// The payload is checked first; an out-of-range size never reaches the
    /// store.
    pub async fn create_task(&self, new: NewTask) -> Result<GenerationTask, TaskError> {
        new.payload.validate()?;
        let task = self.store.write().await.create_task(new);
        self.schedule_start(task.id.clone(), MESSAGE_STARTING);
        Ok(task)
    }

    /// Queue a failed task again and schedule its restart.
    pub async fn retry_task(&self, id: &str) -> Result<Transition, TaskError> {
        let transition = self.store.write().await.retry_task(id)?;
        if transition.is_applied() {
            self.schedule_start(id.to_owned(), MESSAGE_RETRYING);
        }
        Ok(transition)
    }

    pub async fn cancel_task(&self, id: &str) -> Result<Transition, TaskError> {
        self.store.write().await.cancel_task(id)
    }

    pub async fn accept_task(&self, id: &str) -> Result<Transition, TaskError> {
        self.store.write().await.accept_task(id)
    }

    pub async fn revert_task(&self, id: &str) -> Result<Transition, TaskError> {
        self.store.write().await.revert_task(id)
    }

    pub async fn fail_task(&self, id: &str, error: impl Into<String>) -> Result<Transition, TaskError> {
        self.store.write().await.fail_task(id, error)
    }

    /// Start `id` after the configured delay, or at its `delayed_until` if
    /// that is later. Applies only if the task is still pending by then.
    fn schedule_start(&self, id: String, message: &'static str) {
        let store = self.store.clone();
        let start_delay = self.config.start_delay;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let delayed_until = match store.read().await.start_not_before(&id) {
                Some(delayed_until) => delayed_until,
                None => return,
            };
            let until_delay = delayed_until
                .and_then(|at| (at - Utc::now()).to_std().ok())
                .unwrap_or_default();
            let wait = start_delay.max(until_delay);

            if *shutdown_rx.borrow() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown_rx.changed() => return,
            }

            let update = TaskUpdate::Started {
                message: message.to_owned(),
            };
            match store.write().await.on_task_progress(&id, update) {
                Ok(Transition::Applied(_)) => {}
                Ok(Transition::Unchanged(task)) => {
                    debug!(task_id = %id, status = %task.status, "scheduled start skipped")
                }
                Err(e) => warn!(task_id = %id, error = %e, "scheduled start failed"),
            }
        });
    }
}

async fn run_loop(
    store: Arc<RwLock<TaskStore>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        let mut guard = store.write().await;
        let report = guard.tick(&mut rng);
        for id in &report.completed {
            record_artifacts(&mut guard, id);
        }
        drop(guard);
        if !report.is_empty() {
            debug!(
                advanced = report.advanced.len(),
                completed = report.completed.len(),
                "simulator tick"
            );
        }
    }
    info!("task simulator stopped");
}

/// Log the content a completed task would have produced.
///
/// Entity ids are placeholders derived from the task id; nothing is written
/// to the content store.
fn record_artifacts(store: &mut TaskStore, task_id: &str) {
    let Some(task) = store.get_task_by_id(task_id) else {
        return;
    };
    let kind = task.task_type().produces();
    let count = task.payload.count();
    let prefix: String = task_id.chars().take(8).collect();

    for i in 0..count {
        let entity_id = format!("sim-{prefix}-{i:03}");
        if let Err(e) = store.log_content(task_id, kind, entity_id, ContentAction::Created, None) {
            warn!(task_id, error = %e, "failed to log generated content");
            return;
        }
    }
}

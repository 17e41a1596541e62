//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use chrono::Utc;
use mindforge_core::{ContentStore, TaskRunner, TaskStore, seed};
use tokio::sync::RwLock;

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Subjects, clusters, variants and answers plus selection and filters.
    pub content: Arc<RwLock<ContentStore>>,
    /// Generation tasks and the simulator driving them.
    pub tasks: TaskRunner,
}

impl AppState {
    /// Construct both stores, seeded with demo data when configured.
    ///
    /// The simulator loop is not started here; see [`TaskRunner::start`].
    pub fn new(config: Config) -> Self {
        let (content, tasks) = if config.seed_demo {
            (seed::demo_content(), seed::demo_tasks(Utc::now()))
        } else {
            (ContentStore::new(), TaskStore::new())
        };
        let runner = TaskRunner::new(tasks, config.simulator());
        Self {
            config: Arc::new(config),
            content: Arc::new(RwLock::new(content)),
            tasks: runner,
        }
    }
}

//! Content and generation-task state for the MindForge admin backend.
//!
//! Two explicit stores make up the core:
//!
//! - [`ContentStore`] owns subjects, question clusters, variants and answers
//!   and keeps the hierarchy free of orphans.
//! - [`TaskStore`] owns generation tasks and drives their lifecycle state
//!   machine; [`TaskRunner`] wraps it with the background progress simulator.
//!
//! Both are plain values constructed once per process and handed to whatever
//! serves the views (see the `mindforge-server` binary).

pub mod content;
pub mod error;
pub mod seed;
pub mod tasks;
mod time;

pub use content::{ContentKind, ContentStore};
pub use error::{ContentError, TaskError};
pub use tasks::simulator::{SimulatorConfig, TaskRunner};
pub use tasks::{GenerationTask, TaskPayload, TaskStatus, TaskStore, TaskType, Transition};

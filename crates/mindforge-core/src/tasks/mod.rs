//! Generation tasks: lifecycle state machine, content log and the progress
//! simulator.

pub mod simulator;
mod store;
mod types;


pub use store::{PROGRESS_MESSAGES, PROGRESS_STEP, TaskStore};
pub use types::*;

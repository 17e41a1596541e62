//! The content hierarchy: subjects, question clusters, variants and answers.

mod store;
mod types;
mod view;

#[cfg(test)]
mod tests;

pub use store::ContentStore;
pub use types::*;
pub use view::{ContentFilters, ContentSelection, FiltersPatch, SelectedContent, SelectionState};

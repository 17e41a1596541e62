//! View state kept alongside the content: which entity is focused and which
//! filters narrow the subject list.
//!
//! Neither is enforced by the store. Consumers resolve the selection and apply
//! the filters when they render.

use serde::{Deserialize, Serialize};

use super::types::{ContentKind, QuestionCluster, QuestionVariant, Subject};

/// The entity currently focused by an operator.
///
/// Ids are carried as given; they may point at entities deleted since the
/// selection was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSelection {
    pub kind: Option<ContentKind>,
    pub subject_id: Option<String>,
    pub cluster_id: Option<String>,
    pub variant_id: Option<String>,
}

impl ContentSelection {
    pub fn subject(id: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentKind::Subject),
            subject_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn cluster(subject_id: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentKind::Cluster),
            subject_id: Some(subject_id.into()),
            cluster_id: Some(cluster_id.into()),
            ..Default::default()
        }
    }

    pub fn variant(
        subject_id: impl Into<String>,
        cluster_id: impl Into<String>,
        variant_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: Some(ContentKind::Variant),
            subject_id: Some(subject_id.into()),
            cluster_id: Some(cluster_id.into()),
            variant_id: Some(variant_id.into()),
        }
    }

    /// The kind and id the selection points at.
    ///
    /// An answer selection focuses the variant that owns the answers.
    pub(crate) fn target(&self) -> Option<(ContentKind, &str)> {
        let kind = self.kind?;
        let id = match kind {
            ContentKind::Subject => self.subject_id.as_deref(),
            ContentKind::Cluster => self.cluster_id.as_deref(),
            ContentKind::Variant | ContentKind::Answer => self.variant_id.as_deref(),
        }?;
        Some((kind, id))
    }
}

/// The entity a selection resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedContent<'a> {
    Subject(&'a Subject),
    Cluster(&'a QuestionCluster),
    Variant(&'a QuestionVariant),
}

/// Outcome of resolving the current selection against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState<'a> {
    /// Nothing is selected.
    Empty,
    Resolved(SelectedContent<'a>),
    /// The selection names an entity that no longer exists.
    Dangling { kind: ContentKind, id: String },
}

/// Filters applied to the subject list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFilters {
    /// Case-insensitive substring matched against the subject name.
    pub search: String,
    /// Generation task the operator is reviewing. Carried, not applied.
    pub task_id: Option<String>,
    pub subject_id: Option<String>,
}

impl ContentFilters {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.task_id.is_some() || self.subject_id.is_some()
    }

    pub fn matches_subject(&self, subject: &Subject) -> bool {
        if let Some(wanted) = &self.subject_id {
            if &subject.id != wanted {
                return false;
            }
        }
        if self.search.is_empty() {
            return true;
        }
        subject
            .name
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    /// Merge `patch` into these filters.
    pub fn apply(&mut self, patch: FiltersPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(task_id) = patch.task_id {
            self.task_id = task_id;
        }
        if let Some(subject_id) = patch.subject_id {
            self.subject_id = subject_id;
        }
    }
}

/// Partial filter update. The outer `Option` on the nullable fields tells
/// "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltersPatch {
    pub search: Option<String>,
    pub task_id: Option<Option<String>>,
    pub subject_id: Option<Option<String>>,
}

impl FiltersPatch {
    /// A patch that resets every filter.
    pub fn clear() -> Self {
        Self {
            search: Some(String::new()),
            task_id: Some(None),
            subject_id: Some(None),
        }
    }
}

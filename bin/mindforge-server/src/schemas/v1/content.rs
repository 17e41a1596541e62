use mindforge_core::content::{
    Answer, AnswerOption, ContentFilters, ContentSelection, ContentStats, DeleteSummary,
    FiltersPatch, QuestionCluster, QuestionVariant, QuestionWithAnswers, SelectedContent,
    SelectionState, Subject,
};
use mindforge_core::ContentKind;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::ToResponse;

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubjectResponse {
    pub id: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClusterResponse {
    pub id: String,
    pub subject_id: String,
    pub topic: String,
    pub canonical_template: Option<String>,
    pub difficulty_baseline: u8,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantResponse {
    pub id: String,
    pub cluster_id: String,
    pub question_text: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    pub id: String,
    pub variant_id: String,
    pub answer_text: String,
    pub is_correct: bool,
    pub distractor_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Entities removed by a delete, per kind.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub subjects: usize,
    pub clusters: usize,
    pub variants: usize,
    pub answers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub subjects: usize,
    pub clusters: usize,
    pub variants: usize,
    pub answers: usize,
    /// Task counts keyed by status.
    pub tasks: std::collections::BTreeMap<String, usize>,
}

/// A variant bundled with its answers and the cluster and subject above it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionWithAnswersResponse {
    pub variant: VariantResponse,
    pub answers: Vec<AnswerResponse>,
    pub cluster: Option<ClusterResponse>,
    pub subject: Option<SubjectResponse>,
}

impl ToResponse for Subject {
    type Response = SubjectResponse;

    fn to_response(&self) -> SubjectResponse {
        SubjectResponse {
            id: self.id.clone(),
            key: self.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ToResponse for QuestionCluster {
    type Response = ClusterResponse;

    fn to_response(&self) -> ClusterResponse {
        ClusterResponse {
            id: self.id.clone(),
            subject_id: self.subject_id.clone(),
            topic: self.topic.clone(),
            canonical_template: self.canonical_template.clone(),
            difficulty_baseline: self.difficulty_baseline,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ToResponse for QuestionVariant {
    type Response = VariantResponse;

    fn to_response(&self) -> VariantResponse {
        VariantResponse {
            id: self.id.clone(),
            cluster_id: self.cluster_id.clone(),
            question_text: self.question_text.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ToResponse for Answer {
    type Response = AnswerResponse;

    fn to_response(&self) -> AnswerResponse {
        AnswerResponse {
            id: self.id.clone(),
            variant_id: self.variant_id.clone(),
            answer_text: self.answer_text.clone(),
            is_correct: self.is_correct,
            distractor_type: self.distractor_type.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ToResponse for QuestionWithAnswers {
    type Response = QuestionWithAnswersResponse;

    fn to_response(&self) -> QuestionWithAnswersResponse {
        QuestionWithAnswersResponse {
            variant: self.variant.to_response(),
            answers: self.answers.iter().map(|a| a.to_response()).collect(),
            cluster: self.cluster.as_ref().map(|c| c.to_response()),
            subject: self.subject.as_ref().map(|s| s.to_response()),
        }
    }
}

impl ToResponse for DeleteSummary {
    type Response = DeleteResponse;

    fn to_response(&self) -> DeleteResponse {
        DeleteResponse {
            subjects: self.subjects,
            clusters: self.clusters,
            variants: self.variants,
            answers: self.answers,
        }
    }
}

impl StatsResponse {
    pub fn new(stats: ContentStats, tasks: std::collections::BTreeMap<String, usize>) -> Self {
        Self {
            subjects: stats.subjects,
            clusters: stats.clusters,
            variants: stats.variants,
            answers: stats.answers,
            tasks,
        }
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub key: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub key: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateClusterRequest {
    #[validate(length(min = 1))]
    pub subject_id: String,
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    pub canonical_template: Option<String>,
    /// Clamped to 1-10; defaults to 5.
    pub difficulty_baseline: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct UpdateClusterRequest {
    #[validate(length(min = 1))]
    pub subject_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub topic: Option<String>,
    pub canonical_template: Option<String>,
    pub difficulty_baseline: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1))]
    pub cluster_id: String,
    #[validate(length(min = 1))]
    pub question_text: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct UpdateVariantRequest {
    #[validate(length(min = 1))]
    pub cluster_id: Option<String>,
    #[validate(length(min = 1))]
    pub question_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1))]
    pub variant_id: String,
    #[validate(length(min = 1))]
    pub answer_text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub distractor_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnswerOptionRequest {
    #[validate(length(min = 1))]
    pub answer_text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub distractor_type: Option<String>,
}

impl From<AnswerOptionRequest> for AnswerOption {
    fn from(req: AnswerOptionRequest) -> Self {
        AnswerOption {
            answer_text: req.answer_text,
            is_correct: req.is_correct,
            distractor_type: req.distractor_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct BulkAnswersRequest {
    #[validate(length(min = 1))]
    pub variant_id: String,
    #[validate(length(min = 1, max = 20), nested)]
    pub answers: Vec<AnswerOptionRequest>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1))]
    pub variant_id: Option<String>,
    #[validate(length(min = 1))]
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
    pub distractor_type: Option<String>,
}

// ── List queries ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(default)]
pub struct SubjectQuery {
    /// Case-insensitive substring of the subject name.
    pub search: Option<String>,
    pub subject_id: Option<String>,
}

impl SubjectQuery {
    pub fn to_filters(&self) -> ContentFilters {
        ContentFilters {
            search: self.search.clone().unwrap_or_default(),
            task_id: None,
            subject_id: self.subject_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(default)]
pub struct ClusterQuery {
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(default)]
pub struct VariantQuery {
    pub cluster_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(default)]
pub struct AnswerQuery {
    pub variant_id: Option<String>,
}

// ── Selection & filters ───────────────────────────────────────────────────────

/// The focused entity. Send `kind: null` (or `{}`) to clear the selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SelectionBody {
    /// `subject`, `cluster`, `variant` or `answer`.
    pub kind: Option<String>,
    pub subject_id: Option<String>,
    pub cluster_id: Option<String>,
    pub variant_id: Option<String>,
}

impl SelectionBody {
    /// Parse into the core selection. `Ok(None)` clears it.
    pub fn into_selection(self) -> Result<Option<ContentSelection>, String> {
        let Some(kind) = self.kind else {
            return Ok(None);
        };
        let kind: ContentKind = kind
            .parse()
            .map_err(|_| format!("unknown selection kind '{kind}'"))?;
        Ok(Some(ContentSelection {
            kind: Some(kind),
            subject_id: self.subject_id,
            cluster_id: self.cluster_id,
            variant_id: self.variant_id,
        }))
    }
}

impl ToResponse for ContentSelection {
    type Response = SelectionBody;

    fn to_response(&self) -> SelectionBody {
        SelectionBody {
            kind: self.kind.map(|k| k.to_string()),
            subject_id: self.subject_id.clone(),
            cluster_id: self.cluster_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectionResponse {
    /// `empty`, `resolved` or `not_found`.
    pub state: String,
    pub selection: Option<SelectionBody>,
    /// The resolved subject, cluster or variant.
    #[schema(value_type = Option<Object>)]
    pub entity: Option<serde_json::Value>,
}

impl SelectionResponse {
    pub fn new(selection: Option<&ContentSelection>, state: SelectionState<'_>) -> Self {
        let (state, entity) = match state {
            SelectionState::Empty => ("empty", None),
            SelectionState::Dangling { .. } => ("not_found", None),
            SelectionState::Resolved(entity) => {
                let value = match entity {
                    SelectedContent::Subject(s) => serde_json::to_value(s.to_response()),
                    SelectedContent::Cluster(c) => serde_json::to_value(c.to_response()),
                    SelectedContent::Variant(v) => serde_json::to_value(v.to_response()),
                };
                ("resolved", value.ok())
            }
        };
        Self {
            state: state.to_owned(),
            selection: selection.map(|s| s.to_response()),
            entity,
        }
    }
}

/// Partial filter update. A field set to `null` clears it; a missing field
/// is left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct FiltersRequest {
    pub search: Option<String>,
    #[serde(deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub task_id: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub subject_id: Option<Option<String>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<FiltersRequest> for FiltersPatch {
    fn from(req: FiltersRequest) -> Self {
        FiltersPatch {
            search: req.search,
            task_id: req.task_id,
            subject_id: req.subject_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FiltersResponse {
    pub search: String,
    pub task_id: Option<String>,
    pub subject_id: Option<String>,
}

impl ToResponse for ContentFilters {
    type Response = FiltersResponse;

    fn to_response(&self) -> FiltersResponse {
        FiltersResponse {
            search: self.search.clone(),
            task_id: self.task_id.clone(),
            subject_id: self.subject_id.clone(),
        }
    }
}

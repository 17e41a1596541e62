use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lowest allowed `difficulty_baseline`.
pub const DIFFICULTY_MIN: u8 = 1;
/// Highest allowed `difficulty_baseline`.
pub const DIFFICULTY_MAX: u8 = 10;
/// Difficulty given to clusters created without one.
pub const DIFFICULTY_DEFAULT: u8 = 5;

/// Clamp an arbitrary integer into `[DIFFICULTY_MIN, DIFFICULTY_MAX]`.
pub fn clamp_difficulty(value: i64) -> u8 {
    value.clamp(DIFFICULTY_MIN as i64, DIFFICULTY_MAX as i64) as u8
}

/// The four levels of the content hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentKind {
    Subject,
    Cluster,
    Variant,
    Answer,
}

impl ContentKind {
    /// Plural form used as a count key in summaries (`"clusters"`).
    pub fn plural(self) -> &'static str {
        match self {
            ContentKind::Subject => "subjects",
            ContentKind::Cluster => "clusters",
            ContentKind::Variant => "variants",
            ContentKind::Answer => "answers",
        }
    }
}

/// A subject area, the root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    /// Stable external slug, unique across subjects.
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An abstract question type inside a subject ("solve a linear equation").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCluster {
    pub id: String,
    pub subject_id: String,
    pub topic: String,
    pub canonical_template: Option<String>,
    /// Always within `[DIFFICULTY_MIN, DIFFICULTY_MAX]`.
    pub difficulty_baseline: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A concrete question instance of a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionVariant {
    pub id: String,
    pub cluster_id: String,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One answer option of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub variant_id: String,
    pub answer_text: String,
    pub is_correct: bool,
    /// Category of a wrong answer ("sign_error"). Not checked against `is_correct`.
    pub distractor_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Creation inputs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NewSubject {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCluster {
    pub subject_id: String,
    pub topic: String,
    pub canonical_template: Option<String>,
    /// Clamped on insert; `None` means [`DIFFICULTY_DEFAULT`].
    pub difficulty_baseline: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewVariant {
    pub cluster_id: String,
    pub question_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewAnswer {
    pub variant_id: String,
    pub answer_text: String,
    pub is_correct: bool,
    pub distractor_type: Option<String>,
}

/// An answer option inside a bulk insert; the variant comes from the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerOption {
    pub answer_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub distractor_type: Option<String>,
}

// ── Partial updates ───────────────────────────────────────────────────────────
//
// `None` leaves a field untouched.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectPatch {
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterPatch {
    pub subject_id: Option<String>,
    pub topic: Option<String>,
    pub canonical_template: Option<String>,
    pub difficulty_baseline: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantPatch {
    pub cluster_id: Option<String>,
    pub question_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPatch {
    pub variant_id: Option<String>,
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
    pub distractor_type: Option<String>,
}

// ── Results ───────────────────────────────────────────────────────────────────

/// How many entities of each kind a delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub subjects: usize,
    pub clusters: usize,
    pub variants: usize,
    pub answers: usize,
}

impl DeleteSummary {
    /// `true` when the delete matched nothing.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.subjects + self.clusters + self.variants + self.answers
    }
}

/// A variant with its answer options and the entities above it.
///
/// `cluster` and `subject` are `None` only when the hierarchy above the
/// variant is broken, which the store's cascades rule out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionWithAnswers {
    pub variant: QuestionVariant,
    pub answers: Vec<Answer>,
    pub cluster: Option<QuestionCluster>,
    pub subject: Option<Subject>,
}

/// Entity counts across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub subjects: usize,
    pub clusters: usize,
    pub variants: usize,
    pub answers: usize,
}

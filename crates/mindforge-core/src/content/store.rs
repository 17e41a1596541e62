use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ContentError;
use crate::time::touch;

use super::types::*;
use super::view::{ContentFilters, ContentSelection, FiltersPatch, SelectedContent, SelectionState};

/// In-memory owner of the content hierarchy.
///
/// Collections keep insertion order. Every write keeps the hierarchy free of
/// orphans: creates and reparenting updates check the parent, deletes cascade
/// through every level below the removed entity.
#[derive(Debug, Default)]
pub struct ContentStore {
    subjects: Vec<Subject>,
    clusters: Vec<QuestionCluster>,
    variants: Vec<QuestionVariant>,
    answers: Vec<Answer>,
    selection: Option<ContentSelection>,
    filters: ContentFilters,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn require_text(field: &'static str, value: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        return Err(ContentError::EmptyField { field });
    }
    Ok(())
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-consistent collections.
    ///
    /// Entities whose parent is missing are dropped so the store starts
    /// orphan-free.
    pub fn from_parts(
        subjects: Vec<Subject>,
        clusters: Vec<QuestionCluster>,
        variants: Vec<QuestionVariant>,
        answers: Vec<Answer>,
    ) -> Self {
        let mut store = Self {
            subjects,
            ..Default::default()
        };
        store.clusters = clusters
            .into_iter()
            .filter(|c| store.get_subject_by_id(&c.subject_id).is_some())
            .collect();
        store.variants = variants
            .into_iter()
            .filter(|v| store.get_cluster_by_id(&v.cluster_id).is_some())
            .collect();
        store.answers = answers
            .into_iter()
            .filter(|a| store.get_variant_by_id(&a.variant_id).is_some())
            .collect();
        store
    }

    // ── Listings ─────────────────────────────────────────────────────────────

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn clusters(&self) -> &[QuestionCluster] {
        &self.clusters
    }

    pub fn variants(&self) -> &[QuestionVariant] {
        &self.variants
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn stats(&self) -> ContentStats {
        ContentStats {
            subjects: self.subjects.len(),
            clusters: self.clusters.len(),
            variants: self.variants.len(),
            answers: self.answers.len(),
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    pub fn get_subject_by_id(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn get_subject_by_key(&self, key: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.key == key)
    }

    pub fn get_cluster_by_id(&self, id: &str) -> Option<&QuestionCluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    pub fn get_variant_by_id(&self, id: &str) -> Option<&QuestionVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn get_answer_by_id(&self, id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == id)
    }

    pub fn get_clusters_by_subject(&self, subject_id: &str) -> Vec<&QuestionCluster> {
        self.clusters
            .iter()
            .filter(|c| c.subject_id == subject_id)
            .collect()
    }

    pub fn get_variants_by_cluster(&self, cluster_id: &str) -> Vec<&QuestionVariant> {
        self.variants
            .iter()
            .filter(|v| v.cluster_id == cluster_id)
            .collect()
    }

    pub fn get_answers_by_variant(&self, variant_id: &str) -> Vec<&Answer> {
        self.answers
            .iter()
            .filter(|a| a.variant_id == variant_id)
            .collect()
    }

    /// The variant with its answers, cluster and subject.
    pub fn get_question_with_answers(&self, variant_id: &str) -> Option<QuestionWithAnswers> {
        let variant = self.get_variant_by_id(variant_id)?;
        let cluster = self.get_cluster_by_id(&variant.cluster_id);
        let subject = cluster.and_then(|c| self.get_subject_by_id(&c.subject_id));
        Some(QuestionWithAnswers {
            variant: variant.clone(),
            answers: self
                .get_answers_by_variant(variant_id)
                .into_iter()
                .cloned()
                .collect(),
            cluster: cluster.cloned(),
            subject: subject.cloned(),
        })
    }

    /// Pick one variant uniformly from all clusters of the subject with `key`.
    ///
    /// `None` when the key is unknown or the subject has no variants yet.
    pub fn get_random_question_for_subject<R: Rng + ?Sized>(
        &self,
        key: &str,
        rng: &mut R,
    ) -> Option<QuestionWithAnswers> {
        let subject = self.get_subject_by_key(key)?;
        let candidates: Vec<&QuestionVariant> = self
            .variants
            .iter()
            .filter(|v| {
                self.get_cluster_by_id(&v.cluster_id)
                    .is_some_and(|c| c.subject_id == subject.id)
            })
            .collect();
        let variant = candidates.choose(rng)?;
        debug!(subject = %subject.key, variant_id = %variant.id, "random question picked");
        self.get_question_with_answers(&variant.id)
    }

    fn require_subject(&self, id: &str) -> Result<(), ContentError> {
        match self.get_subject_by_id(id) {
            Some(_) => Ok(()),
            None => Err(ContentError::MissingParent {
                kind: ContentKind::Subject,
                id: id.to_owned(),
            }),
        }
    }

    fn require_cluster(&self, id: &str) -> Result<(), ContentError> {
        match self.get_cluster_by_id(id) {
            Some(_) => Ok(()),
            None => Err(ContentError::MissingParent {
                kind: ContentKind::Cluster,
                id: id.to_owned(),
            }),
        }
    }

    fn require_variant(&self, id: &str) -> Result<(), ContentError> {
        match self.get_variant_by_id(id) {
            Some(_) => Ok(()),
            None => Err(ContentError::MissingParent {
                kind: ContentKind::Variant,
                id: id.to_owned(),
            }),
        }
    }

    fn key_taken(&self, key: &str, except_id: Option<&str>) -> bool {
        self.subjects
            .iter()
            .any(|s| s.key == key && Some(s.id.as_str()) != except_id)
    }

    // ── Creates ──────────────────────────────────────────────────────────────

    pub fn create_subject(&mut self, new: NewSubject) -> Result<Subject, ContentError> {
        require_text("key", &new.key)?;
        require_text("name", &new.name)?;
        if self.key_taken(&new.key, None) {
            return Err(ContentError::DuplicateKey(new.key));
        }
        let now = Utc::now();
        let subject = Subject {
            id: new_id(),
            key: new.key,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        info!(subject_id = %subject.id, key = %subject.key, "subject created");
        self.subjects.push(subject.clone());
        Ok(subject)
    }

    pub fn create_cluster(&mut self, new: NewCluster) -> Result<QuestionCluster, ContentError> {
        require_text("topic", &new.topic)?;
        self.require_subject(&new.subject_id)?;
        let now = Utc::now();
        let cluster = QuestionCluster {
            id: new_id(),
            subject_id: new.subject_id,
            topic: new.topic,
            canonical_template: new.canonical_template,
            difficulty_baseline: new
                .difficulty_baseline
                .map(clamp_difficulty)
                .unwrap_or(DIFFICULTY_DEFAULT),
            created_at: now,
            updated_at: now,
        };
        info!(cluster_id = %cluster.id, subject_id = %cluster.subject_id, "cluster created");
        self.clusters.push(cluster.clone());
        Ok(cluster)
    }

    pub fn create_variant(&mut self, new: NewVariant) -> Result<QuestionVariant, ContentError> {
        require_text("question_text", &new.question_text)?;
        self.require_cluster(&new.cluster_id)?;
        let now = Utc::now();
        let variant = QuestionVariant {
            id: new_id(),
            cluster_id: new.cluster_id,
            question_text: new.question_text,
            created_at: now,
            updated_at: now,
        };
        info!(variant_id = %variant.id, cluster_id = %variant.cluster_id, "variant created");
        self.variants.push(variant.clone());
        Ok(variant)
    }

    pub fn create_answer(&mut self, new: NewAnswer) -> Result<Answer, ContentError> {
        let mut created = self.create_answers_bulk(
            &new.variant_id,
            vec![AnswerOption {
                answer_text: new.answer_text,
                is_correct: new.is_correct,
                distractor_type: new.distractor_type,
            }],
        )?;
        // One option in, one answer out.
        created.pop().ok_or(ContentError::EmptyField {
            field: "answer_text",
        })
    }

    /// Insert several answers for one variant. Either all are inserted or none.
    pub fn create_answers_bulk(
        &mut self,
        variant_id: &str,
        options: Vec<AnswerOption>,
    ) -> Result<Vec<Answer>, ContentError> {
        self.require_variant(variant_id)?;
        for option in &options {
            require_text("answer_text", &option.answer_text)?;
        }
        let now = Utc::now();
        let created: Vec<Answer> = options
            .into_iter()
            .map(|option| Answer {
                id: new_id(),
                variant_id: variant_id.to_owned(),
                answer_text: option.answer_text,
                is_correct: option.is_correct,
                distractor_type: option.distractor_type,
                created_at: now,
                updated_at: now,
            })
            .collect();
        info!(variant_id, count = created.len(), "answers created");
        self.answers.extend(created.iter().cloned());
        Ok(created)
    }

    // ── Updates ──────────────────────────────────────────────────────────────
    //
    // An unknown id returns `Ok(None)` and changes nothing.

    pub fn update_subject(
        &mut self,
        id: &str,
        patch: SubjectPatch,
    ) -> Result<Option<Subject>, ContentError> {
        if self.get_subject_by_id(id).is_none() {
            return Ok(None);
        }
        if let Some(key) = &patch.key {
            require_text("key", key)?;
            if self.key_taken(key, Some(id)) {
                return Err(ContentError::DuplicateKey(key.clone()));
            }
        }
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        let Some(subject) = self.subjects.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(key) = patch.key {
            subject.key = key;
        }
        if let Some(name) = patch.name {
            subject.name = name;
        }
        if let Some(description) = patch.description {
            subject.description = Some(description);
        }
        subject.updated_at = touch(subject.updated_at);
        debug!(subject_id = %id, "subject updated");
        Ok(Some(subject.clone()))
    }

    pub fn update_cluster(
        &mut self,
        id: &str,
        patch: ClusterPatch,
    ) -> Result<Option<QuestionCluster>, ContentError> {
        if self.get_cluster_by_id(id).is_none() {
            return Ok(None);
        }
        if let Some(subject_id) = &patch.subject_id {
            self.require_subject(subject_id)?;
        }
        if let Some(topic) = &patch.topic {
            require_text("topic", topic)?;
        }
        let Some(cluster) = self.clusters.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(subject_id) = patch.subject_id {
            cluster.subject_id = subject_id;
        }
        if let Some(topic) = patch.topic {
            cluster.topic = topic;
        }
        if let Some(template) = patch.canonical_template {
            cluster.canonical_template = Some(template);
        }
        if let Some(difficulty) = patch.difficulty_baseline {
            cluster.difficulty_baseline = clamp_difficulty(difficulty);
        }
        cluster.updated_at = touch(cluster.updated_at);
        debug!(cluster_id = %id, "cluster updated");
        Ok(Some(cluster.clone()))
    }

    pub fn update_variant(
        &mut self,
        id: &str,
        patch: VariantPatch,
    ) -> Result<Option<QuestionVariant>, ContentError> {
        if self.get_variant_by_id(id).is_none() {
            return Ok(None);
        }
        if let Some(cluster_id) = &patch.cluster_id {
            self.require_cluster(cluster_id)?;
        }
        if let Some(text) = &patch.question_text {
            require_text("question_text", text)?;
        }
        let Some(variant) = self.variants.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        if let Some(cluster_id) = patch.cluster_id {
            variant.cluster_id = cluster_id;
        }
        if let Some(text) = patch.question_text {
            variant.question_text = text;
        }
        variant.updated_at = touch(variant.updated_at);
        debug!(variant_id = %id, "variant updated");
        Ok(Some(variant.clone()))
    }

    pub fn update_answer(
        &mut self,
        id: &str,
        patch: AnswerPatch,
    ) -> Result<Option<Answer>, ContentError> {
        if self.get_answer_by_id(id).is_none() {
            return Ok(None);
        }
        if let Some(variant_id) = &patch.variant_id {
            self.require_variant(variant_id)?;
        }
        if let Some(text) = &patch.answer_text {
            require_text("answer_text", text)?;
        }
        let Some(answer) = self.answers.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(variant_id) = patch.variant_id {
            answer.variant_id = variant_id;
        }
        if let Some(text) = patch.answer_text {
            answer.answer_text = text;
        }
        if let Some(is_correct) = patch.is_correct {
            answer.is_correct = is_correct;
        }
        if let Some(distractor) = patch.distractor_type {
            answer.distractor_type = Some(distractor);
        }
        answer.updated_at = touch(answer.updated_at);
        debug!(answer_id = %id, "answer updated");
        Ok(Some(answer.clone()))
    }

    // ── Cascading deletes ────────────────────────────────────────────────────

    pub fn delete_subject(&mut self, id: &str) -> DeleteSummary {
        let before = self.subjects.len();
        self.subjects.retain(|s| s.id != id);
        let mut summary = DeleteSummary {
            subjects: before - self.subjects.len(),
            ..Default::default()
        };
        if summary.subjects == 0 {
            return summary;
        }
        let cluster_ids: Vec<String> = self
            .clusters
            .iter()
            .filter(|c| c.subject_id == id)
            .map(|c| c.id.clone())
            .collect();
        for cluster_id in &cluster_ids {
            let nested = self.delete_cluster(cluster_id);
            summary.clusters += nested.clusters;
            summary.variants += nested.variants;
            summary.answers += nested.answers;
        }
        info!(subject_id = %id, removed = summary.total(), "subject deleted");
        summary
    }

    pub fn delete_cluster(&mut self, id: &str) -> DeleteSummary {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.id != id);
        let mut summary = DeleteSummary {
            clusters: before - self.clusters.len(),
            ..Default::default()
        };
        if summary.clusters == 0 {
            return summary;
        }
        let variant_ids: Vec<String> = self
            .variants
            .iter()
            .filter(|v| v.cluster_id == id)
            .map(|v| v.id.clone())
            .collect();
        for variant_id in &variant_ids {
            let nested = self.delete_variant(variant_id);
            summary.variants += nested.variants;
            summary.answers += nested.answers;
        }
        debug!(cluster_id = %id, removed = summary.total(), "cluster deleted");
        summary
    }

    pub fn delete_variant(&mut self, id: &str) -> DeleteSummary {
        let before = self.variants.len();
        self.variants.retain(|v| v.id != id);
        let variants = before - self.variants.len();
        if variants == 0 {
            return DeleteSummary::default();
        }
        let before = self.answers.len();
        self.answers.retain(|a| a.variant_id != id);
        let summary = DeleteSummary {
            variants,
            answers: before - self.answers.len(),
            ..Default::default()
        };
        debug!(variant_id = %id, removed = summary.total(), "variant deleted");
        summary
    }

    pub fn delete_answer(&mut self, id: &str) -> DeleteSummary {
        let before = self.answers.len();
        self.answers.retain(|a| a.id != id);
        DeleteSummary {
            answers: before - self.answers.len(),
            ..Default::default()
        }
    }

    // ── Selection ────────────────────────────────────────────────────────────

    pub fn selection(&self) -> Option<&ContentSelection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<ContentSelection>) {
        self.selection = selection.filter(|s| s.kind.is_some());
    }

    pub fn resolve_selection(&self) -> SelectionState<'_> {
        let Some((kind, id)) = self.selection.as_ref().and_then(ContentSelection::target) else {
            return SelectionState::Empty;
        };
        let found = match kind {
            ContentKind::Subject => self.get_subject_by_id(id).map(SelectedContent::Subject),
            ContentKind::Cluster => self.get_cluster_by_id(id).map(SelectedContent::Cluster),
            ContentKind::Variant | ContentKind::Answer => {
                self.get_variant_by_id(id).map(SelectedContent::Variant)
            }
        };
        match found {
            Some(entity) => SelectionState::Resolved(entity),
            None => SelectionState::Dangling {
                kind,
                id: id.to_owned(),
            },
        }
    }

    // ── Filters ──────────────────────────────────────────────────────────────

    pub fn filters(&self) -> &ContentFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, patch: FiltersPatch) -> &ContentFilters {
        self.filters.apply(patch);
        &self.filters
    }

    /// Subjects passing the current filters, in insertion order.
    pub fn filtered_subjects(&self) -> Vec<&Subject> {
        self.filter_subjects(&self.filters)
    }

    /// Subjects passing `filters`, independent of the stored filter state.
    pub fn filter_subjects(&self, filters: &ContentFilters) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| filters.matches_subject(s))
            .collect()
    }
}

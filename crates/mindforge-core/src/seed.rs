//! Demo data loaded into a fresh server.

use chrono::{DateTime, Duration, Utc};

use crate::content::{Answer, ContentStore, QuestionCluster, QuestionVariant, Subject};
use crate::tasks::{
    ContentAction, DEFAULT_MAX_RETRIES, GenerationTask, PROGRESS_TOTAL, TaskPayload, TaskStatus,
    TaskStore,
};
use crate::ContentKind;

fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn subject(id: &str, key: &str, name: &str, description: &str, created: &str, updated: &str) -> Subject {
    Subject {
        id: id.into(),
        key: key.into(),
        name: name.into(),
        description: Some(description.into()),
        created_at: ts(created),
        updated_at: ts(updated),
    }
}

fn cluster(
    id: &str,
    subject_id: &str,
    topic: &str,
    template: &str,
    difficulty: u8,
    created: &str,
    updated: &str,
) -> QuestionCluster {
    QuestionCluster {
        id: id.into(),
        subject_id: subject_id.into(),
        topic: topic.into(),
        canonical_template: Some(template.into()),
        difficulty_baseline: difficulty,
        created_at: ts(created),
        updated_at: ts(updated),
    }
}

fn variant(id: &str, cluster_id: &str, text: &str, at: &str) -> QuestionVariant {
    QuestionVariant {
        id: id.into(),
        cluster_id: cluster_id.into(),
        question_text: text.into(),
        created_at: ts(at),
        updated_at: ts(at),
    }
}

/// Four answers for `variant_id`: the correct one first, then three
/// distractors as `(text, distractor_type)`.
fn answer_set(prefix: &str, variant_id: &str, at: &str, correct: &str, wrong: [(&str, &str); 3]) -> Vec<Answer> {
    let mut answers = vec![Answer {
        id: format!("{prefix}-a"),
        variant_id: variant_id.into(),
        answer_text: correct.into(),
        is_correct: true,
        distractor_type: None,
        created_at: ts(at),
        updated_at: ts(at),
    }];
    for ((text, kind), suffix) in wrong.into_iter().zip(["b", "c", "d"]) {
        answers.push(Answer {
            id: format!("{prefix}-{suffix}"),
            variant_id: variant_id.into(),
            answer_text: text.into(),
            is_correct: false,
            distractor_type: Some(kind.into()),
            created_at: ts(at),
            updated_at: ts(at),
        });
    }
    answers
}

/// The demo content set: four subjects, seven clusters, thirteen variants.
pub fn demo_content() -> ContentStore {
    let subjects = vec![
        subject(
            "subj-math-9",
            "mathe-9",
            "Mathematik 9. Klasse",
            "Grundlagen der Algebra, Geometrie und Wahrscheinlichkeitsrechnung für die 9. Klasse",
            "2024-11-20T10:00:00Z",
            "2024-11-25T14:30:00Z",
        ),
        subject(
            "subj-math-9-algebra",
            "mathe-9-algebra",
            "Mathematik 9 - Algebra",
            "Lineare und quadratische Gleichungen, Ungleichungen, Termumformungen",
            "2024-11-20T10:00:00Z",
            "2024-11-26T09:15:00Z",
        ),
        subject(
            "subj-deutsch-9",
            "deutsch-9",
            "Deutsch 9. Klasse",
            "Grammatik, Rechtschreibung, Textanalyse und Aufsatzlehre",
            "2024-11-21T11:00:00Z",
            "2024-11-24T16:45:00Z",
        ),
        subject(
            "subj-englisch-9",
            "englisch-9",
            "Englisch 9. Klasse",
            "Grammatik, Vokabular, Leseverständnis und Textproduktion",
            "2024-11-22T09:30:00Z",
            "2024-11-23T11:20:00Z",
        ),
    ];

    let algebra = "subj-math-9-algebra";
    let deutsch = "subj-deutsch-9";
    let clusters = vec![
        cluster("clust-lin-eq", algebra, "Lineare Gleichungen lösen", "Löse die Gleichung nach x auf", 4, "2024-11-22T10:00:00Z", "2024-11-25T14:30:00Z"),
        cluster("clust-quad-eq", algebra, "Quadratische Gleichungen", "Bestimme die Lösungen der quadratischen Gleichung", 6, "2024-11-22T11:00:00Z", "2024-11-26T09:15:00Z"),
        cluster("clust-inequ", algebra, "Ungleichungen", "Löse die Ungleichung und gib die Lösungsmenge an", 5, "2024-11-23T09:00:00Z", "2024-11-24T10:20:00Z"),
        cluster("clust-term-simp", algebra, "Terme vereinfachen", "Vereinfache den Term so weit wie möglich", 3, "2024-11-23T10:30:00Z", "2024-11-25T08:45:00Z"),
        cluster("clust-binomial", algebra, "Binomische Formeln", "Wende die binomischen Formeln an", 4, "2024-11-24T14:00:00Z", "2024-11-26T11:30:00Z"),
        cluster("clust-grammar-cases", deutsch, "Die vier Fälle", "Bestimme den Fall des markierten Satzglieds", 3, "2024-11-21T14:00:00Z", "2024-11-24T16:45:00Z"),
        cluster("clust-konjunktiv", deutsch, "Konjunktiv I und II", "Setze das Verb in die richtige Konjunktivform", 6, "2024-11-22T09:00:00Z", "2024-11-23T15:30:00Z"),
    ];

    let variants = vec![
        variant("var-lin-001", "clust-lin-eq", "Löse die Gleichung: 2x + 3 = 7", "2024-11-22T10:15:00Z"),
        variant("var-lin-002", "clust-lin-eq", "Löse die Gleichung: 4x - 1 = 11", "2024-11-22T10:16:00Z"),
        variant("var-lin-003", "clust-lin-eq", "Löse die Gleichung: 3(x + 2) = 15", "2024-11-22T10:17:00Z"),
        variant("var-lin-004", "clust-lin-eq", "Löse die Gleichung: 5x + 2 = 3x + 10", "2024-11-22T10:18:00Z"),
        variant("var-lin-005", "clust-lin-eq", "Löse die Gleichung: (x - 4) / 2 = 3", "2024-11-22T10:19:00Z"),
        variant("var-quad-001", "clust-quad-eq", "Löse die Gleichung: x² - 5x + 6 = 0", "2024-11-22T11:15:00Z"),
        variant("var-quad-002", "clust-quad-eq", "Löse die Gleichung: x² + 4x - 12 = 0", "2024-11-22T11:16:00Z"),
        variant("var-quad-003", "clust-quad-eq", "Löse die Gleichung: 2x² - 8 = 0", "2024-11-22T11:17:00Z"),
        variant("var-binom-001", "clust-binomial", "Berechne: (a + 3)²", "2024-11-24T14:15:00Z"),
        variant("var-binom-002", "clust-binomial", "Berechne: (2x - 5)²", "2024-11-24T14:16:00Z"),
        variant("var-binom-003", "clust-binomial", "Berechne: (x + 4)(x - 4)", "2024-11-24T14:17:00Z"),
        variant("var-term-001", "clust-term-simp", "Vereinfache: 3x + 5x - 2x", "2024-11-23T10:45:00Z"),
        variant("var-term-002", "clust-term-simp", "Vereinfache: 4a · 3b · 2", "2024-11-23T10:46:00Z"),
    ];

    let answers = [
        answer_set("ans-lin-001", "var-lin-001", "2024-11-22T10:15:00Z", "x = 2", [
            ("x = 5", "calculation_error"),
            ("x = -2", "sign_error"),
            ("x = 4", "common_mistake"),
        ]),
        answer_set("ans-lin-002", "var-lin-002", "2024-11-22T10:16:00Z", "x = 3", [
            ("x = 2.5", "calculation_error"),
            ("x = -3", "sign_error"),
            ("x = 4", "common_mistake"),
        ]),
        answer_set("ans-quad-001", "var-quad-001", "2024-11-22T11:15:00Z", "x₁ = 2, x₂ = 3", [
            ("x₁ = -2, x₂ = -3", "sign_error"),
            ("x₁ = 1, x₂ = 6", "factoring_error"),
            ("x = 5", "incomplete_solution"),
        ]),
        answer_set("ans-binom-001", "var-binom-001", "2024-11-24T14:15:00Z", "a² + 6a + 9", [
            ("a² + 9", "missing_middle_term"),
            ("a² + 3a + 9", "coefficient_error"),
            ("2a + 6", "conceptual_error"),
        ]),
        answer_set("ans-term-001", "var-term-001", "2024-11-23T10:45:00Z", "6x", [
            ("8x", "calculation_error"),
            ("10x", "sign_error"),
            ("6x³", "exponent_error"),
        ]),
    ]
    .concat();

    ContentStore::from_parts(subjects, clusters, variants, answers)
}

/// Historical tasks covering the terminal states, most recent first.
///
/// Timestamps are relative to `now` so the list reads as recent activity.
pub fn demo_tasks(now: DateTime<Utc>) -> TaskStore {
    let base = |id: &str, payload: TaskPayload, status: TaskStatus, age_minutes: i64| GenerationTask {
        id: id.into(),
        payload,
        status,
        user_context: None,
        created_at: now - Duration::minutes(age_minutes),
        started_at: Some(now - Duration::minutes(age_minutes - 1)),
        completed_at: None,
        delayed_until: None,
        progress_current: 0,
        progress_total: PROGRESS_TOTAL,
        progress_message: None,
        error_message: None,
        retry_count: 0,
        max_retries: DEFAULT_MAX_RETRIES,
        accepted_at: None,
        reverted_at: None,
    };

    let mut completed = base(
        "task-demo-variants",
        TaskPayload::GenerateVariants {
            cluster_id: "clust-lin-eq".into(),
            count: 5,
            answers_per_variant: 4,
        },
        TaskStatus::Completed,
        30,
    );
    completed.progress_current = PROGRESS_TOTAL;
    completed.completed_at = Some(now - Duration::minutes(25));
    completed.user_context = Some("Fokus auf Gleichungen mit Klammern".into());

    let mut accepted = base(
        "task-demo-clusters",
        TaskPayload::GenerateClusters {
            subject_id: "subj-math-9-algebra".into(),
            count: 3,
            variants_per_cluster: 5,
            answers_per_variant: 4,
        },
        TaskStatus::Completed,
        240,
    );
    accepted.progress_current = PROGRESS_TOTAL;
    accepted.completed_at = Some(now - Duration::minutes(220));
    accepted.accepted_at = Some(now - Duration::minutes(200));

    let mut failed = base(
        "task-demo-answers",
        TaskPayload::RegenerateAnswers {
            variant_id: "var-quad-001".into(),
            count: 4,
        },
        TaskStatus::Failed,
        90,
    );
    failed.progress_current = 36;
    failed.error_message = Some("Content service timed out".into());
    failed.retry_count = 1;

    let mut cancelled = base(
        "task-demo-cancelled",
        TaskPayload::GenerateVariants {
            cluster_id: "clust-binomial".into(),
            count: 3,
            answers_per_variant: 4,
        },
        TaskStatus::Cancelled,
        600,
    );
    cancelled.progress_current = 12;

    let mut store = TaskStore::from_tasks(vec![completed, failed, accepted, cancelled]);
    for i in 0..5 {
        // The task was inserted above.
        let _ = store.log_content(
            "task-demo-variants",
            ContentKind::Variant,
            format!("var-lin-{:03}", i + 1),
            ContentAction::Created,
            None,
        );
    }
    store
}

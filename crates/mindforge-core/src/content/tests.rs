use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::ContentError;
use crate::seed::demo_content;

use super::*;

fn assert_no_orphans(store: &ContentStore) {
    for c in store.clusters() {
        assert!(store.get_subject_by_id(&c.subject_id).is_some(), "orphan cluster {}", c.id);
    }
    for v in store.variants() {
        assert!(store.get_cluster_by_id(&v.cluster_id).is_some(), "orphan variant {}", v.id);
    }
    for a in store.answers() {
        assert!(store.get_variant_by_id(&a.variant_id).is_some(), "orphan answer {}", a.id);
    }
}

// ── Lookups ───────────────────────────────────────────────────────────────────

#[test]
fn demo_content_is_consistent() {
    let store = demo_content();
    assert_eq!(
        store.stats(),
        ContentStats {
            subjects: 4,
            clusters: 7,
            variants: 13,
            answers: 20,
        }
    );
    assert_no_orphans(&store);
}

#[test]
fn question_with_answers_carries_its_hierarchy() {
    let store = demo_content();
    let question = store.get_question_with_answers("var-quad-001").unwrap();
    assert_eq!(question.variant.id, "var-quad-001");
    assert_eq!(question.answers.len(), 4);
    assert!(question.answers.iter().all(|a| a.variant_id == "var-quad-001"));
    assert_eq!(question.cluster.unwrap().id, "clust-quad-eq");
    assert_eq!(question.subject.unwrap().id, "subj-math-9-algebra");

    let bare = store.get_question_with_answers("var-lin-003").unwrap();
    assert!(bare.answers.is_empty());
    assert!(store.get_question_with_answers("var-gone").is_none());
}

#[test]
fn random_question_stays_inside_subject() {
    let store = demo_content();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        let question = store
            .get_random_question_for_subject("mathe-9-algebra", &mut rng)
            .unwrap();
        let cluster = question.cluster.unwrap();
        assert_eq!(cluster.subject_id, "subj-math-9-algebra");
        assert_eq!(question.variant.cluster_id, cluster.id);
        assert_eq!(
            question.answers.len(),
            store.get_answers_by_variant(&question.variant.id).len()
        );
        assert_eq!(question.subject.unwrap().key, "mathe-9-algebra");
    }
}

#[test]
fn random_question_is_reproducible_for_a_seed() {
    let store = demo_content();
    let pick = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        store
            .get_random_question_for_subject("mathe-9-algebra", &mut rng)
            .map(|q| q.variant.id)
    };
    assert_eq!(pick(3), pick(3));
}

#[test]
fn random_question_needs_variants() {
    let store = demo_content();
    let mut rng = StdRng::seed_from_u64(1);
    // No clusters at all.
    assert!(store.get_random_question_for_subject("mathe-9", &mut rng).is_none());
    // Clusters without variants.
    assert!(store.get_random_question_for_subject("deutsch-9", &mut rng).is_none());
    assert!(store.get_random_question_for_subject("latein-9", &mut rng).is_none());
}

#[test]
fn child_lookups_keep_insertion_order() {
    let store = demo_content();
    let ids: Vec<_> = store
        .get_variants_by_cluster("clust-lin-eq")
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(
        ids,
        ["var-lin-001", "var-lin-002", "var-lin-003", "var-lin-004", "var-lin-005"]
    );
    assert_eq!(store.get_answers_by_variant("var-lin-001").len(), 4);
    assert!(store.get_clusters_by_subject("subj-englisch-9").is_empty());
}

#[test]
fn unknown_ids_are_absent() {
    let store = demo_content();
    assert!(store.get_subject_by_id("nope").is_none());
    assert!(store.get_cluster_by_id("nope").is_none());
    assert!(store.get_variant_by_id("nope").is_none());
    assert!(store.get_answer_by_id("nope").is_none());
    assert_eq!(
        store.get_subject_by_key("mathe-9-algebra").map(|s| s.id.as_str()),
        Some("subj-math-9-algebra")
    );
}

// ── Creates ───────────────────────────────────────────────────────────────────

#[test]
fn create_cluster_defaults_and_clamps_difficulty() {
    let mut store = demo_content();
    let default = store
        .create_cluster(NewCluster {
            subject_id: "subj-math-9".into(),
            topic: "Pythagoras".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(default.difficulty_baseline, DIFFICULTY_DEFAULT);
    assert_eq!(default.created_at, default.updated_at);

    let high = store
        .create_cluster(NewCluster {
            subject_id: "subj-math-9".into(),
            topic: "Trigonometrie".into(),
            difficulty_baseline: Some(42),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(high.difficulty_baseline, DIFFICULTY_MAX);

    let low = store
        .create_cluster(NewCluster {
            subject_id: "subj-math-9".into(),
            topic: "Zahlen".into(),
            difficulty_baseline: Some(-3),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(low.difficulty_baseline, DIFFICULTY_MIN);
}

#[test]
fn create_rejects_missing_parent() {
    let mut store = demo_content();
    let err = store
        .create_variant(NewVariant {
            cluster_id: "clust-gone".into(),
            question_text: "2 + 2 = ?".into(),
        })
        .unwrap_err();
    assert_eq!(
        err,
        ContentError::MissingParent {
            kind: ContentKind::Cluster,
            id: "clust-gone".into(),
        }
    );
    assert_eq!(store.variants().len(), 13);
}

#[test]
fn create_subject_rejects_duplicate_key() {
    let mut store = demo_content();
    let err = store
        .create_subject(NewSubject {
            key: "deutsch-9".into(),
            name: "Deutsch".into(),
            description: None,
        })
        .unwrap_err();
    assert_eq!(err, ContentError::DuplicateKey("deutsch-9".into()));
}

#[test]
fn bulk_answers_are_all_or_nothing() {
    let mut store = demo_content();
    let err = store
        .create_answers_bulk(
            "var-lin-003",
            vec![
                AnswerOption {
                    answer_text: "x = 3".into(),
                    is_correct: true,
                    distractor_type: None,
                },
                AnswerOption {
                    answer_text: "  ".into(),
                    ..Default::default()
                },
            ],
        )
        .unwrap_err();
    assert_eq!(err, ContentError::EmptyField { field: "answer_text" });
    assert!(store.get_answers_by_variant("var-lin-003").is_empty());

    let created = store
        .create_answers_bulk(
            "var-lin-003",
            vec![
                AnswerOption {
                    answer_text: "x = 3".into(),
                    is_correct: true,
                    distractor_type: None,
                },
                AnswerOption {
                    answer_text: "x = 7".into(),
                    is_correct: false,
                    distractor_type: Some("calculation_error".into()),
                },
            ],
        )
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(store.get_answers_by_variant("var-lin-003").len(), 2);
}

// ── Updates ───────────────────────────────────────────────────────────────────

#[test]
fn update_cluster_difficulty_refreshes_timestamp() {
    let mut store = demo_content();
    let before = store.get_cluster_by_id("clust-lin-eq").unwrap().clone();

    let updated = store
        .update_cluster(
            "clust-lin-eq",
            ClusterPatch {
                difficulty_baseline: Some(6),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.difficulty_baseline, 6);
    assert!(updated.updated_at > before.updated_at);
    assert_eq!(updated.created_at, before.created_at);
    assert_eq!(updated.topic, before.topic);
}

#[test]
fn repeated_updates_strictly_increase_updated_at() {
    let mut store = demo_content();
    let mut last = store.get_subject_by_id("subj-deutsch-9").unwrap().updated_at;
    for i in 0..5 {
        let s = store
            .update_subject(
                "subj-deutsch-9",
                SubjectPatch {
                    name: Some(format!("Deutsch {i}")),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(s.updated_at > last);
        assert!(s.updated_at >= s.created_at);
        last = s.updated_at;
    }
}

#[test]
fn update_of_unknown_id_is_a_no_op() {
    let mut store = demo_content();
    let result = store
        .update_variant(
            "var-gone",
            VariantPatch {
                question_text: Some("?".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn reparenting_requires_existing_parent() {
    let mut store = demo_content();
    let err = store
        .update_cluster(
            "clust-lin-eq",
            ClusterPatch {
                subject_id: Some("subj-gone".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::MissingParent { kind: ContentKind::Subject, .. }));
    assert_eq!(
        store.get_cluster_by_id("clust-lin-eq").unwrap().subject_id,
        "subj-math-9-algebra"
    );

    let moved = store
        .update_cluster(
            "clust-lin-eq",
            ClusterPatch {
                subject_id: Some("subj-math-9".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(moved.subject_id, "subj-math-9");
    assert_no_orphans(&store);
}

#[test]
fn update_subject_key_must_stay_unique() {
    let mut store = demo_content();
    let err = store
        .update_subject(
            "subj-math-9",
            SubjectPatch {
                key: Some("englisch-9".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, ContentError::DuplicateKey("englisch-9".into()));

    // Keeping its own key is fine.
    let same = store
        .update_subject(
            "subj-math-9",
            SubjectPatch {
                key: Some("mathe-9".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(same.is_some());
}

// ── Cascading deletes ─────────────────────────────────────────────────────────

#[test]
fn delete_subject_cascades_through_every_level() {
    let mut store = demo_content();
    let summary = store.delete_subject("subj-math-9-algebra");

    assert_eq!(
        summary,
        DeleteSummary {
            subjects: 1,
            clusters: 5,
            variants: 13,
            answers: 20,
        }
    );
    assert!(store.get_subject_by_id("subj-math-9-algebra").is_none());
    assert!(store.get_cluster_by_id("clust-lin-eq").is_none());
    assert!(store.get_variant_by_id("var-lin-001").is_none());
    assert!(store.get_answer_by_id("ans-lin-001-a").is_none());
    assert!(store.get_cluster_by_id("clust-konjunktiv").is_some());
    assert_no_orphans(&store);
}

#[test]
fn delete_cluster_removes_variants_and_answers() {
    let mut store = demo_content();
    let summary = store.delete_cluster("clust-lin-eq");
    assert_eq!(summary.clusters, 1);
    assert_eq!(summary.variants, 5);
    assert_eq!(summary.answers, 8);
    assert!(store.get_subject_by_id("subj-math-9-algebra").is_some());
    assert!(store.get_answers_by_variant("var-lin-002").is_empty());
    assert_no_orphans(&store);
}

#[test]
fn delete_variant_and_answer() {
    let mut store = demo_content();
    assert_eq!(store.delete_answer("ans-lin-001-b").answers, 1);
    assert_eq!(store.get_answers_by_variant("var-lin-001").len(), 3);

    let summary = store.delete_variant("var-lin-001");
    assert_eq!((summary.variants, summary.answers), (1, 3));
    assert_no_orphans(&store);
}

#[test]
fn delete_of_unknown_id_removes_nothing() {
    let mut store = demo_content();
    assert!(store.delete_subject("nope").is_empty());
    assert!(store.delete_cluster("nope").is_empty());
    assert!(store.delete_variant("nope").is_empty());
    assert!(store.delete_answer("nope").is_empty());
    assert_eq!(store.stats().answers, 20);
}

// ── Selection & filters ───────────────────────────────────────────────────────

#[test]
fn selection_resolves_and_dangles_after_delete() {
    let mut store = demo_content();
    assert_eq!(store.resolve_selection(), SelectionState::Empty);

    store.set_selection(Some(ContentSelection::variant(
        "subj-math-9-algebra",
        "clust-lin-eq",
        "var-lin-002",
    )));
    match store.resolve_selection() {
        SelectionState::Resolved(SelectedContent::Variant(v)) => assert_eq!(v.id, "var-lin-002"),
        other => panic!("unexpected selection state: {other:?}"),
    }

    store.delete_cluster("clust-lin-eq");
    assert_eq!(
        store.resolve_selection(),
        SelectionState::Dangling {
            kind: ContentKind::Variant,
            id: "var-lin-002".into(),
        }
    );

    store.set_selection(None);
    assert!(store.selection().is_none());
}

#[test]
fn subject_selection_resolves_to_subject() {
    let mut store = demo_content();
    store.set_selection(Some(ContentSelection::subject("subj-deutsch-9")));
    assert!(matches!(
        store.resolve_selection(),
        SelectionState::Resolved(SelectedContent::Subject(s)) if s.key == "deutsch-9"
    ));
}

#[test]
fn filters_merge_and_apply_to_subjects() {
    let mut store = demo_content();
    assert_eq!(store.filtered_subjects().len(), 4);

    store.set_filters(FiltersPatch {
        search: Some("MATHEMATIK".into()),
        ..Default::default()
    });
    let ids: Vec<_> = store.filtered_subjects().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["subj-math-9", "subj-math-9-algebra"]);

    store.set_filters(FiltersPatch {
        subject_id: Some(Some("subj-math-9-algebra".into())),
        task_id: Some(Some("task-1".into())),
        ..Default::default()
    });
    assert_eq!(store.filters().search, "MATHEMATIK");
    assert_eq!(store.filtered_subjects().len(), 1);

    store.set_filters(FiltersPatch::clear());
    assert!(!store.filters().is_active());
    assert_eq!(store.filtered_subjects().len(), 4);
}

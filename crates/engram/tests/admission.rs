mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{session, verdict, StubClassifier, StubStore};
use engram::{
    AdmissionConfig, AdmissionGate, ClassificationResult, DomainError, MemoryKind, MemorySource,
    SourceTool,
};

fn gate(
    classifier: &Arc<StubClassifier>,
    store: &Arc<StubStore>,
    config: AdmissionConfig,
) -> AdmissionGate<StubClassifier, StubStore> {
    AdmissionGate::new(Arc::clone(classifier), Arc::clone(store), config)
}

#[tokio::test]
async fn test_admits_important_interaction() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let outcome = gate
        .evaluate(
            "why does this not compile?",
            "split the borrow",
            session("s1").with_project("engram"),
        )
        .await
        .unwrap();

    assert!(outcome.admitted);
    let entry = outcome.entry.unwrap();
    assert_eq!(entry.id, "mem-0001");
    assert_eq!(entry.kind, MemoryKind::Fix);
    assert_eq!(entry.content, "Use split borrows to satisfy the borrow checker");
    assert_eq!(entry.tags, vec!["rust", "borrowck"]);
    assert_eq!(entry.source.session_id.as_deref(), Some("s1"));
    assert_eq!(entry.source.project.as_deref(), Some("engram"));

    let metadata = entry.metadata.unwrap();
    assert!((metadata["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    assert_eq!(metadata["original_request"], "why does this not compile?");
    assert_eq!(metadata["context"], "Recurring compiler error");
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn test_original_request_is_truncated() {
    let classifier = StubClassifier::important(MemoryKind::Pattern, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let request = "é".repeat(800);
    let outcome = gate
        .evaluate(&request, "answer", session("s1"))
        .await
        .unwrap();

    let metadata = outcome.entry.unwrap().metadata.unwrap();
    let stored = metadata["original_request"].as_str().unwrap();
    assert_eq!(stored.chars().count(), 500);
}

#[tokio::test]
async fn test_duplicate_interaction_rejected() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let first = gate.evaluate("q", "a", session("s1")).await.unwrap();
    // Different session, same text: still a duplicate
    let second = gate.evaluate("q", "a", session("s2")).await.unwrap();

    assert!(first.admitted);
    assert!(!second.admitted);
    assert!(second.entry.is_none());
    assert_eq!(classifier.calls(), 1);
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn test_duplicate_detection_uses_truncated_text() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let base = "x".repeat(2000);
    let first = gate
        .evaluate(&format!("{}tail one", base), "a", session("s1"))
        .await
        .unwrap();
    let second = gate
        .evaluate(&format!("{}tail two", base), "a", session("s1"))
        .await
        .unwrap();

    assert!(first.admitted);
    assert!(!second.admitted);
}

#[tokio::test]
async fn test_session_quota() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let config = AdmissionConfig {
        max_entries_per_session: 2,
        ..AdmissionConfig::default()
    };
    let gate = gate(&classifier, &store, config);

    let mut admitted = Vec::new();
    for i in 0..3 {
        let outcome = gate
            .evaluate(&format!("question {}", i), "answer", session("s1"))
            .await
            .unwrap();
        admitted.push(outcome.admitted);
    }
    assert_eq!(admitted, vec![true, true, false]);
    // Quota refusal happens before classification
    assert_eq!(classifier.calls(), 2);

    // Other sessions have their own budget
    let other = gate
        .evaluate("question 9", "answer", session("s2"))
        .await
        .unwrap();
    assert!(other.admitted);
    assert_eq!(gate.status().session_counts.get("s1"), Some(&2));
    assert_eq!(gate.status().session_counts.get("s2"), Some(&1));
}

#[tokio::test]
async fn test_missing_session_uses_default_bucket() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    gate.evaluate("q1", "a", MemorySource::new(SourceTool::Codex))
        .await
        .unwrap();
    gate.evaluate("q2", "a", MemorySource::new(SourceTool::Cursor).with_session(""))
        .await
        .unwrap();

    assert_eq!(gate.status().session_counts.get("default"), Some(&2));
}

#[tokio::test]
async fn test_rejections_do_not_consume_quota() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.3);
    let store = StubStore::new();
    let config = AdmissionConfig {
        max_entries_per_session: 1,
        ..AdmissionConfig::default()
    };
    let gate = gate(&classifier, &store, config);

    let low = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(!low.admitted);
    assert!(gate.status().session_counts.get("s1").is_none());

    // The rejected fingerprint is not remembered either
    classifier.set(verdict(MemoryKind::Fix, 0.9));
    let retry = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(retry.admitted);
}

#[tokio::test]
async fn test_confidence_threshold_is_inclusive() {
    let store = StubStore::new();
    let config = AdmissionConfig {
        min_confidence: 0.7,
        ..AdmissionConfig::default()
    };

    let at = StubClassifier::important(MemoryKind::Fix, 0.7);
    let outcome = gate(&at, &store, config.clone())
        .evaluate("q", "a", session("s1"))
        .await
        .unwrap();
    assert!(outcome.admitted);

    let below = StubClassifier::important(MemoryKind::Fix, 0.69);
    let outcome = gate(&below, &store, config)
        .evaluate("q", "a", session("s1"))
        .await
        .unwrap();
    assert!(!outcome.admitted);
}

#[tokio::test]
async fn test_not_important_rejected() {
    let classifier = StubClassifier::returning(ClassificationResult {
        is_important: false,
        confidence: 0.95,
        ..verdict(MemoryKind::Fix, 0.95)
    });
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let outcome = gate.evaluate("hi", "hello", session("s1")).await.unwrap();
    assert!(!outcome.admitted);
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_unbounded_verdict_is_bounded_before_checks() {
    let classifier = StubClassifier::returning(ClassificationResult {
        confidence: f32::NAN,
        ..verdict(MemoryKind::Fix, 0.9)
    });
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    // NaN confidence counts as zero
    let outcome = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(!outcome.admitted);
    assert!(store.saved().is_empty());

    let tags: Vec<String> = (1..=9).map(|i| format!(" Tag{} ", i)).collect();
    classifier.set(ClassificationResult {
        tags,
        summary: "s".repeat(400),
        ..verdict(MemoryKind::Fix, 0.9)
    });
    let entry = gate
        .evaluate("q2", "a2", session("s1"))
        .await
        .unwrap()
        .entry
        .unwrap();
    assert_eq!(entry.tags, vec!["tag1", "tag2", "tag3", "tag4", "tag5"]);
    assert_eq!(entry.content.chars().count(), 200);
}

#[tokio::test]
async fn test_excluded_kind_rejected() {
    let classifier = StubClassifier::important(MemoryKind::Error, 0.95);
    let store = StubStore::new();
    let config = AdmissionConfig {
        exclude_kinds: vec![MemoryKind::Error],
        ..AdmissionConfig::default()
    };
    let gate = gate(&classifier, &store, config);

    let outcome = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(!outcome.admitted);
    assert_eq!(classifier.calls(), 1);
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_disabled_gate_skips_classifier() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let config = AdmissionConfig {
        enabled: false,
        ..AdmissionConfig::default()
    };
    let gate = gate(&classifier, &store, config);

    for i in 0..3 {
        let outcome = gate
            .evaluate(&format!("q{}", i), "a", session("s1"))
            .await
            .unwrap();
        assert!(!outcome.admitted);
    }
    assert_eq!(classifier.calls(), 0);
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_expired_window_allows_resubmission() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    assert!(gate.evaluate("q", "a", session("s1")).await.unwrap().admitted);
    assert!(!gate.evaluate("q", "a", session("s1")).await.unwrap().admitted);

    assert_eq!(gate.expire_fingerprints(), 1);

    assert!(gate.evaluate("q", "a", session("s1")).await.unwrap().admitted);
    // Expiry leaves the session counters alone
    assert_eq!(gate.status().session_counts.get("s1"), Some(&2));
}

#[tokio::test]
async fn test_classifier_failure_is_a_rejection() {
    let classifier = StubClassifier::failing("upstream 500");
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let outcome = gate.evaluate("q", "a", session("s1")).await;
    assert_eq!(
        outcome.unwrap(),
        engram::AdmissionOutcome {
            admitted: false,
            entry: None
        }
    );
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_classifier_timeout_is_a_rejection() {
    let classifier =
        StubClassifier::slow(verdict(MemoryKind::Fix, 0.9), Duration::from_millis(500));
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default())
        .with_classifier_timeout(Duration::from_millis(20));

    let outcome = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(!outcome.admitted);
    assert!(store.saved().is_empty());
    assert!(gate.status().session_counts.is_empty());
}

#[tokio::test]
async fn test_store_failure_propagates_and_releases_reservation() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.9);
    let store = StubStore::new();
    store.fail_saves(true);
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let err = gate.evaluate("q", "a", session("s1")).await.unwrap_err();
    assert!(matches!(err, DomainError::Store(_)));
    assert!(gate.status().session_counts.is_empty());

    // Neither the fingerprint nor the quota slot was kept
    store.fail_saves(false);
    let retry = gate.evaluate("q", "a", session("s1")).await.unwrap();
    assert!(retry.admitted);
}

#[tokio::test]
async fn test_concurrent_duplicates_admit_once() {
    let classifier =
        StubClassifier::slow(verdict(MemoryKind::Fix, 0.9), Duration::from_millis(50));
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let (a, b, c) = tokio::join!(
        gate.evaluate("same question", "same answer", session("s1")),
        gate.evaluate("same question", "same answer", session("s2")),
        gate.evaluate("same question", "same answer", session("s3")),
    );

    let admitted = [a.unwrap(), b.unwrap(), c.unwrap()]
        .iter()
        .filter(|o| o.admitted)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(classifier.calls(), 1);
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn test_concurrent_quota_is_not_exceeded() {
    let classifier =
        StubClassifier::slow(verdict(MemoryKind::Fix, 0.9), Duration::from_millis(50));
    let store = StubStore::new();
    let config = AdmissionConfig {
        max_entries_per_session: 2,
        ..AdmissionConfig::default()
    };
    let gate = gate(&classifier, &store, config);

    let (a, b, c, d) = tokio::join!(
        gate.evaluate("q1", "a", session("s1")),
        gate.evaluate("q2", "a", session("s1")),
        gate.evaluate("q3", "a", session("s1")),
        gate.evaluate("q4", "a", session("s1")),
    );

    let admitted = [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()]
        .iter()
        .filter(|o| o.admitted)
        .count();
    assert_eq!(admitted, 2);
    assert_eq!(gate.status().session_counts.get("s1"), Some(&2));
}

#[tokio::test]
async fn test_config_update_applies_to_next_evaluation() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.8);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let update = engram::AdmissionConfigUpdate {
        min_confidence: Some(0.85),
        ..Default::default()
    };
    let config = gate.update_config(update).unwrap();
    assert_eq!(config.min_confidence, 0.85);
    assert_eq!(config.max_entries_per_session, 50);

    assert!(!gate.evaluate("q", "a", session("s1")).await.unwrap().admitted);
}

#[tokio::test]
async fn test_invalid_config_update_changes_nothing() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.8);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let update = engram::AdmissionConfigUpdate {
        enabled: Some(false),
        min_confidence: Some(1.5),
        ..Default::default()
    };
    let err = gate.update_config(update).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(gate.config(), AdmissionConfig::default());
}

#[tokio::test]
async fn test_swap_config_reports_previous_window() {
    let classifier = StubClassifier::important(MemoryKind::Fix, 0.8);
    let store = StubStore::new();
    let gate = gate(&classifier, &store, AdmissionConfig::default());

    let (previous, config) = gate
        .swap_config(engram::AdmissionConfigUpdate {
            deduplication_window_minutes: Some(45),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(previous, 30);
    assert_eq!(config.deduplication_window_minutes, 45);

    let (previous, _) = gate
        .swap_config(engram::AdmissionConfigUpdate::default())
        .unwrap();
    assert_eq!(previous, 45);
}

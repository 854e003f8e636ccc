//! End-to-end pipeline tests in the fully degraded configuration
//!
//! Every external collaborator (cache, warehouse, LLM, sometimes the
//! metadata store) is disabled; the orchestrator must still answer.

use std::sync::Arc;

use super::common::{create_test_db, offline_pipeline};
use crate::models::{DataSource, IntentType};
use crate::services::QueryRepository;
use crate::services::insight_service::derive_recommendations;
use crate::models::{Insight, InsightCategory};

#[tokio::test]
async fn valid_question_always_gets_an_envelope() {
    let repo = Arc::new(QueryRepository::new(create_test_db().await));
    let pipeline = offline_pipeline(Arc::clone(&repo));

    let envelope = pipeline
        .process("Compare sales across regions", Some("u1"))
        .await
        .expect("process");

    assert!(envelope.success);
    assert_eq!(envelope.intent.intent, IntentType::Comparison);
    assert_eq!(envelope.intent.confidence, 0.6);
    assert_eq!(envelope.insights.len(), 1);
    assert_eq!(envelope.insights[0].title, "General Business Analysis");
    assert!(envelope.visualizations.is_empty());
    assert!(!envelope.recommendations.is_empty());
}

#[tokio::test]
async fn fallback_insight_is_tagged_and_capped() {
    let repo = Arc::new(QueryRepository::new(create_test_db().await));
    let pipeline = offline_pipeline(repo);

    let envelope = pipeline
        .process("Why are shoe sales down in Paris stores this quarter?", Some("u1"))
        .await
        .unwrap();

    assert_eq!(envelope.intent.intent, IntentType::RootCause);
    let insight = &envelope.insights[0];
    assert!(insight.confidence_score <= 0.6);
    assert!(
        insight
            .data_sources
            .contains(&DataSource::Fallback.as_str().to_string())
    );
}

#[tokio::test]
async fn question_is_persisted_and_marked_processed() {
    let repo = Arc::new(QueryRepository::new(create_test_db().await));
    let pipeline = offline_pipeline(Arc::clone(&repo));

    let envelope = pipeline
        .process("Which products are overstocked?", None)
        .await
        .unwrap();

    assert!(envelope.query.id > 0);
    assert!(envelope.query.processed);

    let stored = repo.get(envelope.query.id).await.unwrap().expect("stored");
    assert!(stored.processed);
    assert_eq!(stored.response.as_deref(), Some("General Business Analysis"));
    assert_eq!(stored.text, "Which products are overstocked?");

    let insights = repo.insights_for(envelope.query.id).await.unwrap();
    assert_eq!(insights.len(), 1);
}

#[tokio::test]
async fn metadata_outage_degrades_to_in_memory_question() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));

    let envelope = pipeline
        .process("Compare sales across regions", None)
        .await
        .expect("still succeeds");

    assert!(envelope.success);
    assert_eq!(envelope.query.id, 0);
    assert!(envelope.query.processed);
    assert_eq!(envelope.insights.len(), 1);
}

#[tokio::test]
async fn normalization_collapses_whitespace_into_stored_text() {
    let repo = Arc::new(QueryRepository::new(create_test_db().await));
    let pipeline = offline_pipeline(Arc::clone(&repo));

    let envelope = pipeline
        .process("  Compare   sales\tacross \n regions  ", None)
        .await
        .unwrap();

    assert_eq!(envelope.query.text, "Compare sales across regions");
}

// ============================================================================
// Validation boundaries
// ============================================================================

#[tokio::test]
async fn two_char_question_is_rejected() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));

    let err = pipeline.process("hi", None).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn three_char_question_is_accepted() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));
    assert!(pipeline.process("kpi", None).await.is_ok());
}

#[tokio::test]
async fn question_at_2000_chars_is_accepted_and_2001_rejected() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));

    let ok = "a".repeat(2000);
    assert!(pipeline.process(&ok, None).await.is_ok());

    let too_long = "a".repeat(2001);
    let err = pipeline.process(&too_long, None).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn whitespace_only_question_is_rejected() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));
    let err = pipeline.process("   \t  \n ", None).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn oversized_user_tag_is_rejected() {
    let pipeline = offline_pipeline(Arc::new(QueryRepository::disabled()));
    let tag = "u".repeat(256);
    let err = pipeline
        .process("Compare sales across regions", Some(&tag))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

// ============================================================================
// Recommendation derivation
// ============================================================================

fn insight_with_actions(actions: &[&str]) -> Insight {
    Insight {
        title: "t".to_string(),
        description: "d".to_string(),
        category: InsightCategory::Recommendation,
        confidence_score: 0.7,
        data_sources: vec![],
        action_items: actions.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn recommendations_preserve_order_and_dedupe_case_insensitively() {
    let insights = vec![
        insight_with_actions(&["Restock Paris", "Review pricing"]),
        insight_with_actions(&["restock paris", "Audit suppliers"]),
    ];

    let recs = derive_recommendations(&insights);
    assert_eq!(recs, vec!["Restock Paris", "Review pricing", "Audit suppliers"]);
}

#[test]
fn empty_action_items_get_the_default_recommendations() {
    let insights = vec![insight_with_actions(&[])];
    let recs = derive_recommendations(&insights);
    assert_eq!(
        recs,
        vec!["Monitor trend continuation", "Consider implementing suggested actions"]
    );
}

#[test]
fn blank_action_items_are_skipped() {
    let insights = vec![insight_with_actions(&["  ", "Review pricing"])];
    let recs = derive_recommendations(&insights);
    assert_eq!(recs, vec!["Review pricing"]);
}

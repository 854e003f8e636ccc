//! Entity and tag-set tests

use crate::models::*;
use crate::utils::{fingerprint, normalize_question};

// ============================================================================
// Closed tag sets
// ============================================================================

#[test]
fn intent_tags_round_trip() {
    let tags = [
        "trend_analysis",
        "comparison",
        "prediction",
        "root_cause",
        "recommendation",
        "general_analysis",
    ];
    for tag in tags {
        let parsed = IntentType::parse_tag(tag).expect(tag);
        assert_eq!(parsed.as_str(), tag);
    }
    assert!(IntentType::parse_tag("shopping").is_none());
}

#[test]
fn intent_serde_uses_snake_case_tags() {
    let json = serde_json::to_string(&IntentType::RootCause).unwrap();
    assert_eq!(json, "\"root_cause\"");
    let back: IntentType = serde_json::from_str("\"trend_analysis\"").unwrap();
    assert_eq!(back, IntentType::TrendAnalysis);
}

#[test]
fn visualization_kinds_cover_the_closed_set() {
    assert_eq!(VisualizationKind::ALL.len(), 11);
    for kind in VisualizationKind::ALL {
        assert_eq!(VisualizationKind::parse_tag(kind.as_str()), Some(kind));
    }
    assert!(VisualizationKind::parse_tag("hologram").is_none());
}

#[test]
fn insight_categories_reject_intent_tags() {
    assert!(InsightCategory::parse_tag("trend").is_some());
    assert!(InsightCategory::parse_tag("summary").is_some());
    assert!(InsightCategory::parse_tag("general_analysis").is_none());
    assert!(InsightCategory::parse_tag("trend_analysis").is_none());
}

#[test]
fn data_source_tags_round_trip() {
    for tag in ["sales_data", "inventory_data", "customer_data", "business_metrics", "fallback"] {
        assert_eq!(DataSource::parse_tag(tag).map(|d| d.as_str()), Some(tag));
    }
}

// ============================================================================
// Entities
// ============================================================================

#[test]
fn query_intent_clamps_confidence() {
    let intent = QueryIntent::new(IntentType::Comparison, 1.7, vec![], vec![], vec![]);
    assert_eq!(intent.confidence, 1.0);

    let intent = QueryIntent::new(IntentType::Comparison, -0.2, vec![], vec![], vec![]);
    assert_eq!(intent.confidence, 0.0);
}

#[test]
fn insight_bounded_enforces_entity_limits() {
    let insight = Insight {
        title: "t".repeat(300),
        description: "d".repeat(3000),
        category: InsightCategory::Trend,
        confidence_score: 1.8,
        data_sources: (0..15).map(|i| format!("e{}", i)).collect(),
        action_items: (0..15).map(|i| format!("a{}", i)).collect(),
    }
    .bounded();

    assert_eq!(insight.title.len(), 200);
    assert_eq!(insight.description.len(), 2000);
    assert_eq!(insight.confidence_score, 1.0);
    assert_eq!(insight.data_sources.len(), 10);
    assert_eq!(insight.action_items.len(), 10);
}

#[test]
fn insight_bounded_cuts_multibyte_text_on_char_boundaries() {
    // 2-byte and 3-byte codepoints: a byte-indexed cut at 200/2000 would
    // land mid-codepoint and panic
    let insight = Insight {
        title: "é".repeat(250),
        description: "—".repeat(2100),
        category: InsightCategory::Summary,
        confidence_score: 0.5,
        data_sources: vec![],
        action_items: vec![],
    }
    .bounded();

    assert_eq!(insight.title.chars().count(), 200);
    assert_eq!(insight.description.chars().count(), 2000);
}

#[test]
fn in_memory_question_has_reserved_id() {
    let q = Question::in_memory("why".to_string(), None);
    assert_eq!(q.id, 0);
    assert!(!q.processed);
}

#[test]
fn context_metadata_matches_variant() {
    let ctx = DataContext::unmatched();
    assert_eq!(ctx.row_count(), 0);
    assert!(ctx.is_empty());
    assert_eq!(ctx.data_source(), DataSource::Fallback);

    let ctx = DataContext::Metrics { metrics: BusinessMetrics::default() };
    assert!(ctx.is_empty());
    assert_eq!(ctx.columns().len(), 6);

    let ctx = DataContext::Metrics {
        metrics: BusinessMetrics { total_revenue: 10.0, ..BusinessMetrics::default() },
    };
    assert!(!ctx.is_empty());
    assert_eq!(ctx.row_count(), 1);
}

#[test]
fn inventory_restock_threshold_is_inclusive() {
    let mut item = InventoryRecord {
        store: "Paris".to_string(),
        product: "Runner X".to_string(),
        current_stock: 20,
        reorder_level: 20,
        max_stock: 100,
        last_restocked: None,
        supplier: "Acme".to_string(),
        status: "active".to_string(),
    };
    assert!(item.needs_restock());

    item.current_stock = 21;
    assert!(!item.needs_restock());
}

// ============================================================================
// Fingerprinting
// ============================================================================

#[test]
fn equivalent_questions_share_a_fingerprint() {
    let a = fingerprint("Why are SALES down in   Paris?");
    let b = fingerprint("  why are sales down in Paris?  ");
    assert_eq!(a, b);
}

#[test]
fn normalized_text_fingerprints_to_itself() {
    let text = "Why are sales down in Paris?";
    let normalized = normalize_question(text);
    assert_eq!(fingerprint(text), fingerprint(&normalized));
}

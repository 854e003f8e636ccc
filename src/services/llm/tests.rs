//! LLM Gateway Unit Tests
//!
//! Covers the keyword fallback table, schema validation, pacing, and the
//! never-raise contract of the gateway.

use super::*;
use crate::config::LlmConfig;
use crate::models::intent::IntentType;
use std::time::{Duration, Instant};

fn disabled_config() -> LlmConfig {
    LlmConfig { api_key: String::new(), ..LlmConfig::default() }
}

/// Key present but nothing listening: every call fails fast at connect
fn unreachable_config(min_interval_ms: u64) -> LlmConfig {
    LlmConfig {
        api_key: "sk-test".to_string(),
        api_base: "http://127.0.0.1:9".to_string(),
        min_interval_ms,
        timeout_secs: 2,
        ..LlmConfig::default()
    }
}

// ============================================================================
// Keyword Fallback
// ============================================================================

mod keyword_fallback {
    use super::*;

    #[test]
    fn trend_keywords() {
        let resp = keyword_intent("Show me the sales pattern over time");
        assert_eq!(resp.intent, IntentType::TrendAnalysis.as_str());
    }

    #[test]
    fn comparison_keywords() {
        let resp = keyword_intent("Compare sales across regions");
        assert_eq!(resp.intent, IntentType::Comparison.as_str());
    }

    #[test]
    fn prediction_keywords() {
        let resp = keyword_intent("Forecast revenue for next quarter");
        assert_eq!(resp.intent, IntentType::Prediction.as_str());
    }

    #[test]
    fn root_cause_keywords() {
        let resp = keyword_intent("Why are shoe sales down in Paris?");
        assert_eq!(resp.intent, IntentType::RootCause.as_str());
    }

    #[test]
    fn recommendation_keywords() {
        let resp = keyword_intent("Suggest improvements for store layout");
        assert_eq!(resp.intent, IntentType::Recommendation.as_str());
    }

    #[test]
    fn unmatched_falls_back_to_general() {
        let resp = keyword_intent("Hello there");
        assert_eq!(resp.intent, IntentType::GeneralAnalysis.as_str());
    }

    #[test]
    fn fallback_shape_is_fixed() {
        let resp = keyword_intent("anything at all");
        assert_eq!(resp.confidence, 0.6);
        assert_eq!(resp.categories, vec!["sales", "performance"]);
        assert_eq!(resp.data_sources, vec!["sales_data"]);
        assert_eq!(resp.suggested_visualizations.len(), 11);
        assert!(resp.validate().is_ok());
    }

    #[test]
    fn first_matching_rule_wins() {
        // "trend" appears before "compare" in the rule table
        let resp = keyword_intent("compare the trend between stores");
        assert_eq!(resp.intent, IntentType::TrendAnalysis.as_str());
    }
}

// ============================================================================
// Schema Validation
// ============================================================================

mod schema_validation {
    use super::*;

    fn valid_intent_response() -> IntentResponse {
        IntentResponse {
            intent: "comparison".to_string(),
            confidence: 0.9,
            categories: vec!["sales".to_string()],
            data_sources: vec!["sales_data".to_string()],
            suggested_visualizations: vec!["bar_chart".to_string()],
        }
    }

    #[test]
    fn accepts_valid_intent_response() {
        assert!(valid_intent_response().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_intent_tag() {
        let mut resp = valid_intent_response();
        resp.intent = "shopping".to_string();
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut resp = valid_intent_response();
        resp.confidence = 1.4;
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_empty_data_sources() {
        let mut resp = valid_intent_response();
        resp.data_sources.clear();
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_unknown_visualization_kind() {
        let mut resp = valid_intent_response();
        resp.suggested_visualizations = vec!["hologram".to_string()];
        assert!(resp.validate().is_err());
    }

    #[test]
    fn parses_provider_json() {
        let raw = r#"{
            "intent": "root_cause",
            "confidence": 0.82,
            "categories": ["sales", "store_performance"],
            "data_sources": ["sales_data"],
            "suggested_visualizations": ["bar_chart", "stacked_bar_chart"]
        }"#;
        let resp: IntentResponse = serde_json::from_str(raw).expect("parse");
        assert!(resp.validate().is_ok());
        let intent = resp.into_intent();
        assert_eq!(intent.intent, IntentType::RootCause);
        assert_eq!(intent.suggested_visualizations.len(), 2);
    }

    fn payload(category: &str) -> InsightPayload {
        InsightPayload {
            title: "Revenue dip".to_string(),
            description: "Revenue fell 12% week over week".to_string(),
            category: category.to_string(),
            confidence: 0.8,
            action_items: vec!["Check pricing".to_string()],
            data_evidence: vec!["revenue -12%".to_string()],
        }
    }

    #[test]
    fn accepts_two_or_three_insights() {
        let resp = InsightResponse { insights: vec![payload("trend"), payload("anomaly")] };
        assert!(resp.validate().is_ok());

        let resp = InsightResponse {
            insights: vec![payload("trend"), payload("anomaly"), payload("summary")],
        };
        assert!(resp.validate().is_ok());
    }

    #[test]
    fn rejects_wrong_insight_count() {
        let resp = InsightResponse { insights: vec![payload("trend")] };
        assert!(resp.validate().is_err());

        let resp = InsightResponse { insights: vec![payload("trend"); 4] };
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_intent_tag_as_category() {
        // The source occasionally produced this; it is off-set here
        let resp =
            InsightResponse { insights: vec![payload("general_analysis"), payload("trend")] };
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_empty_title() {
        let mut bad = payload("trend");
        bad.title = "  ".to_string();
        let resp = InsightResponse { insights: vec![bad, payload("anomaly")] };
        assert!(resp.validate().is_err());
    }

    #[test]
    fn rejects_too_many_action_items() {
        let mut bad = payload("trend");
        bad.action_items = (0..11).map(|i| format!("step {}", i)).collect();
        let resp = InsightResponse { insights: vec![bad, payload("anomaly")] };
        assert!(resp.validate().is_err());
    }
}

// ============================================================================
// Gateway Behavior
// ============================================================================

mod gateway_behavior {
    use super::*;

    #[tokio::test]
    async fn disabled_gateway_degrades_to_keyword_intent() {
        let gateway = LlmGateway::new(disabled_config());
        assert!(!gateway.is_available());

        let outcome = gateway.classify_intent("Compare sales across regions").await;
        assert!(outcome.degraded);
        assert_eq!(outcome.response.intent, "comparison");
        assert_eq!(outcome.response.confidence, 0.6);
    }

    #[tokio::test]
    async fn disabled_gateway_degrades_to_fallback_insight() {
        let gateway = LlmGateway::new(disabled_config());

        let outcome = gateway
            .generate_insights("Compare sales across regions", "Sales Data: 0 records")
            .await;
        assert!(outcome.degraded);
        assert_eq!(outcome.response.insights.len(), 1);

        let insight = &outcome.response.insights[0];
        assert_eq!(insight.title, "General Business Analysis");
        assert_eq!(insight.category, "summary");
        assert_eq!(insight.confidence, 0.6);
        assert_eq!(
            insight.action_items,
            vec!["Review data regularly", "Monitor key metrics"]
        );
        assert_eq!(insight.data_evidence, vec!["Based on query analysis"]);
    }

    #[tokio::test]
    async fn disabled_gateway_spends_nothing() {
        let gateway = LlmGateway::new(disabled_config());
        gateway.classify_intent("why are sales down").await;
        gateway.generate_insights("why are sales down", "no data").await;

        let snapshot = gateway.cost_snapshot();
        assert_eq!(snapshot.request_count, 0);
        assert_eq!(snapshot.total_tokens, 0);
        assert_eq!(snapshot.total_cost_usd, 0.0);
    }

    #[tokio::test]
    async fn unreachable_provider_degrades_without_raising() {
        let gateway = LlmGateway::new(unreachable_config(0));

        let outcome = gateway.classify_intent("why are sales down").await;
        assert!(outcome.degraded);
        assert_eq!(outcome.response.intent, "root_cause");

        // Failed calls never reach the ledger
        assert_eq!(gateway.cost_snapshot().request_count, 0);
    }

    #[tokio::test]
    async fn requests_are_spaced_by_min_interval() {
        let gateway = LlmGateway::new(unreachable_config(200));

        let start = Instant::now();
        gateway.classify_intent("first question").await;
        gateway.classify_intent("second question").await;
        let elapsed = start.elapsed();

        // The second dispatch cannot leave before the first slot + interval
        assert!(
            elapsed >= Duration::from_millis(190),
            "expected >=190ms spacing, got {:?}",
            elapsed
        );
    }

    #[test]
    fn ledger_only_grows() {
        let mut ledger = CostLedger::default();
        ledger.record(500, 0.001);
        ledger.record(250, 0.0005);

        assert_eq!(ledger.total_tokens, 750);
        assert_eq!(ledger.request_count, 2);
        assert!((ledger.total_cost_usd - 0.0015).abs() < 1e-12);
    }
}

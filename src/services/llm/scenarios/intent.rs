//! Intent Classification Scenario
//!
//! Classifies a question into the closed intent set. The deterministic
//! keyword fallback lives here so the gateway can answer even when the
//! provider is gone.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::intent::{DataSource, IntentType, QueryIntent, VisualizationKind};
use crate::services::llm::gateway::{LlmRequest, LlmResponse};
use crate::utils::normalize_question;

const PROMPT: &str = r#"You are an intent classifier for a retail business-intelligence service.
Classify the user's question and answer with a single JSON object:

{
  "intent": one of "trend_analysis" | "comparison" | "prediction" | "root_cause" | "recommendation" | "general_analysis",
  "confidence": number between 0.0 and 1.0,
  "categories": non-empty array of topic tags such as "sales", "performance", "inventory", "customers", "store_performance",
  "data_sources": non-empty array drawn from "sales_data" | "inventory_data" | "customer_data" | "business_metrics",
  "suggested_visualizations": non-empty array drawn from "bar_chart" | "line_chart" | "pie_chart" | "doughnut_chart" | "scatter_plot" | "bubble_chart" | "radar_chart" | "horizontal_bar_chart" | "stacked_bar_chart" | "multi_line_chart" | "area_chart"
}

Rules:
- Pick exactly one intent tag. "why"-style questions are root_cause, "what will"-style questions are prediction.
- Use only the listed tags; never invent new ones.
- Answer with the JSON object only, no prose."#;

/// Keyword rows evaluated in order; first match wins
const KEYWORD_RULES: &[(&[&str], IntentType)] = &[
    (&["trend", "pattern", "over time"], IntentType::TrendAnalysis),
    (&["compare", "vs", "versus", "difference"], IntentType::Comparison),
    (&["predict", "forecast", "future"], IntentType::Prediction),
    (&["why", "cause", "reason"], IntentType::RootCause),
    (&["recommend", "suggest", "action"], IntentType::Recommendation),
];

/// Deterministic classification used when the provider is unavailable
pub fn keyword_intent(question: &str) -> IntentResponse {
    let lowered = question.to_lowercase();
    let intent = KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(_, intent)| *intent)
        .unwrap_or(IntentType::GeneralAnalysis);

    IntentResponse {
        intent: intent.as_str().to_string(),
        confidence: 0.6,
        categories: vec!["sales".to_string(), "performance".to_string()],
        data_sources: vec![DataSource::SalesData.as_str().to_string()],
        suggested_visualizations: VisualizationKind::ALL
            .iter()
            .map(|k| k.as_str().to_string())
            .collect(),
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct IntentClassifyRequest {
    pub question: String,
}

impl IntentClassifyRequest {
    pub fn new(question: &str) -> Self {
        Self { question: question.to_string() }
    }
}

impl LlmRequest for IntentClassifyRequest {
    type Response = IntentResponse;

    fn operation(&self) -> &'static str {
        "classify_intent"
    }

    fn system_prompt(&self) -> String {
        PROMPT.into()
    }

    fn user_prompt(&self) -> String {
        self.question.clone()
    }

    fn cache_key(&self) -> String {
        let mut h = DefaultHasher::new();
        normalize_question(&self.question).to_lowercase().hash(&mut h);
        format!("intent:{:x}", h.finish())
    }

    fn max_tokens(&self) -> u32 {
        300
    }

    fn temperature(&self) -> f64 {
        0.2
    }

    fn fallback(&self) -> IntentResponse {
        keyword_intent(&self.question)
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IntentResponse {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub suggested_visualizations: Vec<String>,
}

impl LlmResponse for IntentResponse {
    fn validate(&self) -> Result<(), String> {
        if IntentType::parse_tag(&self.intent).is_none() {
            return Err(format!("unknown intent tag '{}'", self.intent));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0, 1]", self.confidence));
        }
        if self.categories.is_empty() {
            return Err("categories must be non-empty".to_string());
        }
        if self.data_sources.is_empty() {
            return Err("data_sources must be non-empty".to_string());
        }
        for source in &self.data_sources {
            if DataSource::parse_tag(source).is_none() {
                return Err(format!("unknown data source tag '{}'", source));
            }
        }
        if self.suggested_visualizations.is_empty() {
            return Err("suggested_visualizations must be non-empty".to_string());
        }
        for kind in &self.suggested_visualizations {
            if VisualizationKind::parse_tag(kind).is_none() {
                return Err(format!("unknown visualization kind '{}'", kind));
            }
        }
        Ok(())
    }
}

impl IntentResponse {
    /// Convert the validated wire form into the domain type
    pub fn into_intent(self) -> QueryIntent {
        let intent = IntentType::parse_tag(&self.intent).unwrap_or(IntentType::GeneralAnalysis);
        let data_sources = self
            .data_sources
            .iter()
            .filter_map(|s| DataSource::parse_tag(s))
            .collect();
        let suggested_visualizations = self
            .suggested_visualizations
            .iter()
            .filter_map(|s| VisualizationKind::parse_tag(s))
            .collect();

        QueryIntent::new(
            intent,
            self.confidence,
            self.categories,
            data_sources,
            suggested_visualizations,
        )
    }
}

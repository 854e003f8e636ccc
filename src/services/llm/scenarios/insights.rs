//! Insight Generation Scenario
//!
//! Turns a question plus a data-context summary into grounded findings.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::question::{Insight, InsightCategory};
use crate::services::llm::gateway::{LlmRequest, LlmResponse};
use crate::utils::normalize_question;

const PROMPT: &str = r#"You are a senior retail business analyst. You receive a business question
and a data context extracted from the company warehouse. Produce findings
that are grounded in that context.

Answer with a single JSON object:

{
  "insights": [
    {
      "title": short finding headline (max 200 chars),
      "description": the finding, citing specific numbers from the provided data context (max 2000 chars),
      "category": one of "trend" | "anomaly" | "recommendation" | "prediction" | "correlation" | "summary",
      "confidence": number between 0.0 and 1.0,
      "action_items": up to 10 concrete, actionable next steps,
      "data_evidence": up to 10 short strings quoting the numbers you relied on
    }
  ]
}

Rules:
- Return 2 or 3 insights, never more, never fewer.
- Every description must cite at least one specific number from the data context.
- Keep action items concrete enough to hand to a store manager.
- Use only the listed category tags.
- Answer with the JSON object only, no prose."#;

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InsightGenerateRequest {
    pub question: String,
    pub context_summary: String,
}

impl InsightGenerateRequest {
    pub fn new(question: &str, context_summary: &str) -> Self {
        Self { question: question.to_string(), context_summary: context_summary.to_string() }
    }
}

impl LlmRequest for InsightGenerateRequest {
    type Response = InsightResponse;

    fn operation(&self) -> &'static str {
        "generate_insights"
    }

    fn system_prompt(&self) -> String {
        PROMPT.into()
    }

    fn user_prompt(&self) -> String {
        format!("Question: {}\n\nData context:\n{}", self.question, self.context_summary)
    }

    fn cache_key(&self) -> String {
        let mut h = DefaultHasher::new();
        normalize_question(&self.question).to_lowercase().hash(&mut h);
        self.context_summary.hash(&mut h);
        format!("insights:{:x}", h.finish())
    }

    fn max_tokens(&self) -> u32 {
        1024
    }

    fn temperature(&self) -> f64 {
        0.5
    }

    fn fallback(&self) -> InsightResponse {
        InsightResponse {
            insights: vec![InsightPayload {
                title: "General Business Analysis".to_string(),
                description: format!(
                    "No model-generated analysis is available for \"{}\". \
                     Review the underlying data directly and re-run the question later.",
                    self.question
                ),
                category: InsightCategory::Summary.as_str().to_string(),
                confidence: 0.6,
                action_items: vec![
                    "Review data regularly".to_string(),
                    "Monitor key metrics".to_string(),
                ],
                data_evidence: vec!["Based on query analysis".to_string()],
            }],
        }
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsightPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub data_evidence: Vec<String>,
}

impl InsightPayload {
    pub fn into_insight(self) -> Insight {
        Insight {
            title: self.title,
            description: self.description,
            category: InsightCategory::parse_tag(&self.category)
                .unwrap_or(InsightCategory::Summary),
            confidence_score: self.confidence,
            data_sources: self.data_evidence,
            action_items: self.action_items,
        }
        .bounded()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsightResponse {
    #[serde(default)]
    pub insights: Vec<InsightPayload>,
}

impl LlmResponse for InsightResponse {
    fn validate(&self) -> Result<(), String> {
        if !(2..=3).contains(&self.insights.len()) {
            return Err(format!("expected 2-3 insights, got {}", self.insights.len()));
        }
        for (i, insight) in self.insights.iter().enumerate() {
            if insight.title.trim().is_empty() {
                return Err(format!("insight {} has an empty title", i));
            }
            if insight.description.trim().is_empty() {
                return Err(format!("insight {} has an empty description", i));
            }
            if InsightCategory::parse_tag(&insight.category).is_none() {
                return Err(format!(
                    "insight {} has unknown category '{}'",
                    i, insight.category
                ));
            }
            if !(0.0..=1.0).contains(&insight.confidence) {
                return Err(format!(
                    "insight {} confidence {} outside [0, 1]",
                    i, insight.confidence
                ));
            }
            if insight.action_items.len() > 10 {
                return Err(format!("insight {} has more than 10 action items", i));
            }
            if insight.data_evidence.len() > 10 {
                return Err(format!("insight {} has more than 10 evidence entries", i));
            }
        }
        Ok(())
    }
}

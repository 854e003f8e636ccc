//! Insight Service - grounded findings and derived recommendations

use std::sync::Arc;

use crate::models::{DataSource, Insight};
use crate::services::llm::LlmGateway;

pub struct InsightService {
    gateway: Arc<LlmGateway>,
}

/// Insights plus how they were produced
pub struct InsightOutcome {
    pub insights: Vec<Insight>,
    pub degraded: bool,
}

impl InsightService {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Generate 1-3 insights for a question and its context summary.
    /// A degraded run yields the single fallback insight, tagged with the
    /// literal `fallback` data source.
    pub async fn generate(&self, question: &str, context_summary: &str) -> InsightOutcome {
        let outcome = self.gateway.generate_insights(question, context_summary).await;

        let mut insights: Vec<Insight> = outcome
            .response
            .insights
            .into_iter()
            .map(|payload| payload.into_insight())
            .collect();
        insights.truncate(3);

        if outcome.degraded {
            for insight in &mut insights {
                insight.confidence_score = insight.confidence_score.min(0.6);
                let tag = DataSource::Fallback.as_str().to_string();
                if !insight.data_sources.contains(&tag) {
                    insight.data_sources.push(tag);
                }
            }
        }

        InsightOutcome { insights, degraded: outcome.degraded }
    }
}

/// Flatten every action item into one recommendation list.
///
/// Order is preserved, duplicates are removed case-insensitively, and an
/// empty result gets two fixed defaults.
pub fn derive_recommendations(insights: &[Insight]) -> Vec<String> {
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut recommendations = Vec::new();

    for insight in insights {
        for item in &insight.action_items {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                recommendations.push(trimmed.to_string());
            }
        }
    }

    if recommendations.is_empty() {
        recommendations.push("Monitor trend continuation".to_string());
        recommendations.push("Consider implementing suggested actions".to_string());
    }

    recommendations
}

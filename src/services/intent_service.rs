//! Intent Service - cached classification of questions
//!
//! A cached intent bypasses the LLM gateway entirely; otherwise the
//! gateway answers (or falls back) and the result is cached for reuse.

use std::sync::Arc;

use crate::models::QueryIntent;
use crate::services::cache_service::{CacheService, TTL_INSIGHTS_SECS};
use crate::services::llm::LlmGateway;

pub struct IntentService {
    gateway: Arc<LlmGateway>,
    cache: Arc<CacheService>,
}

/// Intent plus how it was produced
pub struct IntentOutcome {
    pub intent: QueryIntent,
    pub degraded: bool,
    pub from_cache: bool,
}

impl IntentService {
    pub fn new(gateway: Arc<LlmGateway>, cache: Arc<CacheService>) -> Self {
        Self { gateway, cache }
    }

    /// Classify a question, preferring the cached classification
    pub async fn analyze(&self, question: &str, fingerprint: &str) -> IntentOutcome {
        let cache_key = CacheService::intent_key(fingerprint);

        if let Some(cached) = self.cache.get::<QueryIntent>(&cache_key).await {
            tracing::debug!("Intent cache hit for {}", cache_key);
            return IntentOutcome { intent: cached, degraded: false, from_cache: true };
        }

        let outcome = self.gateway.classify_intent(question).await;
        let intent = outcome.response.into_intent();

        // Degraded classifications stay uncached so a recovered provider
        // gets another shot
        if !outcome.degraded {
            self.cache.set(&cache_key, &intent, TTL_INSIGHTS_SECS).await;
        }

        IntentOutcome { intent, degraded: outcome.degraded, from_cache: false }
    }
}

//! LLM Gateway - the single outbound channel to the model provider
//!
//! Wraps the HTTP client with request pacing, cost accounting, and
//! structured-output validation. The gateway never raises past its
//! boundary: every failure class resolves to the scenario's
//! deterministic fallback, flagged as degraded.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::client::LlmClient;
use super::models::{CostLedger, CostSnapshot, LlmError};
use super::scenarios::insights::{InsightGenerateRequest, InsightResponse};
use super::scenarios::intent::{IntentClassifyRequest, IntentResponse};
use crate::config::LlmConfig;

// ============================================================================
// Scenario Traits
// ============================================================================

/// One outbound LLM call. Implemented by each scenario.
pub trait LlmRequest: Serialize + Send + Sync {
    type Response: LlmResponse;

    /// Operation name for logging
    fn operation(&self) -> &'static str;

    /// System prompt for this scenario
    fn system_prompt(&self) -> String;

    /// User message body
    fn user_prompt(&self) -> String;

    /// Stable key for deduplication and log correlation
    fn cache_key(&self) -> String;

    /// Completion cap for this scenario
    fn max_tokens(&self) -> u32;

    /// Sampling temperature for this scenario
    fn temperature(&self) -> f64;

    /// Deterministic substitute computed from the input alone
    fn fallback(&self) -> Self::Response;
}

/// A structured scenario response. `validate` is the single source of
/// truth for the schema; anything it rejects takes the fallback path.
pub trait LlmResponse: DeserializeOwned + Serialize + Send + Sync {
    fn validate(&self) -> Result<(), String>;
}

/// Scenario result with degradation metadata
#[derive(Debug, Clone)]
pub struct LlmOutcome<T> {
    pub response: T,
    /// True when the deterministic fallback answered instead of the provider
    pub degraded: bool,
}

// ============================================================================
// Gateway
// ============================================================================

pub struct LlmGateway {
    client: LlmClient,
    config: LlmConfig,
    ledger: Mutex<CostLedger>,
    /// Earliest instant the next request may leave the process.
    /// The wait window is computed under this lock; sleeping happens outside it.
    next_slot: tokio::sync::Mutex<Option<Instant>>,
}

impl LlmGateway {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: LlmClient::new(),
            config,
            ledger: Mutex::new(CostLedger::default()),
            next_slot: tokio::sync::Mutex::new(None),
        }
    }

    /// Create with custom client (for testing)
    pub fn with_client(config: LlmConfig, client: LlmClient) -> Self {
        Self {
            client,
            config,
            ledger: Mutex::new(CostLedger::default()),
            next_slot: tokio::sync::Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn cost_snapshot(&self) -> CostSnapshot {
        let ledger = self.ledger.lock().expect("ledger mutex poisoned");
        CostSnapshot::from(&*ledger)
    }

    /// Classify a question into the closed intent set
    pub async fn classify_intent(&self, question: &str) -> LlmOutcome<IntentResponse> {
        self.request(&IntentClassifyRequest::new(question)).await
    }

    /// Generate grounded insights for a question and its data context
    pub async fn generate_insights(
        &self,
        question: &str,
        context_summary: &str,
    ) -> LlmOutcome<InsightResponse> {
        self.request(&InsightGenerateRequest::new(question, context_summary))
            .await
    }

    /// Run a scenario request. Never fails: all error classes resolve to
    /// the scenario fallback.
    pub async fn request<R: LlmRequest>(&self, request: &R) -> LlmOutcome<R::Response> {
        match self.try_request(request).await {
            Ok(response) => LlmOutcome { response, degraded: false },
            Err(e) => {
                tracing::warn!(
                    "LLM {} failed ({}); using deterministic fallback",
                    request.operation(),
                    e
                );
                LlmOutcome { response: request.fallback(), degraded: true }
            },
        }
    }

    async fn try_request<R: LlmRequest>(&self, request: &R) -> Result<R::Response, LlmError> {
        if !self.is_available() {
            return Err(LlmError::Disabled);
        }

        self.pace().await;

        let cache_key = request.cache_key();
        tracing::debug!("LLM {} dispatch, key {}", request.operation(), cache_key);

        let start = Instant::now();
        let (content, input_tokens, output_tokens) = self
            .client
            .chat_completion(
                &self.config,
                &request.system_prompt(),
                &request.user_prompt(),
                request.max_tokens(),
                request.temperature(),
            )
            .await?;
        let latency_ms = start.elapsed().as_millis();

        let response: R::Response = serde_json::from_str(&content).map_err(|e| {
            LlmError::ParseError(format!("failed to parse {} response: {}", request.operation(), e))
        })?;

        response.validate().map_err(LlmError::SchemaViolation)?;

        let tokens = (input_tokens + output_tokens).max(0) as u64;
        let cost_usd = tokens as f64 * self.config.cost_per_1k_tokens / 1000.0;
        {
            let mut ledger = self.ledger.lock().expect("ledger mutex poisoned");
            ledger.record(tokens, cost_usd);
        }

        tracing::info!(
            "LLM {} ok: {} tokens, ${:.6}, {}ms",
            request.operation(),
            tokens,
            cost_usd,
            latency_ms
        );

        Ok(response)
    }

    /// Enforce the minimum inter-request spacing (single-slot, no burst).
    /// Each caller claims the next free slot under the lock and sleeps
    /// until it outside the lock.
    async fn pace(&self) {
        let interval = Duration::from_millis(self.config.min_interval_ms);
        if interval.is_zero() {
            return;
        }

        let wait = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            match *next_slot {
                Some(slot) if slot > now => {
                    *next_slot = Some(slot + interval);
                    slot - now
                },
                _ => {
                    *next_slot = Some(now + interval);
                    Duration::ZERO
                },
            }
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

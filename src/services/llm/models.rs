//! LLM Data Models
//!
//! Error types and the process-wide cost ledger for the outbound channel.

use serde::Serialize;
use utoipa::ToSchema;

/// LLM service errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("LLM response parsing error: {0}")]
    ParseError(String),

    #[error("LLM response violated the declared schema: {0}")]
    SchemaViolation(String),

    #[error("LLM timeout after {0}s")]
    Timeout(u64),

    #[error("LLM rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("LLM gateway disabled (no API key configured)")]
    Disabled,
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::RateLimited(_) | Self::ApiError(_))
    }
}

/// Cumulative spend counters, guarded by the gateway's mutex
#[derive(Debug, Default, Clone)]
pub struct CostLedger {
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub request_count: u64,
}

impl CostLedger {
    /// Record one successful call. Counters only ever grow.
    pub fn record(&mut self, tokens: u64, cost_usd: f64) {
        self.total_tokens += tokens;
        self.total_cost_usd += cost_usd.max(0.0);
        self.request_count += 1;
    }
}

/// Ledger snapshot exposed on the status endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CostSnapshot {
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub request_count: u64,
}

impl From<&CostLedger> for CostSnapshot {
    fn from(ledger: &CostLedger) -> Self {
        Self {
            total_cost_usd: ledger.total_cost_usd,
            total_tokens: ledger.total_tokens,
            request_count: ledger.request_count,
        }
    }
}

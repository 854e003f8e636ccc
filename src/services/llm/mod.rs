//! LLM Service Module
//!
//! The single outbound channel to the model provider. Scenarios declare
//! their prompt, caps, and deterministic fallback; the gateway owns
//! pacing, cost accounting, and schema validation.
//!
//! # Supported Scenarios
//! - Intent classification
//! - Insight generation

mod client;
mod gateway;
mod models;
mod scenarios;

// Re-exports for external use
pub use gateway::{LlmGateway, LlmOutcome, LlmRequest, LlmResponse};
pub use models::{CostLedger, CostSnapshot, LlmError};
pub use scenarios::insights::{InsightGenerateRequest, InsightPayload, InsightResponse};
pub use scenarios::intent::{IntentClassifyRequest, IntentResponse, keyword_intent};

#[allow(unused_imports)]
pub(crate) use client::LlmClient;

#[cfg(test)]
mod tests;

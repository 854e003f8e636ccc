//! Prism Library
//!
//! This library contains all the core modules for the Prism
//! natural-language business-intelligence service.

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::llm::{LlmError, LlmGateway};
pub use services::{
    CacheService, ContextService, InsightService, IntentService, PipelineService, QueryEnvelope,
    QueryRepository, WarehouseService,
};

/// Application shared state
///
/// Design Philosophy: Keep it simple - Rust's type system IS our DI container.
/// All services are wrapped in Arc for cheap cloning and thread safety.
#[derive(Clone)]
pub struct AppState {
    pub cache_service: Arc<CacheService>,
    pub warehouse_service: Arc<WarehouseService>,
    pub query_repository: Arc<QueryRepository>,
    pub llm_gateway: Arc<LlmGateway>,
    pub pipeline_service: Arc<PipelineService>,
}

#[cfg(test)]
mod tests;

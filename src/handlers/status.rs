//! Status API Handlers
//!
//! Observability endpoints: LLM gateway state with the cost ledger, and
//! cache statistics.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;
use crate::services::cache_service::CacheStatsSnapshot;
use crate::services::llm::CostSnapshot;

#[derive(Debug, Serialize, ToSchema)]
pub struct LlmStatusResponse {
    pub enabled: bool,
    pub model: String,
    pub cost: CostSnapshot,
}

/// Get LLM gateway status and cumulative spend
/// GET /api/llm/status
#[utoipa::path(
    get,
    path = "/api/llm/status",
    responses((status = 200, description = "Gateway status", body = LlmStatusResponse)),
    tag = "Status"
)]
pub async fn get_llm_status(State(state): State<Arc<AppState>>) -> Json<LlmStatusResponse> {
    Json(LlmStatusResponse {
        enabled: state.llm_gateway.is_available(),
        model: state.llm_gateway.model().to_string(),
        cost: state.llm_gateway.cost_snapshot(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheStatusResponse {
    pub enabled: bool,
    pub stats: CacheStatsSnapshot,
}

/// Get cache statistics
/// GET /api/cache/stats
#[utoipa::path(
    get,
    path = "/api/cache/stats",
    responses((status = 200, description = "Cache statistics", body = CacheStatusResponse)),
    tag = "Status"
)]
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatusResponse> {
    Json(CacheStatusResponse {
        enabled: state.cache_service.is_enabled(),
        stats: state.cache_service.stats(),
    })
}

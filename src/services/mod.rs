pub mod cache_service;
pub mod context_service;
pub mod insight_service;
pub mod intent_service;
pub mod llm;
pub mod pipeline_service;
pub mod query_repository;
pub mod visualization_service;
pub mod warehouse_service;

pub use cache_service::{CacheService, CacheStatsSnapshot};
pub use context_service::{ContextService, format_amount, format_summary};
pub use insight_service::{InsightService, derive_recommendations};
pub use intent_service::IntentService;
pub use llm::{CostSnapshot, LlmError, LlmGateway};
pub use pipeline_service::{PipelineService, QueryEnvelope};
pub use query_repository::QueryRepository;
pub use visualization_service::VisualizationService;
pub use warehouse_service::{AggregateGrain, AggregateSpec, WarehouseService};

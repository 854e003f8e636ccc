use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prism::config::Config;
use prism::services::{
    CacheService, ContextService, InsightService, IntentService, LlmGateway, PipelineService,
    QueryRepository, WarehouseService,
};
use prism::{AppState, db, handlers};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);

    let registry = tracing_subscriber::registry().with(log_filter);

    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("prism.log");

        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!("Prism starting up");
    tracing::info!("Configuration loaded successfully");

    let query_repository = if config.database.url.is_empty() {
        tracing::warn!("Metadata database not configured; questions will not be persisted");
        Arc::new(QueryRepository::disabled())
    } else {
        match db::create_pool(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                tracing::info!("Metadata database pool created successfully");
                Arc::new(QueryRepository::new(pool))
            },
            Err(e) => {
                tracing::warn!(
                    "Metadata database unavailable ({}); questions will not be persisted",
                    e
                );
                Arc::new(QueryRepository::disabled())
            },
        }
    };

    let cache_service = Arc::new(CacheService::new(
        &config.cache.url,
        config.cache.timeout_ms,
        config.cache.default_ttl_secs,
    ));
    let warehouse_service =
        Arc::new(WarehouseService::new(&config.warehouse.url, config.warehouse.pool_size));
    let llm_gateway = Arc::new(LlmGateway::new(config.llm.clone()));
    tracing::info!(
        "LLM gateway initialized (enabled: {}, model: {})",
        llm_gateway.is_available(),
        llm_gateway.model()
    );

    let pipeline_service = Arc::new(PipelineService::new(
        Arc::clone(&cache_service),
        Arc::clone(&query_repository),
        IntentService::new(Arc::clone(&llm_gateway), Arc::clone(&cache_service)),
        ContextService::new(Arc::clone(&warehouse_service)),
        InsightService::new(Arc::clone(&llm_gateway)),
        Arc::clone(&llm_gateway),
        Duration::from_secs(config.request.timeout_secs),
    ));

    let app_state = Arc::new(AppState {
        cache_service,
        warehouse_service,
        query_repository,
        llm_gateway,
        pipeline_service,
    });

    let api_routes = Router::new()
        .route(
            "/api/questions",
            post(handlers::query::process_question).get(handlers::query::list_questions),
        )
        .route("/api/questions/:id", get(handlers::query::get_question))
        .route("/api/questions/:id/insights", get(handlers::query::get_question_insights))
        .route("/api/llm/status", get(handlers::status::get_llm_status))
        .route("/api/cache/stats", get(handlers::status::get_cache_stats))
        .with_state(app_state);

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check));

    let app = Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Prism is ready to serve requests");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}

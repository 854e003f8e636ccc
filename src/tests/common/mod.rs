// Common test utilities and helpers

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::db;
use crate::models::{
    BusinessMetrics, CustomerRecord, DataContext, InventoryRecord, SalesRecord,
};
use crate::services::{
    CacheService, ContextService, InsightService, IntentService, LlmGateway, PipelineService,
    QueryRepository,
};

/// Create an in-memory SQLite database with the metadata schema applied
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    db::init_schema(&pool)
        .await
        .expect("Failed to initialize schema");

    pool
}

/// Pipeline with every external collaborator disabled: no cache backend,
/// no warehouse, no LLM key. This is the fully degraded configuration
/// the service must still answer in.
pub fn offline_pipeline(repository: Arc<QueryRepository>) -> PipelineService {
    let cache = Arc::new(CacheService::disabled());
    let warehouse = Arc::new(crate::services::WarehouseService::disabled());
    let gateway = Arc::new(LlmGateway::new(LlmConfig {
        api_key: String::new(),
        ..LlmConfig::default()
    }));

    PipelineService::new(
        Arc::clone(&cache),
        repository,
        IntentService::new(Arc::clone(&gateway), Arc::clone(&cache)),
        ContextService::new(warehouse),
        InsightService::new(Arc::clone(&gateway)),
        gateway,
        Duration::from_secs(30),
    )
}

pub fn sales_record(date: &str, store: &str, product: &str, revenue: f64, profit: f64) -> SalesRecord {
    SalesRecord {
        date: date.to_string(),
        store: store.to_string(),
        product: product.to_string(),
        category: "Footwear".to_string(),
        quantity_sold: 10,
        revenue,
        cost: revenue - profit,
        profit,
        region: "EMEA".to_string(),
    }
}

pub fn sales_context(records: Vec<SalesRecord>) -> DataContext {
    let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();
    let margin_pct = total_profit / total_revenue.max(1.0) * 100.0;

    let mut totals: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    for r in &records {
        *totals.entry(r.product.clone()).or_insert(0.0) += r.revenue;
    }
    let mut top_products: Vec<(String, f64)> = totals.into_iter().collect();
    top_products.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
    top_products.truncate(5);

    let mut totals: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    for r in &records {
        *totals.entry(r.store.clone()).or_insert(0.0) += r.revenue;
    }
    let mut top_stores: Vec<(String, f64)> = totals.into_iter().collect();
    top_stores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
    top_stores.truncate(3);

    DataContext::Sales { records, total_revenue, total_profit, margin_pct, top_products, top_stores }
}

pub fn inventory_record(store: &str, product: &str, stock: i64, reorder: i64) -> InventoryRecord {
    InventoryRecord {
        store: store.to_string(),
        product: product.to_string(),
        current_stock: stock,
        reorder_level: reorder,
        max_stock: 500,
        last_restocked: Some("2025-06-01".to_string()),
        supplier: "Acme Supply".to_string(),
        status: "active".to_string(),
    }
}

pub fn inventory_context(items: Vec<InventoryRecord>) -> DataContext {
    let total_stock: i64 = items.iter().map(|i| i.current_stock).sum();
    let low_stock: Vec<InventoryRecord> =
        items.iter().filter(|i| i.needs_restock()).cloned().collect();
    DataContext::Inventory { items, total_stock, low_stock }
}

pub fn customer_record(name: &str, segment: &str, purchases: i64, spent: f64) -> CustomerRecord {
    CustomerRecord {
        customer_id: format!("c-{}", name.to_lowercase()),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        region: "EMEA".to_string(),
        age_group: segment.to_string(),
        total_purchases: purchases,
        total_spent: spent,
        last_purchase: Some("2025-07-01".to_string()),
        preferred_store: "Paris".to_string(),
        preferred_category: "Footwear".to_string(),
    }
}

pub fn customer_context(customers: Vec<CustomerRecord>) -> DataContext {
    let total_purchases: i64 = customers.iter().map(|c| c.total_purchases).sum();
    let avg_purchases = total_purchases as f64 / customers.len().max(1) as f64;
    DataContext::Customers { customers, total_purchases, avg_purchases }
}

pub fn metrics_context() -> DataContext {
    DataContext::Metrics {
        metrics: BusinessMetrics {
            total_revenue: 1_250_000.0,
            total_profit: 300_000.0,
            profit_margin: 24.0,
            customer_count: 4821,
            avg_order_value: 86.5,
            inventory_turnover: 3.4,
        },
    }
}

//! Context retrieval and summary rendering tests
//!
//! `format_summary` feeds the insight prompt, so its exact output is
//! pinned here.

use std::sync::Arc;

use super::common::*;
use crate::models::{DataContext, DataSource, DynamicTable};
use crate::services::llm::keyword_intent;
use crate::services::{ContextService, WarehouseService, format_amount, format_summary};

fn offline_service() -> ContextService {
    ContextService::new(Arc::new(WarehouseService::disabled()))
}

// ============================================================================
// Keyword routing
// ============================================================================

#[tokio::test]
async fn sales_keywords_route_to_sales_context() {
    let service = offline_service();
    let intent = keyword_intent("why are shoe sales down").into_intent();

    let (context, _) = service.retrieve("why are shoe sales down", &intent).await;
    assert!(matches!(context, DataContext::Sales { .. }));
    assert_eq!(context.data_source(), DataSource::SalesData);
}

#[tokio::test]
async fn inventory_keywords_route_to_inventory_context() {
    let service = offline_service();
    let intent = keyword_intent("which products are overstocked?").into_intent();

    // "products" also matches the sales bucket; stock questions must
    // still land on inventory
    let (context, _) = service
        .retrieve("which products are overstocked?", &intent)
        .await;
    assert!(matches!(context, DataContext::Inventory { .. }));
}

#[tokio::test]
async fn customer_keywords_route_to_customer_context() {
    let service = offline_service();
    let intent = keyword_intent("how do customer segments differ").into_intent();

    let (context, _) = service
        .retrieve("how do customer segments differ", &intent)
        .await;
    assert!(matches!(context, DataContext::Customers { .. }));
}

#[tokio::test]
async fn metrics_keywords_route_to_metrics_context() {
    let service = offline_service();
    let intent = keyword_intent("give me a kpi overview").into_intent();

    let (context, _) = service.retrieve("give me a kpi overview", &intent).await;
    assert!(matches!(context, DataContext::Metrics { .. }));
}

#[tokio::test]
async fn inventory_terms_outrank_the_sales_bucket() {
    let service = offline_service();
    let intent = keyword_intent("store stock situation").into_intent();

    let (context, _) = service.retrieve("store stock situation", &intent).await;
    assert!(matches!(context, DataContext::Inventory { .. }));
}

#[tokio::test]
async fn sales_bucket_wins_over_customer_and_metrics_terms() {
    let service = offline_service();
    let intent = keyword_intent("revenue per customer segment").into_intent();

    let (context, _) = service
        .retrieve("revenue per customer segment", &intent)
        .await;
    assert!(matches!(context, DataContext::Sales { .. }));
}

#[tokio::test]
async fn unmatched_question_yields_empty_dynamic_context() {
    let service = offline_service();
    let intent = keyword_intent("tell me something interesting").into_intent();

    let (context, summary) = service
        .retrieve("tell me something interesting", &intent)
        .await;
    assert!(matches!(context, DataContext::Dynamic { .. }));
    assert!(context.is_empty());
    assert!(summary.contains("no matched source"));
}

#[tokio::test]
async fn disabled_warehouse_produces_empty_sales_context() {
    let service = offline_service();
    let intent = keyword_intent("show revenue").into_intent();

    let (context, _) = service.retrieve("show revenue", &intent).await;
    assert!(context.is_empty());
    assert_eq!(context.row_count(), 0);
}

// ============================================================================
// Summary rendering
// ============================================================================

#[test]
fn sales_summary_contains_totals_and_top_lists() {
    let context = sales_context(vec![
        sales_record("2025-07-01", "Paris", "Runner X", 1200.0, 300.0),
        sales_record("2025-07-01", "Lyon", "Runner X", 800.0, 200.0),
        sales_record("2025-07-02", "Paris", "Trail Pro", 2500.0, 900.0),
    ]);

    let summary = format_summary(&context);
    assert!(summary.starts_with("Sales Data: 3 records"));
    assert!(summary.contains("Total Revenue: $4,500.00"));
    assert!(summary.contains("Total Profit: $1,400.00"));
    assert!(summary.contains("Margin: 31.1%"));
    assert!(summary.contains("Trail Pro: $2,500.00"));
    assert!(summary.contains("Paris: $3,700.00"));
    assert!(summary.contains("2025-07-01: Runner X at Paris - Qty: 10"));
}

#[test]
fn inventory_summary_lists_low_stock_alerts() {
    let context = inventory_context(vec![
        inventory_record("Paris", "Runner X", 5, 20),
        inventory_record("Lyon", "Trail Pro", 300, 50),
    ]);

    let summary = format_summary(&context);
    assert!(summary.contains("2 positions"));
    assert!(summary.contains("Total Stock: 305 units"));
    assert!(summary.contains("Low Stock Items: 1"));
    assert!(summary.contains("Runner X at Paris: 5 units (reorder level: 20)"));
}

#[test]
fn customer_summary_has_totals_and_samples_without_email() {
    let context = customer_context(vec![
        customer_record("Alice", "25-34", 12, 930.5),
        customer_record("Bob", "35-44", 4, 210.0),
    ]);

    let summary = format_summary(&context);
    assert!(summary.contains("2 customers"));
    assert!(summary.contains("Total Purchases: 16"));
    assert!(summary.contains("Average Purchases: 8.0"));
    assert!(summary.contains("Alice (EMEA, 25-34): 12 purchases, $930.50 spent"));
    // Customer PII stays out of prompts and logs
    assert!(!summary.contains("@example.com"));
}

#[test]
fn metrics_summary_is_a_six_field_block() {
    let summary = format_summary(&metrics_context());
    assert!(summary.contains("Total Revenue: $1,250,000.00"));
    assert!(summary.contains("Profit Margin: 24.0%"));
    assert!(summary.contains("Customer Count: 4821"));
    assert!(summary.contains("Average Order Value: $86.50"));
    assert!(summary.contains("Inventory Turnover: 3.40"));
}

#[test]
fn dynamic_summary_formats_numeric_cells() {
    let context = DataContext::Dynamic {
        table: DynamicTable {
            columns: vec!["store".to_string(), "revenue".to_string()],
            rows: vec![
                vec!["Paris".to_string(), "1234.5".to_string()],
                vec!["Lyon".to_string(), "980".to_string()],
            ],
            source: "sales_by_store_daily (last 7 days)".to_string(),
        },
    };

    let summary = format_summary(&context);
    assert!(summary.contains("store: Paris, revenue: 1,234.50"));
    assert!(summary.contains("store: Lyon, revenue: 980.00"));
}

#[test]
fn summary_is_capped_with_tail_ellipsis() {
    let long_cell = "x".repeat(300);
    let context = DataContext::Dynamic {
        table: DynamicTable {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: (0..10)
                .map(|_| vec![long_cell.clone(), long_cell.clone()])
                .collect(),
            source: "wide rows".to_string(),
        },
    };

    let summary = format_summary(&context);
    assert_eq!(summary.chars().count(), 4000);
    assert!(summary.ends_with("..."));
    // Head survives, tail is trimmed
    assert!(summary.starts_with("Dynamic Data (wide rows): 10 rows"));
}

#[test]
fn summary_is_deterministic() {
    let context = sales_context(vec![
        sales_record("2025-07-01", "Paris", "Runner X", 1200.0, 300.0),
        sales_record("2025-07-02", "Lyon", "Trail Pro", 900.0, 250.0),
    ]);
    assert_eq!(format_summary(&context), format_summary(&context));
}

// ============================================================================
// Amount formatting
// ============================================================================

#[test]
fn amounts_get_thousand_separators_and_two_decimals() {
    assert_eq!(format_amount(0.0), "0.00");
    assert_eq!(format_amount(7.5), "7.50");
    assert_eq!(format_amount(999.999), "1,000.00");
    assert_eq!(format_amount(1234.5), "1,234.50");
    assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
    assert_eq!(format_amount(-4200.0), "-4,200.00");
}

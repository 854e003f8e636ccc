//! Context Service - picks and fetches the grounding data for a question
//!
//! Keyword routing over the warehouse families, then a deterministic,
//! bounded text rendering of whatever was fetched. `format_summary` is a
//! pure function; the LLM prompt depends on its exact output.

use std::sync::Arc;

use crate::models::{DataContext, QueryIntent};
use crate::services::warehouse_service::WarehouseService;

/// Days of sales history fetched for sales questions
const SALES_WINDOW_DAYS: i64 = 30;
/// Customer page size for customer questions
const CUSTOMER_LIMIT: i64 = 100;
/// Hard cap on the rendered summary, in characters
const SUMMARY_MAX_CHARS: usize = 4000;

const SALES_KEYWORDS: [&str; 5] = ["sale", "revenue", "profit", "product", "store"];
const INVENTORY_KEYWORDS: [&str; 4] = ["inventory", "stock", "restock", "reorder"];
const CUSTOMER_KEYWORDS: [&str; 3] = ["customer", "segment", "purchase"];
const METRICS_KEYWORDS: [&str; 4] = ["metric", "kpi", "performance", "summary"];

pub struct ContextService {
    warehouse: Arc<WarehouseService>,
}

impl ContextService {
    pub fn new(warehouse: Arc<WarehouseService>) -> Self {
        Self { warehouse }
    }

    /// Fetch the grounding context for a question.
    ///
    /// First matching family wins. Inventory terms are probed before the
    /// sales bucket: "product"/"store" appear in stock questions too, and
    /// a stock question grounded in sales rows answers the wrong thing.
    /// The intent is currently advisory (the keyword families mirror its
    /// data sources) but kept in the signature so routing can weigh it later.
    pub async fn retrieve(&self, question: &str, _intent: &QueryIntent) -> (DataContext, String) {
        let lowered = question.to_lowercase();

        let context = if contains_any(&lowered, &INVENTORY_KEYWORDS) {
            self.inventory_context().await
        } else if contains_any(&lowered, &SALES_KEYWORDS) {
            self.sales_context().await
        } else if contains_any(&lowered, &CUSTOMER_KEYWORDS) {
            self.customer_context().await
        } else if contains_any(&lowered, &METRICS_KEYWORDS) {
            DataContext::Metrics { metrics: self.warehouse.metrics().await }
        } else {
            tracing::debug!("No data-source keywords matched; returning empty dynamic context");
            DataContext::unmatched()
        };

        let summary = format_summary(&context);
        (context, summary)
    }

    async fn sales_context(&self) -> DataContext {
        let records = self.warehouse.sales(SALES_WINDOW_DAYS).await;

        let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
        let total_profit: f64 = records.iter().map(|r| r.profit).sum();
        let margin_pct = total_profit / total_revenue.max(1.0) * 100.0;

        DataContext::Sales {
            top_products: top_by_revenue(&records, 5, |r| &r.product),
            top_stores: top_by_revenue(&records, 3, |r| &r.store),
            records,
            total_revenue,
            total_profit,
            margin_pct,
        }
    }

    async fn inventory_context(&self) -> DataContext {
        let items = self.warehouse.inventory().await;

        let total_stock: i64 = items.iter().map(|i| i.current_stock).sum();
        let low_stock: Vec<_> = items.iter().filter(|i| i.needs_restock()).cloned().collect();

        DataContext::Inventory { items, total_stock, low_stock }
    }

    async fn customer_context(&self) -> DataContext {
        let customers = self.warehouse.customers(CUSTOMER_LIMIT).await;

        let total_purchases: i64 = customers.iter().map(|c| c.total_purchases).sum();
        let avg_purchases = total_purchases as f64 / customers.len().max(1) as f64;

        DataContext::Customers { customers, total_purchases, avg_purchases }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Revenue totals per dimension value, top N, highest first.
/// Ties break on the label so the output is stable.
fn top_by_revenue<F>(
    records: &[crate::models::SalesRecord],
    n: usize,
    dimension: F,
) -> Vec<(String, f64)>
where
    F: Fn(&crate::models::SalesRecord) -> &String,
{
    let mut totals: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    for record in records {
        *totals.entry(dimension(record).clone()).or_insert(0.0) += record.revenue;
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(n);
    ranked
}

/// Render a context as the bounded text block fed to the insight prompt.
///
/// Deterministic for a given context; capped at 4000 characters with a
/// tail-trimmed ellipsis.
pub fn format_summary(context: &DataContext) -> String {
    let text = match context {
        DataContext::Sales {
            records,
            total_revenue,
            total_profit,
            margin_pct,
            top_products,
            top_stores,
        } => {
            let mut out = format!(
                "Sales Data: {} records, Total Revenue: ${}, Total Profit: ${}, Margin: {:.1}%\n",
                records.len(),
                format_amount(*total_revenue),
                format_amount(*total_profit),
                margin_pct
            );

            if !top_products.is_empty() {
                out.push_str("Top products:\n");
                for (product, revenue) in top_products.iter().take(5) {
                    out.push_str(&format!("  {}: ${}\n", product, format_amount(*revenue)));
                }
            }

            if !top_stores.is_empty() {
                out.push_str("Top stores:\n");
                for (store, revenue) in top_stores.iter().take(3) {
                    out.push_str(&format!("  {}: ${}\n", store, format_amount(*revenue)));
                }
            }

            if !records.is_empty() {
                out.push_str("Sample transactions:\n");
                for r in records.iter().take(5) {
                    out.push_str(&format!(
                        "  {}: {} at {} - Qty: {}, Revenue: ${}, Profit: ${}\n",
                        r.date,
                        r.product,
                        r.store,
                        r.quantity_sold,
                        format_amount(r.revenue),
                        format_amount(r.profit)
                    ));
                }
            }

            out
        },

        DataContext::Inventory { items, total_stock, low_stock } => {
            let mut out = format!(
                "Inventory Data: {} positions, Total Stock: {} units, Low Stock Items: {}\n",
                items.len(),
                total_stock,
                low_stock.len()
            );

            if !low_stock.is_empty() {
                out.push_str("Low stock alerts:\n");
                for item in low_stock.iter().take(5) {
                    out.push_str(&format!(
                        "  {} at {}: {} units (reorder level: {})\n",
                        item.product, item.store, item.current_stock, item.reorder_level
                    ));
                }
            }

            out
        },

        DataContext::Customers { customers, total_purchases, avg_purchases } => {
            let mut out = format!(
                "Customer Data: {} customers, Total Purchases: {}, Average Purchases: {:.1}\n",
                customers.len(),
                total_purchases,
                avg_purchases
            );

            if !customers.is_empty() {
                out.push_str("Sample customers:\n");
                for c in customers.iter().take(3) {
                    out.push_str(&format!(
                        "  {} ({}, {}): {} purchases, ${} spent\n",
                        c.name,
                        c.region,
                        c.age_group,
                        c.total_purchases,
                        format_amount(c.total_spent)
                    ));
                }
            }

            out
        },

        DataContext::Metrics { metrics } => format!(
            "Business Metrics:\n  Total Revenue: ${}\n  Total Profit: ${}\n  Profit Margin: {:.1}%\n  Customer Count: {}\n  Average Order Value: ${}\n  Inventory Turnover: {:.2}\n",
            format_amount(metrics.total_revenue),
            format_amount(metrics.total_profit),
            metrics.profit_margin,
            metrics.customer_count,
            format_amount(metrics.avg_order_value),
            metrics.inventory_turnover
        ),

        DataContext::Dynamic { table } => {
            if table.rows.is_empty() {
                format!("Dynamic Data: {}\n", table.source)
            } else {
                let mut out = format!(
                    "Dynamic Data ({}): {} rows, columns: {}\n",
                    table.source,
                    table.rows.len(),
                    table.columns.join(", ")
                );
                for row in table.rows.iter().take(10) {
                    let cells: Vec<String> = table
                        .columns
                        .iter()
                        .zip(row.iter())
                        .map(|(col, value)| format!("{}: {}", col, format_cell(value)))
                        .collect();
                    out.push_str(&format!("  {}\n", cells.join(", ")));
                }
                out
            }
        },
    };

    truncate_with_ellipsis(text, SUMMARY_MAX_CHARS)
}

/// Numeric cells get thousand separators and two decimals; everything
/// else passes through untouched.
fn format_cell(value: &str) -> String {
    match value.parse::<f64>() {
        Ok(number) => format_amount(number),
        Err(_) => value.to_string(),
    }
}

/// Format a number with thousand separators and two decimals
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let total_cents = (value.abs() * 100.0).round() as u64;
    let whole = total_cents / 100;
    let cents = total_cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, cents)
}

fn truncate_with_ellipsis(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

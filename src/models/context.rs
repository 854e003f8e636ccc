//! Data context — the grounding evidence fetched for a question
//!
//! A tagged variant per warehouse family, with exhaustive matching in the
//! retriever and the visualization builder.

use serde::{Deserialize, Serialize};

use super::intent::DataSource;

/// One sales transaction from the warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: String,
    pub store: String,
    pub product: String,
    pub category: String,
    pub quantity_sold: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub region: String,
}

/// One (store, product) stock position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub store: String,
    pub product: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub max_stock: i64,
    pub last_restocked: Option<String>,
    pub supplier: String,
    pub status: String,
}

impl InventoryRecord {
    pub fn needs_restock(&self) -> bool {
        self.current_stock <= self.reorder_level
    }
}

/// One customer profile with purchase aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub region: String,
    pub age_group: String,
    pub total_purchases: i64,
    pub total_spent: f64,
    pub last_purchase: Option<String>,
    pub preferred_store: String,
    pub preferred_category: String,
}

/// Business-level KPIs derived from the metrics views
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
    pub customer_count: i64,
    pub avg_order_value: f64,
    pub inventory_turnover: f64,
}

/// Ad-hoc tabular result from an aggregate view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub source: String,
}

/// The grounding evidence for one question, one variant per source family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum DataContext {
    Sales {
        records: Vec<SalesRecord>,
        total_revenue: f64,
        total_profit: f64,
        margin_pct: f64,
        /// (product, revenue), highest revenue first
        top_products: Vec<(String, f64)>,
        /// (store, revenue), highest revenue first
        top_stores: Vec<(String, f64)>,
    },
    Inventory {
        items: Vec<InventoryRecord>,
        total_stock: i64,
        low_stock: Vec<InventoryRecord>,
    },
    Customers {
        customers: Vec<CustomerRecord>,
        total_purchases: i64,
        avg_purchases: f64,
    },
    Metrics { metrics: BusinessMetrics },
    Dynamic { table: DynamicTable },
}

impl DataContext {
    /// Empty catch-all context when no source family matched
    pub fn unmatched() -> Self {
        Self::Dynamic {
            table: DynamicTable {
                columns: Vec::new(),
                rows: Vec::new(),
                source: "no matched source".to_string(),
            },
        }
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            Self::Sales { .. } => DataSource::SalesData,
            Self::Inventory { .. } => DataSource::InventoryData,
            Self::Customers { .. } => DataSource::CustomerData,
            Self::Metrics { .. } => DataSource::BusinessMetrics,
            Self::Dynamic { .. } => DataSource::Fallback,
        }
    }

    /// Number of rows the context materializes
    pub fn row_count(&self) -> usize {
        match self {
            Self::Sales { records, .. } => records.len(),
            Self::Inventory { items, .. } => items.len(),
            Self::Customers { customers, .. } => customers.len(),
            Self::Metrics { .. } => 1,
            Self::Dynamic { table } => table.rows.len(),
        }
    }

    /// Column set the context exposes, for the envelope metadata
    pub fn columns(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::Sales { .. } => &[
                "date", "store", "product", "category", "quantity_sold", "revenue", "cost",
                "profit", "region",
            ],
            Self::Inventory { .. } => &[
                "store",
                "product",
                "current_stock",
                "reorder_level",
                "max_stock",
                "last_restocked",
                "supplier",
                "status",
            ],
            Self::Customers { .. } => &[
                "customer_id",
                "name",
                "region",
                "age_group",
                "total_purchases",
                "total_spent",
                "preferred_store",
                "preferred_category",
            ],
            Self::Metrics { .. } => &[
                "total_revenue",
                "total_profit",
                "profit_margin",
                "customer_count",
                "avg_order_value",
                "inventory_turnover",
            ],
            Self::Dynamic { table } => {
                return table.columns.clone();
            },
        };
        fixed.iter().map(|c| c.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Metrics { metrics } => {
                metrics.total_revenue == 0.0
                    && metrics.total_profit == 0.0
                    && metrics.customer_count == 0
            },
            other => other.row_count() == 0,
        }
    }
}

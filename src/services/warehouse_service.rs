//! Warehouse Service - read-only access to the columnar analytical store
//!
//! Typed reads over the MySQL wire protocol. Every operation degrades to
//! an empty result on validation failure or backend trouble; the
//! warehouse is never mutated from here.

use mysql_async::prelude::Queryable;
use mysql_async::{Opts, Pool};

use crate::models::{BusinessMetrics, CustomerRecord, DynamicTable, InventoryRecord, SalesRecord};

/// Bounds on the `sales(days)` window
pub const MAX_SALES_DAYS: i64 = 365;
/// Bounds on the `customers(limit)` page
pub const MAX_CUSTOMER_LIMIT: i64 = 10_000;

/// Which pre-aggregated view to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateGrain {
    PerStore,
    PerProduct,
    PerDay,
}

impl AggregateGrain {
    fn view(&self) -> &'static str {
        match self {
            Self::PerStore => "sales_by_store_daily",
            Self::PerProduct => "sales_by_product_daily",
            Self::PerDay => "sales_daily_totals",
        }
    }
}

/// Parameterized read of a pre-aggregated view
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub grain: AggregateGrain,
    pub days: i64,
}

pub struct WarehouseService {
    pool: Option<Pool>,
}

impl WarehouseService {
    /// Connect to the warehouse. An empty URL disables the adapter and
    /// every read returns empty.
    pub fn new(url: &str, pool_size: u32) -> Self {
        if url.is_empty() {
            tracing::warn!("Warehouse URL not configured; data contexts will be empty");
            return Self { pool: None };
        }

        match Opts::from_url(url) {
            Ok(opts) => {
                let builder = mysql_async::OptsBuilder::from_opts(opts)
                    .pool_opts(mysql_async::PoolOpts::default().with_constraints(
                        mysql_async::PoolConstraints::new(0, pool_size as usize)
                            .unwrap_or_default(),
                    ));
                Self { pool: Some(Pool::new(builder)) }
            },
            Err(e) => {
                tracing::warn!("Invalid warehouse URL: {}. Data contexts will be empty.", e);
                Self { pool: None }
            },
        }
    }

    /// Adapter with no backend, for tests and degraded deployments
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    /// Last N days of per-transaction sales records, newest first
    pub async fn sales(&self, days: i64) -> Vec<SalesRecord> {
        if !(1..=MAX_SALES_DAYS).contains(&days) {
            tracing::warn!("sales(days={}) outside [1, {}]; returning empty", days, MAX_SALES_DAYS);
            return Vec::new();
        }

        let sql = format!(
            r#"SELECT date, store, product, category, quantity_sold, revenue, cost, profit, region
               FROM sales_data
               WHERE date >= DATE_SUB(CURDATE(), INTERVAL {} DAY)
               ORDER BY date DESC, store, product"#,
            days
        );

        let (columns, rows) = self.query_raw(&sql).await;
        rows.iter()
            .map(|row| SalesRecord {
                date: cell(&columns, row, "date"),
                store: cell(&columns, row, "store"),
                product: cell(&columns, row, "product"),
                category: cell(&columns, row, "category"),
                quantity_sold: cell_i64(&columns, row, "quantity_sold"),
                revenue: cell_f64(&columns, row, "revenue"),
                cost: cell_f64(&columns, row, "cost"),
                profit: cell_f64(&columns, row, "profit"),
                region: cell(&columns, row, "region"),
            })
            .collect()
    }

    /// Per-(store, product) stock positions
    pub async fn inventory(&self) -> Vec<InventoryRecord> {
        let sql = r#"SELECT store, product, current_stock, reorder_level, max_stock,
                            last_restocked, supplier, status
                     FROM inventory_data
                     ORDER BY store, product"#;

        let (columns, rows) = self.query_raw(sql).await;
        rows.iter()
            .map(|row| InventoryRecord {
                store: cell(&columns, row, "store"),
                product: cell(&columns, row, "product"),
                current_stock: cell_i64(&columns, row, "current_stock"),
                reorder_level: cell_i64(&columns, row, "reorder_level"),
                max_stock: cell_i64(&columns, row, "max_stock"),
                last_restocked: cell_opt(&columns, row, "last_restocked"),
                supplier: cell(&columns, row, "supplier"),
                status: cell(&columns, row, "status"),
            })
            .collect()
    }

    /// Customer profiles with purchase aggregates, biggest spenders first
    pub async fn customers(&self, limit: i64) -> Vec<CustomerRecord> {
        if !(1..=MAX_CUSTOMER_LIMIT).contains(&limit) {
            tracing::warn!(
                "customers(limit={}) outside [1, {}]; returning empty",
                limit,
                MAX_CUSTOMER_LIMIT
            );
            return Vec::new();
        }

        let sql = format!(
            r#"SELECT customer_id, name, email, region, age_group, total_purchases,
                      total_spent, last_purchase, preferred_store, preferred_category
               FROM customer_data
               ORDER BY total_spent DESC
               LIMIT {}"#,
            limit
        );

        let (columns, rows) = self.query_raw(&sql).await;
        rows.iter()
            .map(|row| CustomerRecord {
                customer_id: cell(&columns, row, "customer_id"),
                name: cell(&columns, row, "name"),
                email: cell(&columns, row, "email"),
                region: cell(&columns, row, "region"),
                age_group: cell(&columns, row, "age_group"),
                total_purchases: cell_i64(&columns, row, "total_purchases"),
                total_spent: cell_f64(&columns, row, "total_spent"),
                last_purchase: cell_opt(&columns, row, "last_purchase"),
                preferred_store: cell(&columns, row, "preferred_store"),
                preferred_category: cell(&columns, row, "preferred_category"),
            })
            .collect()
    }

    /// Business KPIs derived from the metrics views.
    ///
    /// Margin and average order value are computed here with zero-revenue
    /// and zero-transaction guards.
    pub async fn metrics(&self) -> BusinessMetrics {
        let sql = r#"SELECT SUM(revenue) AS total_revenue,
                            SUM(profit) AS total_profit,
                            COUNT(*) AS transaction_count
                     FROM sales_data"#;

        let (columns, rows) = self.query_raw(sql).await;
        let Some(row) = rows.first() else {
            return BusinessMetrics::default();
        };

        let total_revenue = cell_f64(&columns, row, "total_revenue");
        let total_profit = cell_f64(&columns, row, "total_profit");
        let transaction_count = cell_i64(&columns, row, "transaction_count");

        let profit_margin =
            if total_revenue > 0.0 { total_profit / total_revenue * 100.0 } else { 0.0 };
        let avg_order_value =
            if transaction_count > 0 { total_revenue / transaction_count as f64 } else { 0.0 };

        let (cols, customer_rows) =
            self.query_raw("SELECT COUNT(*) AS customer_count FROM customer_data").await;
        let customer_count = customer_rows
            .first()
            .map(|row| cell_i64(&cols, row, "customer_count"))
            .unwrap_or(0);

        let (cols, stock_rows) = self
            .query_raw("SELECT SUM(current_stock) AS total_stock FROM inventory_data")
            .await;
        let total_stock = stock_rows
            .first()
            .map(|row| cell_f64(&cols, row, "total_stock"))
            .unwrap_or(0.0);
        let inventory_turnover = if total_stock > 0.0 {
            (total_revenue - total_profit) / total_stock
        } else {
            0.0
        };

        BusinessMetrics {
            total_revenue,
            total_profit,
            profit_margin,
            customer_count,
            avg_order_value,
            inventory_turnover,
        }
    }

    /// Read a pre-aggregated materialized view as an ad-hoc table
    pub async fn run_aggregate(&self, spec: &AggregateSpec) -> DynamicTable {
        if !(1..=MAX_SALES_DAYS).contains(&spec.days) {
            tracing::warn!(
                "run_aggregate(days={}) outside [1, {}]; returning empty",
                spec.days,
                MAX_SALES_DAYS
            );
            return DynamicTable::default();
        }

        let view = spec.grain.view();
        let sql = format!(
            r#"SELECT * FROM {}
               WHERE date >= DATE_SUB(CURDATE(), INTERVAL {} DAY)
               ORDER BY date DESC"#,
            view, spec.days
        );

        let (columns, rows) = self.query_raw(&sql).await;
        DynamicTable { columns, rows, source: format!("{} (last {} days)", view, spec.days) }
    }

    /// Execute a query and return results as (column_names, rows).
    /// One retry on transient failure, then warn and return empty.
    async fn query_raw(&self, sql: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let Some(pool) = self.pool.as_ref() else {
            return (Vec::new(), Vec::new());
        };

        match self.try_query(pool, sql).await {
            Ok(result) => result,
            Err(first_err) => {
                tracing::debug!("Warehouse query failed: {}. Retrying once.", first_err);
                match self.try_query(pool, sql).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(
                            "Warehouse query failed after retry: {}. Returning empty result.",
                            e
                        );
                        (Vec::new(), Vec::new())
                    },
                }
            },
        }
    }

    async fn try_query(
        &self,
        pool: &Pool,
        sql: &str,
    ) -> Result<(Vec<String>, Vec<Vec<String>>), mysql_async::Error> {
        let mut conn = pool.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.query(sql).await?;

        tracing::debug!("Warehouse query returned {} rows", rows.len());

        drop(conn);

        Ok(process_query_result(rows))
    }
}

fn process_query_result(rows: Vec<mysql_async::Row>) -> (Vec<String>, Vec<Vec<String>>) {
    if rows.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let col_count = rows[0].columns_ref().len();

    let mut columns = Vec::with_capacity(col_count);
    for col in rows[0].columns_ref().iter() {
        columns.push(col.name_str().to_string());
    }

    let mut result_rows = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let mut row_data = Vec::with_capacity(col_count);
        for col_idx in 0..col_count {
            row_data.push(value_to_string(&row[col_idx]));
        }
        result_rows.push(row_data);
    }

    (columns, result_rows)
}

fn value_to_string(value: &mysql_async::Value) -> String {
    match value {
        mysql_async::Value::NULL => String::new(),
        mysql_async::Value::Bytes(bytes) => String::from_utf8_lossy(bytes).to_string(),
        mysql_async::Value::Int(i) => i.to_string(),
        mysql_async::Value::UInt(u) => u.to_string(),
        mysql_async::Value::Float(f) => f.to_string(),
        mysql_async::Value::Double(d) => d.to_string(),
        mysql_async::Value::Date(year, month, day, hour, minute, second, _micro) => {
            if *hour == 0 && *minute == 0 && *second == 0 {
                format!("{:04}-{:02}-{:02}", year, month, day)
            } else {
                format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                )
            }
        },
        mysql_async::Value::Time(_neg, days, hours, minutes, seconds, _micro) => {
            let total_hours = days * 24 + (*hours as u32);
            format!("{}:{:02}:{:02}", total_hours, minutes, seconds)
        },
    }
}

// Column-name based cell readers; the aggregate views do not guarantee
// column order, so positions are resolved per query.

fn cell(columns: &[String], row: &[String], name: &str) -> String {
    columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .and_then(|idx| row.get(idx))
        .cloned()
        .unwrap_or_default()
}

fn cell_opt(columns: &[String], row: &[String], name: &str) -> Option<String> {
    let value = cell(columns, row, name);
    if value.is_empty() { None } else { Some(value) }
}

fn cell_i64(columns: &[String], row: &[String], name: &str) -> i64 {
    cell(columns, row, name).parse::<i64>().unwrap_or(0)
}

fn cell_f64(columns: &[String], row: &[String], name: &str) -> f64 {
    cell(columns, row, name).parse::<f64>().unwrap_or(0.0)
}

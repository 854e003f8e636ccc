//! Visualization Service - maps intent + context shape to chart specs
//!
//! Pure construction: nothing here talks to the network. Every chart
//! keeps `data_points == labels.len() == dataset.len()` by building all
//! three from one series table.

use std::collections::BTreeMap;

use crate::models::{
    ChartData, ChartDataset, ChartOptions, ChartPayload, DataContext, IntentType, QueryIntent,
    Visualization, VisualizationKind,
};

/// Hard cap on encoded points per chart
const MAX_DATA_POINTS: usize = 50;
/// At most this many charts per response
const MAX_CHARTS: usize = 3;

/// Kinds whose x-axis reads as a progression rather than categories
const TIME_SHAPED: [VisualizationKind; 4] = [
    VisualizationKind::LineChart,
    VisualizationKind::AreaChart,
    VisualizationKind::MultiLineChart,
    VisualizationKind::ScatterPlot,
];

pub struct VisualizationService;

impl VisualizationService {
    /// Build 1-3 chart specs. An empty context yields no charts.
    pub fn build(intent: &QueryIntent, context: &DataContext) -> Vec<Visualization> {
        if context.is_empty() {
            return Vec::new();
        }

        let kinds = select_kinds(intent);

        kinds
            .into_iter()
            .take(MAX_CHARTS)
            .filter_map(|kind| build_chart(kind, context))
            .collect()
    }
}

/// Pick chart kinds: the intent's suggestions when present, otherwise
/// the per-intent preference table.
fn select_kinds(intent: &QueryIntent) -> Vec<VisualizationKind> {
    let preferred: Vec<VisualizationKind> = if intent.suggested_visualizations.is_empty() {
        match intent.intent {
            IntentType::TrendAnalysis => vec![
                VisualizationKind::LineChart,
                VisualizationKind::AreaChart,
                VisualizationKind::MultiLineChart,
            ],
            IntentType::Comparison => vec![
                VisualizationKind::BarChart,
                VisualizationKind::HorizontalBarChart,
                VisualizationKind::RadarChart,
            ],
            IntentType::Prediction => {
                vec![VisualizationKind::LineChart, VisualizationKind::ScatterPlot]
            },
            IntentType::RootCause => {
                vec![VisualizationKind::BarChart, VisualizationKind::StackedBarChart]
            },
            IntentType::Recommendation => vec![
                VisualizationKind::DoughnutChart,
                VisualizationKind::PieChart,
                VisualizationKind::BarChart,
            ],
            IntentType::GeneralAnalysis => vec![VisualizationKind::BarChart],
        }
    } else {
        intent.suggested_visualizations.clone()
    };

    // Suggestions may repeat; keep first occurrences only
    let mut seen = std::collections::HashSet::new();
    preferred.into_iter().filter(|k| seen.insert(*k)).collect()
}

/// One dimension with one or more aligned measures
struct SeriesTable {
    dimension: String,
    labels: Vec<String>,
    /// (measure name, values); the first measure is primary
    measures: Vec<(String, Vec<f64>)>,
    title: String,
    chronological: bool,
}

fn build_chart(kind: VisualizationKind, context: &DataContext) -> Option<Visualization> {
    let table = series_table(context, TIME_SHAPED.contains(&kind))?;
    let table = cap_points(table);

    if table.labels.is_empty() {
        return None;
    }

    let (primary_name, _) = table.measures.first()?;
    let options = ChartOptions {
        title: table.title.clone(),
        x_axis_label: table.dimension.clone(),
        y_axis_label: primary_name.clone(),
    };

    let datasets: Vec<ChartDataset> = table
        .measures
        .iter()
        .map(|(name, values)| ChartDataset { label: name.clone(), data: values.clone() })
        .collect();

    Some(Visualization {
        kind,
        title: table.title,
        data_source: context.data_source(),
        data_points: table.labels.len(),
        columns_used: context.columns(),
        chart_data: ChartPayload {
            data: ChartData { labels: table.labels, datasets },
            options,
        },
    })
}

/// Shape the context into labels + measures for one chart
fn series_table(context: &DataContext, time_shaped: bool) -> Option<SeriesTable> {
    match context {
        DataContext::Sales { records, .. } => {
            if records.is_empty() {
                return None;
            }

            if time_shaped {
                let mut per_date: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
                for r in records {
                    let entry = per_date.entry(r.date.clone()).or_insert((0.0, 0.0, 0.0));
                    entry.0 += r.revenue;
                    entry.1 += r.profit;
                    entry.2 += r.quantity_sold as f64;
                }

                let labels: Vec<String> = per_date.keys().cloned().collect();
                let revenue: Vec<f64> = per_date.values().map(|v| v.0).collect();
                let profit: Vec<f64> = per_date.values().map(|v| v.1).collect();
                let quantity: Vec<f64> = per_date.values().map(|v| v.2).collect();

                Some(SeriesTable {
                    dimension: "Date".to_string(),
                    labels,
                    measures: vec![
                        ("Revenue".to_string(), revenue),
                        ("Profit".to_string(), profit),
                        ("Quantity".to_string(), quantity),
                    ],
                    title: "Revenue Trend by Date".to_string(),
                    chronological: true,
                })
            } else {
                let mut per_product: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
                for r in records {
                    let entry = per_product
                        .entry(r.product.clone())
                        .or_insert((0.0, 0.0, 0.0));
                    entry.0 += r.revenue;
                    entry.1 += r.profit;
                    entry.2 += r.quantity_sold as f64;
                }

                let labels: Vec<String> = per_product.keys().cloned().collect();
                let revenue: Vec<f64> = per_product.values().map(|v| v.0).collect();
                let profit: Vec<f64> = per_product.values().map(|v| v.1).collect();
                let quantity: Vec<f64> = per_product.values().map(|v| v.2).collect();

                Some(SeriesTable {
                    dimension: "Product".to_string(),
                    labels,
                    measures: vec![
                        ("Revenue".to_string(), revenue),
                        ("Profit".to_string(), profit),
                        ("Quantity".to_string(), quantity),
                    ],
                    title: "Revenue by Product".to_string(),
                    chronological: false,
                })
            }
        },

        DataContext::Inventory { items, .. } => {
            if items.is_empty() {
                return None;
            }

            let mut per_product: BTreeMap<String, (f64, f64)> = BTreeMap::new();
            for item in items {
                let entry = per_product.entry(item.product.clone()).or_insert((0.0, 0.0));
                entry.0 += item.current_stock as f64;
                entry.1 += item.reorder_level as f64;
            }

            let labels: Vec<String> = per_product.keys().cloned().collect();
            let stock: Vec<f64> = per_product.values().map(|v| v.0).collect();
            let reorder: Vec<f64> = per_product.values().map(|v| v.1).collect();

            Some(SeriesTable {
                dimension: "Product".to_string(),
                labels,
                measures: vec![
                    ("Stock".to_string(), stock),
                    ("Reorder Level".to_string(), reorder),
                ],
                title: "Stock Levels by Product".to_string(),
                chronological: false,
            })
        },

        DataContext::Customers { customers, .. } => {
            if customers.is_empty() {
                return None;
            }

            let mut per_segment: BTreeMap<String, (f64, f64)> = BTreeMap::new();
            for c in customers {
                let entry = per_segment
                    .entry(c.age_group.clone())
                    .or_insert((0.0, 0.0));
                entry.0 += c.total_purchases as f64;
                entry.1 += c.total_spent;
            }

            let labels: Vec<String> = per_segment.keys().cloned().collect();
            let purchases: Vec<f64> = per_segment.values().map(|v| v.0).collect();
            let spent: Vec<f64> = per_segment.values().map(|v| v.1).collect();

            Some(SeriesTable {
                dimension: "Customer Segment".to_string(),
                labels,
                measures: vec![
                    ("Purchases".to_string(), purchases),
                    ("Total Spent".to_string(), spent),
                ],
                title: "Purchases by Customer Segment".to_string(),
                chronological: false,
            })
        },

        DataContext::Metrics { metrics } => Some(SeriesTable {
            dimension: "Metric".to_string(),
            labels: vec![
                "Total Revenue".to_string(),
                "Total Profit".to_string(),
                "Profit Margin".to_string(),
                "Customer Count".to_string(),
                "Average Order Value".to_string(),
                "Inventory Turnover".to_string(),
            ],
            measures: vec![(
                "Value".to_string(),
                vec![
                    metrics.total_revenue,
                    metrics.total_profit,
                    metrics.profit_margin,
                    metrics.customer_count as f64,
                    metrics.avg_order_value,
                    metrics.inventory_turnover,
                ],
            )],
            title: "Business Metrics Overview".to_string(),
            chronological: false,
        }),

        DataContext::Dynamic { table } => {
            if table.rows.is_empty() || table.columns.is_empty() {
                return None;
            }

            // First column is the dimension; every fully numeric column
            // after it becomes a measure.
            let label_idx = 0;
            let mut measures: Vec<(String, Vec<f64>)> = Vec::new();
            for (idx, column) in table.columns.iter().enumerate().skip(1) {
                let parsed: Option<Vec<f64>> = table
                    .rows
                    .iter()
                    .map(|row| row.get(idx).and_then(|v| v.parse::<f64>().ok()))
                    .collect();
                if let Some(values) = parsed {
                    measures.push((column.clone(), values));
                }
            }

            if measures.is_empty() {
                return None;
            }

            let labels: Vec<String> = table
                .rows
                .iter()
                .map(|row| row.get(label_idx).cloned().unwrap_or_default())
                .collect();

            Some(SeriesTable {
                dimension: table.columns[label_idx].clone(),
                labels,
                measures,
                title: table.source.clone(),
                chronological: false,
            })
        },
    }
}

/// Enforce the point cap: keep the top entries by the primary measure,
/// ties broken by label ascending, then restore a stable display order.
fn cap_points(table: SeriesTable) -> SeriesTable {
    if table.labels.len() <= MAX_DATA_POINTS {
        return table;
    }

    let SeriesTable { dimension, labels, measures, title, chronological } = table;
    let primary = &measures[0].1;

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        primary[b]
            .partial_cmp(&primary[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| labels[a].cmp(&labels[b]))
    });
    order.truncate(MAX_DATA_POINTS);

    if chronological {
        // Keep the surviving points in time order
        order.sort_by(|&a, &b| labels[a].cmp(&labels[b]));
    }

    let new_labels: Vec<String> = order.iter().map(|&i| labels[i].clone()).collect();
    let new_measures: Vec<(String, Vec<f64>)> = measures
        .iter()
        .map(|(name, values)| {
            (name.clone(), order.iter().map(|&i| values[i]).collect::<Vec<f64>>())
        })
        .collect();

    SeriesTable {
        dimension,
        labels: new_labels,
        measures: new_measures,
        title,
        chronological,
    }
}

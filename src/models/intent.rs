//! Intent classification model
//!
//! Closed tag sets for intents, data sources, and chart kinds, plus the
//! `QueryIntent` record derived from a question.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    TrendAnalysis,
    Comparison,
    Prediction,
    RootCause,
    Recommendation,
    GeneralAnalysis,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendAnalysis => "trend_analysis",
            Self::Comparison => "comparison",
            Self::Prediction => "prediction",
            Self::RootCause => "root_cause",
            Self::Recommendation => "recommendation",
            Self::GeneralAnalysis => "general_analysis",
        }
    }

    /// Parse a tag, returning None for anything outside the closed set
    pub fn parse_tag(s: &str) -> Option<Self> {
        match s {
            "trend_analysis" => Some(Self::TrendAnalysis),
            "comparison" => Some(Self::Comparison),
            "prediction" => Some(Self::Prediction),
            "root_cause" => Some(Self::RootCause),
            "recommendation" => Some(Self::Recommendation),
            "general_analysis" => Some(Self::GeneralAnalysis),
            _ => None,
        }
    }
}

/// Which warehouse family grounded an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    SalesData,
    InventoryData,
    CustomerData,
    BusinessMetrics,
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalesData => "sales_data",
            Self::InventoryData => "inventory_data",
            Self::CustomerData => "customer_data",
            Self::BusinessMetrics => "business_metrics",
            Self::Fallback => "fallback",
        }
    }

    pub fn parse_tag(s: &str) -> Option<Self> {
        match s {
            "sales_data" => Some(Self::SalesData),
            "inventory_data" => Some(Self::InventoryData),
            "customer_data" => Some(Self::CustomerData),
            "business_metrics" => Some(Self::BusinessMetrics),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

/// Chart kinds a client can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    BarChart,
    LineChart,
    PieChart,
    DoughnutChart,
    ScatterPlot,
    BubbleChart,
    RadarChart,
    HorizontalBarChart,
    StackedBarChart,
    MultiLineChart,
    AreaChart,
}

impl VisualizationKind {
    /// Every kind, in the order clients list them
    pub const ALL: [VisualizationKind; 11] = [
        Self::BarChart,
        Self::LineChart,
        Self::PieChart,
        Self::DoughnutChart,
        Self::ScatterPlot,
        Self::BubbleChart,
        Self::RadarChart,
        Self::HorizontalBarChart,
        Self::StackedBarChart,
        Self::MultiLineChart,
        Self::AreaChart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BarChart => "bar_chart",
            Self::LineChart => "line_chart",
            Self::PieChart => "pie_chart",
            Self::DoughnutChart => "doughnut_chart",
            Self::ScatterPlot => "scatter_plot",
            Self::BubbleChart => "bubble_chart",
            Self::RadarChart => "radar_chart",
            Self::HorizontalBarChart => "horizontal_bar_chart",
            Self::StackedBarChart => "stacked_bar_chart",
            Self::MultiLineChart => "multi_line_chart",
            Self::AreaChart => "area_chart",
        }
    }

    pub fn parse_tag(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// Classification of a question, derived once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryIntent {
    pub intent: IntentType,
    pub confidence: f64,
    pub categories: Vec<String>,
    pub data_sources: Vec<DataSource>,
    pub suggested_visualizations: Vec<VisualizationKind>,
}

impl QueryIntent {
    /// Build an intent with the confidence clamped into [0, 1]
    pub fn new(
        intent: IntentType,
        confidence: f64,
        categories: Vec<String>,
        data_sources: Vec<DataSource>,
        suggested_visualizations: Vec<VisualizationKind>,
    ) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            categories,
            data_sources,
            suggested_visualizations,
        }
    }
}

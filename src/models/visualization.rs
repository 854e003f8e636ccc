//! Visualization model — renderable chart specifications

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::intent::{DataSource, VisualizationKind};

/// One labelled series of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Axis titles and chart title, the minimum a client needs to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartOptions {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
}

/// Labels + datasets in the shape charting libraries consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Opaque chart payload: the `data` block plus rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPayload {
    pub data: ChartData,
    pub options: ChartOptions,
}

/// A complete chart specification, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    pub title: String,
    pub data_source: DataSource,
    pub data_points: usize,
    pub columns_used: Vec<String>,
    pub chart_data: ChartPayload,
}

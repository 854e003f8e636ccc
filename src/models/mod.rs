pub mod context;
pub mod intent;
pub mod question;
pub mod visualization;

pub use context::{
    BusinessMetrics, CustomerRecord, DataContext, DynamicTable, InventoryRecord, SalesRecord,
};
pub use intent::{DataSource, IntentType, QueryIntent, VisualizationKind};
pub use question::{
    Insight, InsightCategory, InsightRow, MAX_QUESTION_LEN, MAX_USER_TAG_LEN, MIN_QUESTION_LEN,
    Question,
};
pub use visualization::{ChartData, ChartDataset, ChartOptions, ChartPayload, Visualization};

//! Question and Insight entities
//!
//! Core data structures persisted in the metadata store. Insights are
//! owned by the question they reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Maximum question length accepted by the pipeline (after trimming)
pub const MAX_QUESTION_LEN: usize = 2000;
/// Minimum question length accepted by the pipeline (after trimming)
pub const MIN_QUESTION_LEN: usize = 3;
/// Maximum user tag length
pub const MAX_USER_TAG_LEN: usize = 255;

/// A submitted question from the metadata store
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub user_id: Option<String>,
    pub processed: bool,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Unpersisted placeholder used when the metadata store is down.
    /// Id 0 never collides with a SQLite rowid.
    pub fn in_memory(text: String, user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            text,
            user_id,
            processed: false,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Insight category tag
///
/// Intent tags are not valid here; off-set values coming back from the
/// model are rejected during response validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Trend,
    Anomaly,
    Recommendation,
    Prediction,
    Correlation,
    Summary,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Anomaly => "anomaly",
            Self::Recommendation => "recommendation",
            Self::Prediction => "prediction",
            Self::Correlation => "correlation",
            Self::Summary => "summary",
        }
    }

    pub fn parse_tag(s: &str) -> Option<Self> {
        match s {
            "trend" => Some(Self::Trend),
            "anomaly" => Some(Self::Anomaly),
            "recommendation" => Some(Self::Recommendation),
            "prediction" => Some(Self::Prediction),
            "correlation" => Some(Self::Correlation),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

/// One atomic finding about a question
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Insight {
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    pub confidence_score: f64,
    pub data_sources: Vec<String>,
    pub action_items: Vec<String>,
}

impl Insight {
    /// Clamp field lengths and confidence to the entity contract
    pub fn bounded(mut self) -> Self {
        truncate_chars(&mut self.title, 200);
        truncate_chars(&mut self.description, 2000);
        self.confidence_score = self.confidence_score.clamp(0.0, 1.0);
        self.data_sources.truncate(10);
        self.action_items.truncate(10);
        self
    }
}

/// Cut a string to at most `max_chars` characters.
/// `String::truncate` takes a byte index and panics mid-codepoint, so the
/// cutoff is resolved to a char boundary first.
fn truncate_chars(s: &mut String, max_chars: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(idx);
    }
}

/// Insight row as stored: list fields are JSON-encoded text columns
#[derive(Debug, Clone, FromRow)]
pub struct InsightRow {
    pub id: i64,
    pub question_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub confidence_score: f64,
    pub data_sources: String,
    pub action_items: String,
    pub created_at: DateTime<Utc>,
}

impl InsightRow {
    /// Decode the row into the domain type.
    /// Unknown categories in old rows degrade to `summary` rather than failing reads.
    pub fn into_insight(self) -> Insight {
        Insight {
            title: self.title,
            description: self.description,
            category: InsightCategory::parse_tag(&self.category)
                .unwrap_or(InsightCategory::Summary),
            confidence_score: self.confidence_score.clamp(0.0, 1.0),
            data_sources: serde_json::from_str(&self.data_sources).unwrap_or_default(),
            action_items: serde_json::from_str(&self.action_items).unwrap_or_default(),
        }
    }
}

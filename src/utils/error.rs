use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API Error with rich context and automatic error trait implementations
///
/// Design: Uses thiserror for ergonomic error handling with context.
/// Each variant carries meaningful context to help with debugging.
#[derive(Error, Debug)]
pub enum ApiError {
    // Input errors 1xxx
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors 2xxx
    #[error("Question {question_id} not found")]
    QuestionNotFound { question_id: i64 },

    // LLM errors 3xxx
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM returned off-schema response: {0}")]
    LlmSchema(String),

    // Store errors 4xxx
    #[error("Warehouse unavailable: {message}")]
    WarehouseUnavailable { message: String },

    #[error("Metadata store unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // Lifecycle errors 5xxx
    #[error("{component} timed out")]
    Timeout { component: &'static str },

    #[error("Request cancelled by caller")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    // Database errors - auto-convert from sqlx::Error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Helper to create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Helper to create question not found error
    pub fn question_not_found(question_id: i64) -> Self {
        Self::QuestionNotFound { question_id }
    }

    /// Helper to create warehouse unavailable error
    pub fn warehouse_unavailable(message: impl Into<String>) -> Self {
        Self::WarehouseUnavailable { message: message.into() }
    }

    /// Helper to create metadata unavailable error
    pub fn metadata_unavailable(message: impl Into<String>) -> Self {
        Self::MetadataUnavailable(message.into())
    }

    /// Helper to create internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable error kind, the only part of an error a client may branch on
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::QuestionNotFound { .. } => "not_found",
            Self::LlmUnavailable(_) => "llm_unavailable",
            Self::LlmSchema(_) => "llm_schema",
            Self::WarehouseUnavailable { .. } => "warehouse_unavailable",
            Self::MetadataUnavailable(_) => "metadata_unavailable",
            Self::CacheUnavailable(_) => "cache_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal(_) | Self::Database(_) | Self::Other(_) => "internal",
        }
    }

    /// Get legacy error code for backward compatibility
    pub fn error_code(&self) -> i32 {
        match self {
            // Input errors 1xxx
            Self::Validation(_) => 1001,

            // Resource errors 2xxx
            Self::QuestionNotFound { .. } => 2001,

            // LLM errors 3xxx
            Self::LlmUnavailable(_) => 3001,
            Self::LlmSchema(_) => 3002,

            // Store errors 4xxx
            Self::WarehouseUnavailable { .. } => 4001,
            Self::MetadataUnavailable(_) => 4002,
            Self::CacheUnavailable(_) => 4003,

            // Lifecycle errors 5xxx
            Self::Timeout { .. } => 5001,
            Self::Cancelled => 5002,
            Self::Internal(_) => 5003,
            Self::Database(_) => 5004,
            Self::Other(_) => 5003,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::QuestionNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = ApiErrorResponse {
            success: false,
            error: ApiErrorBody { kind: self.kind().to_string(), message: self.to_string() },
        };

        (status, Json(response)).into_response()
    }
}

/// Implement From for serde_json::Error
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

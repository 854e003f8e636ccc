//! Query API Handlers
//!
//! REST endpoints for submitting questions and polling their state.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::models::{Insight, Question};
use crate::services::pipeline_service::QueryEnvelope;
use crate::utils::{ApiError, ApiResult, StringExt, normalize_question};

/// Request body for question processing
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProcessQuestionRequest {
    #[validate(length(min = 3, max = 2000, message = "query_text must be 3-2000 characters"))]
    pub query_text: String,
    #[validate(length(max = 255, message = "user_id must be at most 255 characters"))]
    pub user_id: Option<String>,
}

impl ProcessQuestionRequest {
    /// Normalize the fields the same way the pipeline does, so the
    /// length rules here and the pipeline's own validation judge the
    /// exact same text
    fn normalized(self) -> Self {
        Self {
            query_text: normalize_question(&self.query_text),
            user_id: self.user_id.clean(),
        }
    }
}

/// Process a question through the full pipeline
/// POST /api/questions
#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = ProcessQuestionRequest,
    responses(
        (status = 200, description = "Processed envelope", body = QueryEnvelope),
        (status = 400, description = "Validation failure")
    ),
    tag = "Questions"
)]
pub async fn process_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessQuestionRequest>,
) -> ApiResult<Json<QueryEnvelope>> {
    let req = req.normalized();
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let envelope = state
        .pipeline_service
        .process(&req.query_text, req.user_id.as_deref())
        .await?;
    Ok(Json(envelope))
}

/// Get a question by id
/// GET /api/questions/:id
#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "The question", body = Question),
        (status = 404, description = "Unknown question id")
    ),
    tag = "Questions"
)]
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Question>> {
    let question = state
        .query_repository
        .get(id)
        .await?
        .ok_or(ApiError::question_not_found(id))?;
    Ok(Json(question))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionListResponse {
    pub total: i64,
    pub questions: Vec<Question>,
}

/// List questions, newest first
/// GET /api/questions?offset=0&limit=50
#[utoipa::path(
    get,
    path = "/api/questions",
    params(
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Page size (max 500)")
    ),
    responses(
        (status = 200, description = "Page of questions", body = QuestionListResponse)
    ),
    tag = "Questions"
)]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<QuestionListResponse>> {
    let offset = params.offset.max(0);
    let limit = params.limit.unwrap_or(50).clamp(1, 500);

    let (questions, total) = state.query_repository.list(offset, limit).await?;
    Ok(Json(QuestionListResponse { total, questions }))
}

/// Insights generated for a question
/// GET /api/questions/:id/insights
#[utoipa::path(
    get,
    path = "/api/questions/{id}/insights",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Insights for the question", body = Vec<Insight>),
        (status = 404, description = "Unknown question id")
    ),
    tag = "Questions"
)]
pub async fn get_question_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Insight>>> {
    state
        .query_repository
        .get(id)
        .await?
        .ok_or(ApiError::question_not_found(id))?;

    let insights = state.query_repository.insights_for(id).await?;
    Ok(Json(insights))
}

//! Pipeline Service - the query-to-insight orchestrator
//!
//! Sequences cache lookup, intent, context retrieval, insight
//! generation, visualization building, and persistence. A valid question
//! always gets an envelope back; components that fail answer through
//! their degraded modes instead of aborting the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::models::{
    Insight, MAX_QUESTION_LEN, MAX_USER_TAG_LEN, MIN_QUESTION_LEN, Question, QueryIntent,
    Visualization,
};
use crate::services::cache_service::{CacheService, TTL_QUERY_SECS};
use crate::services::context_service::ContextService;
use crate::services::insight_service::{InsightService, derive_recommendations};
use crate::services::intent_service::IntentService;
use crate::services::llm::{InsightGenerateRequest, LlmRequest, keyword_intent};
use crate::services::query_repository::QueryRepository;
use crate::services::visualization_service::VisualizationService;
use crate::utils::{ApiError, ApiResult, StringExt, fingerprint, normalize_question};

/// The full response returned to callers and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryEnvelope {
    pub success: bool,
    pub query: Question,
    pub intent: QueryIntent,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    pub visualizations: Vec<Visualization>,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

pub struct PipelineService {
    cache: Arc<CacheService>,
    repository: Arc<QueryRepository>,
    intent_service: IntentService,
    context_service: ContextService,
    insight_service: InsightService,
    gateway: Arc<crate::services::llm::LlmGateway>,
    request_timeout: Duration,
}

impl PipelineService {
    pub fn new(
        cache: Arc<CacheService>,
        repository: Arc<QueryRepository>,
        intent_service: IntentService,
        context_service: ContextService,
        insight_service: InsightService,
        gateway: Arc<crate::services::llm::LlmGateway>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            repository,
            intent_service,
            context_service,
            insight_service,
            gateway,
            request_timeout,
        }
    }

    /// Process one question end to end.
    ///
    /// The only error this returns is `validation`; every downstream
    /// failure degrades inside its component.
    pub async fn process(&self, text: &str, user_id: Option<&str>) -> ApiResult<QueryEnvelope> {
        let started = Instant::now();
        let cost_before = self.gateway.cost_snapshot().total_cost_usd;

        // Step 1: normalize and validate
        let question_text = normalize_question(text);
        let user_tag = validate_input(&question_text, user_id)?;

        let correlation_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            "process start [{}]: user={}, text_len={}",
            correlation_id,
            user_tag.as_deref().unwrap_or("-"),
            question_text.chars().count()
        );

        // Step 2: cache lookup
        let fp = fingerprint(&question_text);
        let cache_key = CacheService::query_key(&fp);
        if let Some(mut envelope) = self.cache.get::<QueryEnvelope>(&cache_key).await {
            envelope.cached_at = Some(Utc::now());
            tracing::info!(
                "process end [{}]: id={}, ok, {}ms, cache_hit=true, insights={}, cost=$0.000000",
                correlation_id,
                envelope.query.id,
                started.elapsed().as_millis(),
                envelope.insights.len()
            );
            return Ok(envelope);
        }

        // Step 3: persist the question, or carry on in memory
        let question = match self
            .repository
            .create(&question_text, user_tag.as_deref())
            .await
        {
            Ok(question) => question,
            Err(e) => {
                tracing::warn!(
                    "[{}] metadata store unavailable ({}); continuing with in-memory question",
                    correlation_id,
                    e
                );
                Question::in_memory(question_text.clone(), user_tag.clone())
            },
        };

        // Steps 4-7 under the overall request cap
        let inner = self.run_stages(&question_text, &fp);
        let (intent, insights, recommendations, visualizations) =
            match tokio::time::timeout(self.request_timeout, inner).await {
                Ok(stages) => stages,
                Err(_) => {
                    tracing::warn!(
                        "[{}] pipeline exceeded {}s; answering with fallbacks",
                        correlation_id,
                        self.request_timeout.as_secs()
                    );
                    degraded_stages(&question_text)
                },
            };

        // Step 8: persist insights and close out the question
        let mut question = question;
        if question.id != 0 {
            if let Err(e) = self.repository.store_insights(question.id, &insights).await {
                tracing::warn!("[{}] failed to store insights: {}", correlation_id, e);
            }

            let summary = insights
                .first()
                .map(|i| i.title.as_str())
                .unwrap_or("Processed");
            match self.repository.mark_processed(question.id, summary).await {
                Ok(()) => {
                    question.processed = true;
                    question.response = Some(summary.to_string());
                    question.updated_at = Utc::now();
                },
                Err(e) => {
                    tracing::warn!("[{}] failed to mark processed: {}", correlation_id, e);
                },
            }
        } else {
            question.processed = true;
            question.response = Some(
                insights
                    .first()
                    .map(|i| i.title.clone())
                    .unwrap_or_else(|| "Processed".to_string()),
            );
        }

        // Steps 9-11: envelope, cache, return
        let envelope = QueryEnvelope {
            success: true,
            query: question,
            intent,
            insights,
            recommendations,
            visualizations,
            processed_at: Utc::now(),
            cached_at: None,
        };

        self.cache.set(&cache_key, &envelope, TTL_QUERY_SECS).await;

        let cost_delta = self.gateway.cost_snapshot().total_cost_usd - cost_before;
        tracing::info!(
            "process end [{}]: id={}, ok, {}ms, cache_hit=false, insights={}, cost=${:.6}",
            correlation_id,
            envelope.query.id,
            started.elapsed().as_millis(),
            envelope.insights.len(),
            cost_delta
        );

        Ok(envelope)
    }

    /// Intent → context → insights → visualizations, in order
    async fn run_stages(
        &self,
        question_text: &str,
        fp: &str,
    ) -> (QueryIntent, Vec<Insight>, Vec<String>, Vec<Visualization>) {
        let intent_outcome = self.intent_service.analyze(question_text, fp).await;
        let intent = intent_outcome.intent;

        let (context, summary) = self.context_service.retrieve(question_text, &intent).await;

        let insight_outcome = self.insight_service.generate(question_text, &summary).await;
        let recommendations = derive_recommendations(&insight_outcome.insights);

        let visualizations = VisualizationService::build(&intent, &context);

        (intent, insight_outcome.insights, recommendations, visualizations)
    }
}

/// Validate the normalized question and the optional user tag
fn validate_input(question_text: &str, user_id: Option<&str>) -> ApiResult<Option<String>> {
    let len = question_text.chars().count();
    if len < MIN_QUESTION_LEN {
        return Err(ApiError::validation(format!(
            "question must be at least {} characters after trimming",
            MIN_QUESTION_LEN
        )));
    }
    if len > MAX_QUESTION_LEN {
        return Err(ApiError::validation(format!(
            "question must be at most {} characters",
            MAX_QUESTION_LEN
        )));
    }

    let user_tag = user_id.clean();
    if let Some(tag) = &user_tag
        && tag.chars().count() > MAX_USER_TAG_LEN
    {
        return Err(ApiError::validation(format!(
            "user tag must be at most {} characters",
            MAX_USER_TAG_LEN
        )));
    }

    Ok(user_tag)
}

/// Fully degraded stage output: keyword intent, fallback insight,
/// default recommendations, no charts.
fn degraded_stages(
    question_text: &str,
) -> (QueryIntent, Vec<Insight>, Vec<String>, Vec<Visualization>) {
    let intent = keyword_intent(question_text).into_intent();

    let mut insights: Vec<Insight> = InsightGenerateRequest::new(question_text, "")
        .fallback()
        .insights
        .into_iter()
        .map(|p| p.into_insight())
        .collect();
    for insight in &mut insights {
        insight.confidence_score = insight.confidence_score.min(0.6);
        let tag = crate::models::DataSource::Fallback.as_str().to_string();
        if !insight.data_sources.contains(&tag) {
            insight.data_sources.push(tag);
        }
    }

    let recommendations = derive_recommendations(&insights);

    (intent, insights, recommendations, Vec::new())
}

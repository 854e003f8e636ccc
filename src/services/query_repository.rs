//! Query Repository - persistence for questions and their insights
//!
//! Thin sqlx layer over the metadata store. The pipeline survives this
//! store being down: every operation returns an error the orchestrator
//! downgrades to an in-memory question.

use sqlx::SqlitePool;

use crate::models::{Insight, InsightRow, Question};
use crate::utils::{ApiError, ApiResult};

pub struct QueryRepository {
    pool: Option<SqlitePool>,
}

impl QueryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Repository with no backing store; every operation reports
    /// `metadata_unavailable`.
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> ApiResult<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| ApiError::metadata_unavailable("metadata store not configured"))
    }

    /// Persist a new question with `processed = false`
    pub async fn create(&self, text: &str, user_id: Option<&str>) -> ApiResult<Question> {
        let pool = self.pool()?;

        let result = sqlx::query(
            r#"INSERT INTO questions (text, user_id, processed)
               VALUES (?, ?, FALSE)"#,
        )
        .bind(text)
        .bind(user_id)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(ApiError::from)
    }

    /// Mark a question processed, recording the response summary.
    /// The question text itself is immutable and never touched here.
    pub async fn mark_processed(&self, id: i64, summary: &str) -> ApiResult<()> {
        let pool = self.pool()?;

        let result = sqlx::query(
            r#"UPDATE questions
               SET processed = TRUE, response = ?, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?"#,
        )
        .bind(summary)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::question_not_found(id));
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<Question>> {
        let pool = self.pool()?;

        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(ApiError::from)
    }

    /// Paged retrieval, newest first, with the total count
    pub async fn list(&self, offset: i64, limit: i64) -> ApiResult<(Vec<Question>, i64)> {
        let pool = self.pool()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(pool)
            .await?;

        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions
               ORDER BY created_at DESC, id DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok((questions, total))
    }

    /// Batch-insert the insights for one question, all-or-nothing
    pub async fn store_insights(&self, question_id: i64, insights: &[Insight]) -> ApiResult<()> {
        let pool = self.pool()?;

        let mut tx = pool.begin().await?;

        for insight in insights {
            let data_sources = serde_json::to_string(&insight.data_sources)?;
            let action_items = serde_json::to_string(&insight.action_items)?;

            sqlx::query(
                r#"INSERT INTO insights
                   (question_id, title, description, category, confidence_score,
                    data_sources, action_items)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(question_id)
            .bind(&insight.title)
            .bind(&insight.description)
            .bind(insight.category.as_str())
            .bind(insight.confidence_score)
            .bind(&data_sources)
            .bind(&action_items)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insights belonging to a question, oldest first (insertion order)
    pub async fn insights_for(&self, question_id: i64) -> ApiResult<Vec<Insight>> {
        let pool = self.pool()?;

        let rows = sqlx::query_as::<_, InsightRow>(
            "SELECT * FROM insights WHERE question_id = ? ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(InsightRow::into_insight).collect())
    }
}

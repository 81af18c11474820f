//! Durable queue of reviews worth learning from.
//!
//! Items move `pending → claimed → done | failed`. A claim that is never
//! acknowledged (the run crashed) can be released back to pending once it is
//! older than the configured window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::commerce::serialize::format_timestamp;
use crate::core::db;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningOpportunity {
    pub review_id: String,
    pub category: String,
    pub review_text: String,
}

#[derive(Clone)]
pub struct LearningQueue {
    pool: SqlitePool,
}

impl LearningQueue {
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS learning_opportunities (
                review_id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                review_text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                claimed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init learning queue: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_learning_opportunities_status ON learning_opportunities(status)",
        )
        .execute(&pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(Self { pool })
    }

    /// Returns false when the review is already queued (in any state).
    pub async fn enqueue(&self, item: &LearningOpportunity) -> Result<bool, ApiError> {
        let now = db::now_timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO learning_opportunities
                (review_id, category, review_text, status, created_at, updated_at)
             VALUES (?, ?, ?, 'pending', ?, ?)",
        )
        .bind(&item.review_id)
        .bind(&item.category)
        .bind(&item.review_text)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically moves every pending item to claimed and returns them, oldest first.
    pub async fn claim_pending(&self, now: DateTime<Utc>) -> Result<Vec<LearningOpportunity>, ApiError> {
        let claimed_at = format_timestamp(now);
        let rows = sqlx::query(
            "UPDATE learning_opportunities
             SET status = 'claimed', claimed_at = ?1, updated_at = ?1
             WHERE status = 'pending'
             RETURNING review_id, category, review_text, created_at",
        )
        .bind(&claimed_at)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut claimed: Vec<(String, LearningOpportunity)> = rows
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("created_at"),
                    LearningOpportunity {
                        review_id: row.get("review_id"),
                        category: row.get("category"),
                        review_text: row.get("review_text"),
                    },
                )
            })
            .collect();
        claimed.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(claimed.into_iter().map(|(_, item)| item).collect())
    }

    pub async fn ack(&self, review_id: &str) -> Result<(), ApiError> {
        self.transition(review_id, "done", None).await
    }

    pub async fn mark_failed(&self, review_id: &str, error: &str) -> Result<(), ApiError> {
        self.transition(review_id, "failed", Some(error)).await
    }

    async fn transition(&self, review_id: &str, status: &str, error: Option<&str>) -> Result<(), ApiError> {
        let result = sqlx::query(
            "UPDATE learning_opportunities
             SET status = ?, last_error = ?, attempts = attempts + 1, claimed_at = NULL, updated_at = ?
             WHERE review_id = ? AND status = 'claimed'",
        )
        .bind(status)
        .bind(error)
        .bind(db::now_timestamp())
        .bind(review_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!(
                "no claimed learning opportunity for review {}",
                review_id
            )));
        }
        Ok(())
    }

    /// Returns claims made before `cutoff` to pending.
    pub async fn release_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE learning_opportunities
             SET status = 'pending', claimed_at = NULL, updated_at = ?
             WHERE status = 'claimed' AND claimed_at < ?",
        )
        .bind(db::now_timestamp())
        .bind(format_timestamp(cutoff))
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(result.rows_affected())
    }

    pub async fn status_counts(&self) -> Result<BTreeMap<String, i64>, ApiError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM learning_opportunities GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("status"), row.get::<i64, _>("n")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::fixtures::temp_pool;
    use chrono::Duration;

    fn item(id: &str) -> LearningOpportunity {
        LearningOpportunity {
            review_id: id.to_string(),
            category: "제품 품질 불만".to_string(),
            review_text: "곰팡이가 피어 있었어요".to_string(),
        }
    }

    async fn queue() -> LearningQueue {
        LearningQueue::with_pool(temp_pool("queue").await).await.unwrap()
    }

    #[tokio::test]
    async fn enqueue_dedupes_by_review_id() {
        let queue = queue().await;
        assert!(queue.enqueue(&item("R1")).await.unwrap());
        assert!(!queue.enqueue(&item("R1")).await.unwrap());
        assert_eq!(queue.status_counts().await.unwrap()["pending"], 1);
    }

    #[tokio::test]
    async fn claim_then_ack() {
        let queue = queue().await;
        queue.enqueue(&item("R1")).await.unwrap();
        queue.enqueue(&item("R2")).await.unwrap();

        let claimed = queue.claim_pending(Utc::now()).await.unwrap();
        let ids: Vec<&str> = claimed.iter().map(|i| i.review_id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);

        // A second claim sees nothing while the first is outstanding.
        assert!(queue.claim_pending(Utc::now()).await.unwrap().is_empty());

        queue.ack("R1").await.unwrap();
        queue.mark_failed("R2", "model timeout").await.unwrap();

        let counts = queue.status_counts().await.unwrap();
        assert_eq!(counts["done"], 1);
        assert_eq!(counts["failed"], 1);
    }

    #[tokio::test]
    async fn acking_an_unclaimed_item_is_not_found() {
        let queue = queue().await;
        queue.enqueue(&item("R1")).await.unwrap();
        assert!(queue.ack("R1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn stale_claims_are_released() {
        let queue = queue().await;
        queue.enqueue(&item("R1")).await.unwrap();
        queue
            .claim_pending(Utc::now() - Duration::hours(2))
            .await
            .unwrap();

        let released = queue
            .release_stale(Utc::now() - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(released, 1);
        assert_eq!(queue.claim_pending(Utc::now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fresh_claims_are_kept() {
        let queue = queue().await;
        queue.enqueue(&item("R1")).await.unwrap();
        queue.claim_pending(Utc::now()).await.unwrap();

        let released = queue
            .release_stale(Utc::now() - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(released, 0);
    }
}

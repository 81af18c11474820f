use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::core::db;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Success,
    Failure,
}

impl Feedback {
    pub fn as_str(self) -> &'static str {
        match self {
            Feedback::Success => "success",
            Feedback::Failure => "failure",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Feedback::Success),
            "failure" => Ok(Feedback::Failure),
            other => Err(ApiError::BadRequest(format!(
                "resolution_feedback must be 'success' or 'failure', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryLog {
    pub log_id: String,
    pub customer_id: String,
    /// Query as answered, including any image description.
    pub input_text: String,
    pub answer_text: String,
    pub feedback: Option<Feedback>,
    pub final_resolution: Option<String>,
    pub learned: bool,
    pub created_at: String,
}

/// A past answer an operator marked as wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub log_id: String,
    pub input_text: String,
    pub failed_answer: String,
    pub final_resolution: Option<String>,
}

/// Every answered inquiry, its operator feedback and whether it has been
/// learned from.
#[derive(Clone)]
pub struct InquiryLogStore {
    pool: SqlitePool,
}

impl InquiryLogStore {
    pub async fn open(db_path: &Path) -> Result<Self, ApiError> {
        let pool = db::connect(db_path).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS inquiry_logs (
                log_id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                input_text TEXT NOT NULL,
                answer_text TEXT NOT NULL,
                resolution_feedback TEXT,
                final_resolution TEXT,
                is_learned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init inquiry_logs table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_inquiry_logs_customer ON inquiry_logs(customer_id, created_at)",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn insert(
        &self,
        log_id: &str,
        customer_id: &str,
        input_text: &str,
        answer_text: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO inquiry_logs (log_id, customer_id, input_text, answer_text, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(log_id)
        .bind(customer_id)
        .bind(input_text)
        .bind(answer_text)
        .bind(db::now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save inquiry log: {}", e)))?;

        Ok(())
    }

    pub async fn get(&self, log_id: &str) -> Result<Option<InquiryLog>, ApiError> {
        let row = sqlx::query("SELECT * FROM inquiry_logs WHERE log_id = ?")
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(row_to_log))
    }

    /// Overwrites feedback and resolution; the last write wins.
    pub async fn record_feedback(
        &self,
        log_id: &str,
        feedback: Feedback,
        final_resolution: Option<&str>,
    ) -> Result<(), ApiError> {
        let result = sqlx::query(
            "UPDATE inquiry_logs SET resolution_feedback = ?, final_resolution = ? WHERE log_id = ?",
        )
        .bind(feedback.as_str())
        .bind(final_resolution)
        .bind(log_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save feedback: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("inquiry log {} not found", log_id)));
        }
        Ok(())
    }

    /// Most recent failures for the customer first.
    pub async fn recent_failures(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<Vec<FailureRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT log_id, input_text, answer_text, final_resolution
             FROM inquiry_logs
             WHERE customer_id = ? AND resolution_feedback = 'failure'
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(customer_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_failure).collect())
    }

    /// Failures with a recorded resolution that have not been learned yet, oldest first.
    pub async fn unlearned_failures(&self) -> Result<Vec<FailureRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT log_id, input_text, answer_text, final_resolution
             FROM inquiry_logs
             WHERE resolution_feedback = 'failure' AND is_learned = 0
               AND final_resolution IS NOT NULL
             ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_failure).collect())
    }

    pub async fn mark_learned(&self, log_id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE inquiry_logs SET is_learned = 1 WHERE log_id = ?")
            .bind(log_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }
}

fn row_to_log(row: &SqliteRow) -> InquiryLog {
    let feedback: Option<String> = row.get("resolution_feedback");
    InquiryLog {
        log_id: row.get("log_id"),
        customer_id: row.get("customer_id"),
        input_text: row.get("input_text"),
        answer_text: row.get("answer_text"),
        feedback: feedback.as_deref().and_then(|raw| raw.parse().ok()),
        final_resolution: row.get("final_resolution"),
        learned: row.get("is_learned"),
        created_at: row.get("created_at"),
    }
}

fn row_to_failure(row: &SqliteRow) -> FailureRecord {
    FailureRecord {
        log_id: row.get("log_id"),
        input_text: row.get("input_text"),
        failed_answer: row.get("answer_text"),
        final_resolution: row.get("final_resolution"),
    }
}

use crate::core::errors::ApiError;
use crate::history::{Feedback, InquiryLogStore};

/// Operator verdicts on past answers.
#[derive(Clone)]
pub struct FeedbackIntake {
    logs: InquiryLogStore,
}

impl FeedbackIntake {
    pub fn new(logs: InquiryLogStore) -> Self {
        Self { logs }
    }

    /// Overwrites the log's feedback; a blank resolution is stored as absent.
    /// Unknown log ids are `NotFound`, storage failures `Internal`.
    pub async fn submit(
        &self,
        log_id: &str,
        feedback: Feedback,
        final_resolution: Option<&str>,
    ) -> Result<(), ApiError> {
        let resolution = final_resolution.map(str::trim).filter(|r| !r.is_empty());
        self.logs
            .record_feedback(log_id.trim(), feedback, resolution)
            .await?;

        tracing::info!(
            log_id = %log_id,
            feedback = %feedback,
            has_resolution = resolution.is_some(),
            "Feedback recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::fixtures::temp_pool;

    async fn intake() -> (FeedbackIntake, InquiryLogStore) {
        let logs = InquiryLogStore::with_pool(temp_pool("feedback").await)
            .await
            .unwrap();
        (FeedbackIntake::new(logs.clone()), logs)
    }

    #[tokio::test]
    async fn last_write_wins() {
        let (intake, logs) = intake().await;
        logs.insert("L1", "C1", "q", "a").await.unwrap();

        intake.submit("L1", Feedback::Failure, Some("교환")).await.unwrap();
        intake.submit("L1", Feedback::Failure, Some("환불")).await.unwrap();

        let log = logs.get("L1").await.unwrap().unwrap();
        assert_eq!(log.feedback, Some(Feedback::Failure));
        assert_eq!(log.final_resolution.as_deref(), Some("환불"));
    }

    #[tokio::test]
    async fn blank_resolution_is_absent() {
        let (intake, logs) = intake().await;
        logs.insert("L1", "C1", "q", "a").await.unwrap();

        intake.submit("L1", Feedback::Failure, Some("   ")).await.unwrap();
        assert!(logs.get("L1").await.unwrap().unwrap().final_resolution.is_none());
    }

    #[tokio::test]
    async fn unknown_log_is_not_found() {
        let (intake, _) = intake().await;
        let err = intake.submit("nope", Feedback::Success, None).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use super::error::LearningError;
use super::queue::{LearningOpportunity, LearningQueue};
use crate::core::config::defaults::EvolutionConfig;
use crate::core::errors::{ApiError, ContentError};
use crate::history::{FailureRecord, InquiryLogStore};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::documents::{learned_cs_document, learned_review_document};
use crate::rag::KnowledgeBase;

const CS_SYSTEM_PROMPT: &str = "당신은 CS 에이전트의 지식베이스를 개선하는 AI입니다. \
고객의 질문, AI의 실패한 답변, 상담원의 올바른 해결책을 바탕으로, \
미래에 유사한 질문에 완벽하게 답변할 수 있는 간결하고 명확한 '질문-답변' 형식의 지식 조각 1개를 생성해야 합니다.";

const REVIEW_SYSTEM_PROMPT: &str = "당신은 고객 리뷰를 분석하여 잠재적인 고객 질문을 예측하고, \
이에 대한 모범 답변을 생성하는 AI입니다. 주어진 리뷰 내용을 바탕으로, 고객들이 궁금해할 만한 질문과 \
그에 대한 상세하고 친절한 답변을 '질문-답변' 형식의 지식 조각으로 생성해야 합니다.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub found: usize,
    pub learned: usize,
    pub failed: usize,
    /// Items processed whose queue state could not be written back.
    pub unrecorded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvolutionReport {
    pub failure_logs: BranchReport,
    pub review_opportunities: BranchReport,
    pub released_stale_claims: u64,
}

/// Offline learning pass: turns resolved failures and queued review complaints
/// into retrievable Q&A fragments.
pub struct EvolutionRunner {
    logs: InquiryLogStore,
    queue: LearningQueue,
    knowledge: KnowledgeBase,
    llm: Arc<dyn LlmProvider>,
    model: String,
    settings: EvolutionConfig,
}

impl EvolutionRunner {
    pub fn new(
        logs: InquiryLogStore,
        queue: LearningQueue,
        knowledge: KnowledgeBase,
        llm: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        settings: EvolutionConfig,
    ) -> Self {
        Self {
            logs,
            queue,
            knowledge,
            llm,
            model: model.into(),
            settings,
        }
    }

    /// Per-item failures, including queue write-backs, are counted and
    /// skipped; only failing to read the log table or the queue aborts the run.
    pub async fn run(&self) -> Result<EvolutionReport, ApiError> {
        let mut report = EvolutionReport::default();

        let failures = self.logs.unlearned_failures().await?;
        report.failure_logs.found = failures.len();
        tracing::info!("Evolution: {} unlearned failure logs", failures.len());

        for failure in &failures {
            match self.learn_from_failure(failure).await {
                Ok(()) => report.failure_logs.learned += 1,
                Err(e) => {
                    tracing::warn!("Evolution: skipped log {}: {}", failure.log_id, e);
                    report.failure_logs.failed += 1;
                }
            }
        }

        let cutoff = Utc::now() - Duration::minutes(self.settings.stale_claim_minutes);
        report.released_stale_claims = self.queue.release_stale(cutoff).await?;
        if report.released_stale_claims > 0 {
            tracing::warn!(
                "Evolution: released {} abandoned claims",
                report.released_stale_claims
            );
        }

        let opportunities = self.queue.claim_pending(Utc::now()).await?;
        report.review_opportunities.found = opportunities.len();
        tracing::info!("Evolution: {} review learning opportunities", opportunities.len());

        for item in &opportunities {
            let recorded = match self.learn_from_review(item).await {
                Ok(()) => {
                    report.review_opportunities.learned += 1;
                    self.queue.ack(&item.review_id).await
                }
                Err(e) => {
                    tracing::warn!("Evolution: review {} failed: {}", item.review_id, e);
                    report.review_opportunities.failed += 1;
                    self.queue.mark_failed(&item.review_id, &e.to_string()).await
                }
            };
            // Row stays claimed; release_stale hands it back to a later run.
            if let Err(e) = recorded {
                tracing::error!("Evolution: queue state for review {} not recorded: {}", item.review_id, e);
                report.review_opportunities.unrecorded += 1;
            }
        }

        tracing::info!(
            learned_cs = report.failure_logs.learned,
            learned_review = report.review_opportunities.learned,
            "Evolution run finished"
        );
        Ok(report)
    }

    async fn learn_from_failure(&self, failure: &FailureRecord) -> Result<(), LearningError> {
        let Some(resolution) = failure.final_resolution.as_deref() else {
            return Err(ContentError::MissingField("final_resolution").into());
        };

        let user_prompt = format!(
            "다음은 AI가 실패한 상담 기록입니다.\n- 고객 질문: {}\n- AI의 잘못된 답변: {}\n- 올바른 해결책: {}\n\n\
             위 정보를 바탕으로, 이 상황에 가장 적합한 '질문-답변' 형식의 새로운 지식 1개를 생성해주세요.",
            failure.input_text, failure.failed_answer, resolution
        );
        let fragment = self.synthesize(CS_SYSTEM_PROMPT, user_prompt).await?;

        self.knowledge
            .ingest(vec![learned_cs_document(&failure.log_id, &fragment)])
            .await?;

        // Same document id next run, so a missed mark only re-ingests.
        if let Err(e) = self.logs.mark_learned(&failure.log_id).await {
            tracing::error!("Evolution: log {} ingested but not marked learned: {}", failure.log_id, e);
        }
        Ok(())
    }

    async fn learn_from_review(&self, item: &LearningOpportunity) -> Result<(), LearningError> {
        let user_prompt = format!(
            "다음은 고객이 남긴 부정적인 리뷰입니다.\n- 리뷰 분류: {}\n- 리뷰 내용: {}\n\n\
             이 리뷰를 본 다른 고객이 궁금해할 만한 예상 질문과, 그에 대한 상세하고 친절한 답변을 \
             '질문-답변' 형식으로 생성해주세요. (예: Q: 이 제품 내구성이 어떤가요? A: ...)",
            item.category, item.review_text
        );
        let fragment = self.synthesize(REVIEW_SYSTEM_PROMPT, user_prompt).await?;

        self.knowledge
            .ingest(vec![learned_review_document(
                &item.review_id,
                &item.category,
                &fragment,
            )])
            .await?;
        Ok(())
    }

    async fn synthesize(&self, system: &str, user: String) -> Result<String, LearningError> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let response = self.llm.chat(request, &self.model).await?;
        let fragment = response.content_or_empty().trim();
        if fragment.is_empty() {
            return Err(ContentError::Empty.into());
        }
        Ok(fragment.to_string())
    }
}

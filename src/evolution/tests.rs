use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;

use super::{
    EvolutionRunner, LearningOpportunity, LearningQueue, ReviewAnalyzer, ReviewCategory,
};
use crate::commerce::fixtures::{review, temp_db_path, temp_pool};
use crate::core::config::defaults::EvolutionConfig;
use crate::history::{Feedback, InquiryLogStore};
use crate::llm::testing::ScriptedProvider;
use crate::llm::types::{ChatRequest, ChatResponse, ResponseFormat};
use crate::llm::{LlmError, LlmProvider, Role};
use crate::rag::{DocType, KnowledgeBase, SqliteKnowledgeStore};

struct Harness {
    runner: EvolutionRunner,
    llm: Arc<ScriptedProvider>,
    logs: InquiryLogStore,
    queue: LearningQueue,
    knowledge: KnowledgeBase,
}

async fn harness() -> Harness {
    let llm = Arc::new(ScriptedProvider::new());
    let pool = temp_pool("evolution").await;
    let logs = InquiryLogStore::with_pool(pool.clone()).await.unwrap();
    let queue = LearningQueue::with_pool(pool).await.unwrap();
    let store = SqliteKnowledgeStore::open(&temp_db_path("evolution-kb")).await.unwrap();
    let knowledge = KnowledgeBase::new(Arc::new(store), llm.clone(), "text-embedding-3-small", 5);

    let runner = EvolutionRunner::new(
        logs.clone(),
        queue.clone(),
        knowledge.clone(),
        llm.clone(),
        "gpt-4o",
        EvolutionConfig::default(),
    );

    Harness {
        runner,
        llm,
        logs,
        queue,
        knowledge,
    }
}

async fn failed_log(logs: &InquiryLogStore, id: &str, resolution: Option<&str>) {
    logs.insert(id, "C1", "교환 가능한가요?", "교환은 불가능합니다.")
        .await
        .unwrap();
    logs.record_feedback(id, Feedback::Failure, resolution)
        .await
        .unwrap();
}

#[tokio::test]
async fn one_failure_log_is_learned_exactly_once() {
    let h = harness().await;
    failed_log(&h.logs, "L1", Some("수령 7일 이내 미개봉 상품은 교환 가능")).await;
    h.llm
        .push_text("Q: 받은 상품 교환 되나요?\nA: 수령 후 7일 이내 미개봉 상품은 교환 가능합니다.");

    let first = h.runner.run().await.unwrap();
    assert_eq!(first.failure_logs.found, 1);
    assert_eq!(first.failure_logs.learned, 1);
    assert_eq!(h.knowledge.count(Some(DocType::LearnedCs)).await.unwrap(), 1);

    let doc = h.knowledge.get("learned-cs-L1").await.unwrap().unwrap();
    assert!(doc.text.contains("7일 이내"));
    assert_eq!(doc.metadata["domain"], "learned-cs");
    assert!(h.logs.get("L1").await.unwrap().unwrap().learned);

    let second = h.runner.run().await.unwrap();
    assert_eq!(second.failure_logs.found, 0);
    assert_eq!(h.knowledge.count(Some(DocType::LearnedCs)).await.unwrap(), 1);
    assert_eq!(h.llm.requests().len(), 1);
}

#[tokio::test]
async fn synthesis_prompt_carries_query_wrong_answer_and_resolution() {
    let h = harness().await;
    failed_log(&h.logs, "L1", Some("미개봉 시 교환 가능")).await;
    h.llm.push_text("Q: A:");

    h.runner.run().await.unwrap();

    let (request, model) = &h.llm.requests()[0];
    assert_eq!(model, "gpt-4o");
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.max_tokens, Some(500));
    assert_eq!(request.messages[0].role, Role::System);
    let user = request.messages[1].text().unwrap();
    assert!(user.contains("교환 가능한가요?"));
    assert!(user.contains("교환은 불가능합니다."));
    assert!(user.contains("미개봉 시 교환 가능"));
}

#[tokio::test]
async fn logs_without_resolution_or_with_success_are_not_eligible() {
    let h = harness().await;
    failed_log(&h.logs, "L1", None).await;
    h.logs.insert("L2", "C1", "q", "a").await.unwrap();
    h.logs
        .record_feedback("L2", Feedback::Success, Some("ok"))
        .await
        .unwrap();

    let report = h.runner.run().await.unwrap();
    assert_eq!(report.failure_logs.found, 0);
    assert!(h.llm.requests().is_empty());
}

#[tokio::test]
async fn synthesis_failure_keeps_log_unlearned_and_continues() {
    let h = harness().await;
    failed_log(&h.logs, "L1", Some("해결1")).await;
    failed_log(&h.logs, "L2", Some("해결2")).await;
    h.llm.push(Err(LlmError::Transport("timeout".to_string())));
    h.llm.push_text("Q: 두번째 A: 학습");

    let report = h.runner.run().await.unwrap();
    assert_eq!(report.failure_logs.found, 2);
    assert_eq!(report.failure_logs.learned, 1);
    assert_eq!(report.failure_logs.failed, 1);
    assert!(!h.logs.get("L1").await.unwrap().unwrap().learned);
    assert!(h.logs.get("L2").await.unwrap().unwrap().learned);
}

#[tokio::test]
async fn ingest_failure_keeps_log_unlearned() {
    let h = harness().await;
    failed_log(&h.logs, "L1", Some("해결")).await;
    h.llm.push_text("Q: A:");
    h.llm.fail_embeddings();

    let report = h.runner.run().await.unwrap();
    assert_eq!(report.failure_logs.failed, 1);
    assert!(!h.logs.get("L1").await.unwrap().unwrap().learned);
}

#[tokio::test]
async fn queued_reviews_become_learned_review_documents() {
    let h = harness().await;
    h.queue
        .enqueue(&LearningOpportunity {
            review_id: "REV-1002".to_string(),
            category: "제품 품질 불만".to_string(),
            review_text: "김치가 너무 시어요".to_string(),
        })
        .await
        .unwrap();
    h.queue
        .enqueue(&LearningOpportunity {
            review_id: "REV-1003".to_string(),
            category: "배송 불만".to_string(),
            review_text: "일주일 걸렸어요".to_string(),
        })
        .await
        .unwrap();
    h.llm.push_text("Q: 김치 숙성도는 어떤가요? A: 출고 시점 기준 ...");
    h.llm.push(Err(LlmError::Status {
        status: 500,
        body: "oops".to_string(),
    }));

    let report = h.runner.run().await.unwrap();
    assert_eq!(report.review_opportunities.found, 2);
    assert_eq!(report.review_opportunities.learned, 1);
    assert_eq!(report.review_opportunities.failed, 1);

    let doc = h.knowledge.get("learned-review-REV-1002").await.unwrap().unwrap();
    assert_eq!(doc.doc_type, DocType::LearnedReview);
    assert_eq!(doc.metadata["category"], "제품 품질 불만");

    let counts = h.queue.status_counts().await.unwrap();
    assert_eq!(counts["done"], 1);
    assert_eq!(counts["failed"], 1);

    let again = h.runner.run().await.unwrap();
    assert_eq!(again.review_opportunities.found, 0);
}

/// Answers every chat, but on the first one moves a queued review back to
/// pending, as a concurrent stale-claim release would.
struct ReleasingProvider {
    inner: ScriptedProvider,
    pool: SqlitePool,
    review_id: String,
    released: AtomicBool,
}

#[async_trait]
impl LlmProvider for ReleasingProvider {
    fn name(&self) -> &str {
        "releasing"
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatResponse, LlmError> {
        if !self.released.swap(true, Ordering::SeqCst) {
            sqlx::query("UPDATE learning_opportunities SET status = 'pending' WHERE review_id = ?")
                .bind(&self.review_id)
                .execute(&self.pool)
                .await
                .unwrap();
        }
        self.inner.chat(request, model_id).await
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        self.inner.embed(inputs, model_id).await
    }
}

#[tokio::test]
async fn queue_write_back_failure_does_not_stop_the_run() {
    let pool = temp_pool("evolution-ack").await;
    let logs = InquiryLogStore::with_pool(pool.clone()).await.unwrap();
    let queue = LearningQueue::with_pool(pool.clone()).await.unwrap();
    let llm = Arc::new(ReleasingProvider {
        inner: ScriptedProvider::new(),
        pool,
        review_id: "R1".to_string(),
        released: AtomicBool::new(false),
    });
    llm.inner.push_text("Q: 첫번째 A: 답");
    llm.inner.push_text("Q: 두번째 A: 답");
    let store = SqliteKnowledgeStore::open(&temp_db_path("evolution-ack-kb")).await.unwrap();
    let knowledge = KnowledgeBase::new(Arc::new(store), llm.clone(), "text-embedding-3-small", 5);
    let runner = EvolutionRunner::new(
        logs,
        queue.clone(),
        knowledge.clone(),
        llm.clone(),
        "gpt-4o",
        EvolutionConfig::default(),
    );

    for id in ["R1", "R2"] {
        queue
            .enqueue(&LearningOpportunity {
                review_id: id.to_string(),
                category: "배송 불만".to_string(),
                review_text: format!("{} 배송이 늦어요", id),
            })
            .await
            .unwrap();
    }

    let report = runner.run().await.unwrap();
    assert_eq!(report.review_opportunities.found, 2);
    assert_eq!(report.review_opportunities.learned, 2);
    assert_eq!(report.review_opportunities.unrecorded, 1);
    assert_eq!(llm.inner.requests().len(), 2);
    assert!(knowledge.get("learned-review-R2").await.unwrap().is_some());

    let counts = queue.status_counts().await.unwrap();
    assert_eq!(counts["done"], 1);
    assert_eq!(counts["pending"], 1);
}

#[tokio::test]
async fn analyzer_reports_categories_urgency_and_enqueues_learnable_complaints() {
    let llm = Arc::new(ScriptedProvider::new());
    let queue = LearningQueue::with_pool(temp_pool("analyzer").await).await.unwrap();
    let analyzer = ReviewAnalyzer::new(llm.clone(), "gpt-4o", 2);

    let mut broken = review("REV-1", 1000016, 1, "뚜껑이 깨져서 왔어요", 3);
    broken.image_url = Some("https://img.example/lid.jpg".to_string());
    let reviews = vec![
        broken,
        review("REV-2", 1000001, 5, "맛있어요", 5),
        review("REV-3", 1000001, 3, "배송이 조금 늦었어요", 7),
        review("REV-4", 1000004, 2, "비싸요", 9),
    ];

    llm.push_text(
        &json!({"category": "제품 품질 불만", "is_urgent": true, "summary": "용기 파손", "draft_reply": "죄송합니다"})
            .to_string(),
    );
    llm.push_text(
        &json!({"category": "긍정적 피드백", "is_urgent": false, "summary": "맛 만족", "draft_reply": "감사합니다"})
            .to_string(),
    );
    llm.push_text(
        &json!({"category": "배송 불만", "is_urgent": false, "summary": "배송 지연", "draft_reply": "죄송합니다"})
            .to_string(),
    );
    llm.push_text("not json");

    let report = analyzer.analyze_all(&reviews, &queue).await.unwrap();
    assert_eq!(report.analyzed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.category_counts["제품 품질 불만"], 1);
    assert_eq!(report.category_counts["배송 불만"], 1);
    assert_eq!(report.urgent.len(), 1);
    assert_eq!(report.urgent[0].review_id, "REV-1");
    // REV-3 is a delivery complaint but rated 3.
    assert_eq!(report.enqueued, 1);

    let requests = llm.requests();
    assert_eq!(requests[0].0.response_format, Some(ResponseFormat::JsonObject));
    let user = serde_json::to_value(&requests[0].0.messages[1]).unwrap();
    assert_eq!(user["content"][1]["image_url"]["url"], "https://img.example/lid.jpg");
    let plain = serde_json::to_value(&requests[1].0.messages[1]).unwrap();
    assert_eq!(plain["content"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn analyzer_does_not_requeue_known_reviews() {
    let llm = Arc::new(ScriptedProvider::new());
    let queue = LearningQueue::with_pool(temp_pool("analyzer").await).await.unwrap();
    let analyzer = ReviewAnalyzer::new(llm.clone(), "gpt-4o", 2);
    let reviews = vec![review("REV-1", 1000016, 1, "곰팡이", 1)];
    let verdict =
        json!({"category": "제품 품질 불만", "is_urgent": true, "summary": "곰팡이", "draft_reply": "."})
            .to_string();

    llm.push_text(&verdict);
    llm.push_text(&verdict);
    assert_eq!(analyzer.analyze_all(&reviews, &queue).await.unwrap().enqueued, 1);
    assert_eq!(analyzer.analyze_all(&reviews, &queue).await.unwrap().enqueued, 0);
}

#[test]
fn unknown_category_labels_fall_back_to_other() {
    assert_eq!(ReviewCategory::from_label("배송 불만"), ReviewCategory::Delivery);
    assert_eq!(ReviewCategory::from_label("포장 불만"), ReviewCategory::Other);
    assert!(ReviewCategory::ProductQuality.is_learnable());
    assert!(!ReviewCategory::Price.is_learnable());
}

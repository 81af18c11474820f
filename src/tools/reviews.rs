//! Model-backed review tools.

use serde::Deserialize;

use crate::commerce::Review;
use crate::llm::structured::parse_json_object;
use crate::llm::{ChatMessage, ChatRequest, LlmError, LlmProvider};

pub const NO_NEGATIVE_REVIEWS: &str = "최근 기간 동안 접수된 부정 리뷰가 없습니다.";

const SUMMARY_SYSTEM_PROMPT: &str = "당신은 스마트스토어 리뷰 분석가입니다. \
주어진 부정 리뷰들을 읽고 카테고리별 패턴, 가장 흔한 불만, 판매자가 즉시 취해야 할 조치를 \
3~5문장의 짧은 보고서로 작성하세요.";

const REPLY_SYSTEM_PROMPT: &str = "당신은 네이버 스마트스토어의 리뷰 관리 담당자입니다. \
고객 리뷰에 대한 공손하고 전문적인 답변 초안을 작성하고, \
반드시 {\"draft_reply\": \"...\"} 형식의 JSON 객체 하나만 출력하세요.";

#[derive(Debug, Deserialize)]
struct DraftReply {
    draft_reply: String,
}

pub async fn summarize_negative_reviews(
    llm: &dyn LlmProvider,
    model: &str,
    reviews: &[Review],
    days: u32,
) -> Result<String, LlmError> {
    if reviews.is_empty() {
        return Ok(NO_NEGATIVE_REVIEWS.to_string());
    }

    let listing = reviews
        .iter()
        .map(|r| format!("- [상품 {} / 평점 {}] {}", r.product_id, r.rating, r.review_text))
        .collect::<Vec<_>>()
        .join("\n");
    let user_prompt = format!(
        "최근 {}일간 접수된 부정 리뷰 {}건입니다.\n{}",
        days,
        reviews.len(),
        listing
    );

    let request = ChatRequest::new(vec![
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(user_prompt),
    ])
    .with_temperature(0.3);

    let response = llm.chat(request, model).await?;
    Ok(response.content_or_empty().trim().to_string())
}

/// Draft reply text. Output that is not the requested JSON object becomes a
/// fallback message carrying the parse error.
pub async fn draft_review_reply(
    llm: &dyn LlmProvider,
    model: &str,
    review_text: &str,
    product_name: &str,
) -> Result<String, LlmError> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(REPLY_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "상품명: {}\n리뷰 내용: {}\n\n위 리뷰에 대한 답변 초안을 작성해주세요.",
            product_name, review_text
        )),
    ])
    .with_temperature(0.7)
    .json_mode();

    let response = llm.chat(request, model).await?;
    Ok(match parse_json_object::<DraftReply>(response.content_or_empty()) {
        Ok(reply) => reply.draft_reply,
        Err(e) => {
            tracing::warn!("Review reply was not valid JSON: {}", e);
            format!("AI 답변 생성 실패 (JSON 오류: {})", e)
        }
    })
}

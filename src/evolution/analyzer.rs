//! Batch review triage: categorize, flag urgent ones, draft replies and feed
//! actionable complaints into the learning queue.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::LearningError;
use super::queue::{LearningOpportunity, LearningQueue};
use crate::commerce::Review;
use crate::core::errors::ApiError;
use crate::llm::structured::parse_json_object;
use crate::llm::{ChatMessage, ChatRequest, ContentPart, ImageUrl, LlmProvider};

const ANALYSIS_SYSTEM_PROMPT: &str = "당신은 네이버 스마트스토어의 리뷰 관리 AI입니다. \
주어진 고객 리뷰를 분석하여, 지정된 JSON 형식으로만 출력해야 합니다. \
이미지 URL이 제공되면 이미지 내용까지 함께 분석하세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewCategory {
    Positive,
    ProductQuality,
    Delivery,
    Price,
    Other,
}

impl ReviewCategory {
    pub const ALL: [ReviewCategory; 5] = [
        ReviewCategory::Positive,
        ReviewCategory::ProductQuality,
        ReviewCategory::Delivery,
        ReviewCategory::Price,
        ReviewCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReviewCategory::Positive => "긍정적 피드백",
            ReviewCategory::ProductQuality => "제품 품질 불만",
            ReviewCategory::Delivery => "배송 불만",
            ReviewCategory::Price => "가격 불만",
            ReviewCategory::Other => "기타",
        }
    }

    /// Labels outside the fixed set fall into `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(ReviewCategory::Other)
    }

    pub fn is_learnable(&self) -> bool {
        matches!(self, ReviewCategory::ProductQuality | ReviewCategory::Delivery)
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ReviewCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ReviewCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAnalysis {
    pub category: ReviewCategory,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub draft_reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrgentReview {
    pub review_id: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewAnalysisReport {
    pub analyzed: usize,
    pub failed: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub urgent: Vec<UrgentReview>,
    pub enqueued: usize,
}

pub struct ReviewAnalyzer {
    llm: Arc<dyn LlmProvider>,
    model: String,
    learnable_max_rating: i64,
}

impl ReviewAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>, learnable_max_rating: i64) -> Self {
        Self {
            llm,
            model: model.into(),
            learnable_max_rating,
        }
    }

    pub async fn analyze(&self, review: &Review) -> Result<ReviewAnalysis, LearningError> {
        let instructions = format!(
            "다음 고객 리뷰를 분석하고, 아래 지침에 따라 JSON 형식으로 결과를 반환해주세요.\n\n\
             - 리뷰 텍스트: {}\n- 별점: {}/5\n\n\
             [분석 요청]\n\
             1. `category`: 리뷰를 다음 중 하나로 분류하세요: [\"긍정적 피드백\", \"제품 품질 불만\", \"배송 불만\", \"가격 불만\", \"기타\"]\n\
             2. `is_urgent`: 관리자의 즉각적인 개입이 필요한 긴급한 리뷰인지 boolean 값(true/false)으로 판단하세요. (예: 제품 파손, 안전 문제, 심각한 불만)\n\
             3. `summary`: 리뷰의 핵심 내용을 1-2 문장으로 요약하세요.\n\
             4. `draft_reply`: 고객에게 회신할 답변의 초안을 공손하고 전문적인 톤으로 작성하세요.\n\n\
             [출력 형식]\n\
             {{\"category\": \"...\", \"is_urgent\": true/false, \"summary\": \"...\", \"draft_reply\": \"...\"}}",
            review.review_text, review.rating
        );

        let mut parts = vec![ContentPart::Text { text: instructions }];
        if let Some(url) = review.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: url.to_string(),
                },
            });
        }

        let request = ChatRequest::new(vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user_parts(parts),
        ])
        .json_mode();

        let response = self.llm.chat(request, &self.model).await?;
        Ok(parse_json_object::<ReviewAnalysis>(response.content_or_empty())?)
    }

    /// A review that fails analysis is counted and skipped. Queue write
    /// failures abort the batch.
    pub async fn analyze_all(
        &self,
        reviews: &[Review],
        queue: &LearningQueue,
    ) -> Result<ReviewAnalysisReport, ApiError> {
        let mut report = ReviewAnalysisReport::default();

        for review in reviews {
            let analysis = match self.analyze(review).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!("Review {} analysis failed: {}", review.review_id, e);
                    report.failed += 1;
                    continue;
                }
            };
            report.analyzed += 1;

            *report
                .category_counts
                .entry(analysis.category.label().to_string())
                .or_insert(0) += 1;

            if analysis.is_urgent {
                report.urgent.push(UrgentReview {
                    review_id: review.review_id.clone(),
                    summary: analysis.summary.clone(),
                });
            }

            if analysis.category.is_learnable() && review.rating <= self.learnable_max_rating {
                let inserted = queue
                    .enqueue(&LearningOpportunity {
                        review_id: review.review_id.clone(),
                        category: analysis.category.label().to_string(),
                        review_text: review.review_text.clone(),
                    })
                    .await?;
                if inserted {
                    tracing::info!("Review {} queued for learning", review.review_id);
                    report.enqueued += 1;
                }
            }
        }

        tracing::info!(
            analyzed = report.analyzed,
            failed = report.failed,
            urgent = report.urgent.len(),
            enqueued = report.enqueued,
            "Review analysis finished"
        );
        Ok(report)
    }
}

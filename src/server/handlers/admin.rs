use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::commerce::compute_warnings;
use crate::commerce::serialize::format_timestamp;
use crate::core::errors::ApiError;
use crate::state::AppState;

const SALES_TREND_DAYS: usize = 7;
const UNKNOWN_PRODUCT: &str = "알 수 없는 상품";

pub async fn kpis(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let kpis = state
        .commerce
        .kpis(state.config.admin.low_stock_threshold)
        .await?;
    Ok(Json(kpis))
}

pub async fn warnings(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rules = state.warning_rules();
    let admin = &state.config.admin;

    let low_stock = state
        .commerce
        .low_stock_products(admin.low_stock_threshold)
        .await?;
    let since = Utc::now() - Duration::hours(rules.window_hours);
    let recent_negative = state
        .commerce
        .negative_reviews(admin.negative_rating_threshold, Some(since))
        .await?;
    let catalog = state.commerce.products().await?;

    let warnings = compute_warnings(&low_stock, &recent_negative, &catalog, &rules);
    let messages: Vec<String> = warnings.iter().map(ToString::to_string).collect();

    Ok(Json(json!({
        "warnings": messages,
        "details": warnings,
    })))
}

pub async fn sales_trend(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let points = state.commerce.sales_trend(SALES_TREND_DAYS).await?;
    Ok(Json(json!({ "sales_trend": points })))
}

#[derive(Debug, Serialize)]
pub struct NegativeReviewEntry {
    pub review_id: String,
    pub product_name: String,
    pub rating: i64,
    pub review_text: String,
    pub created_at: String,
    pub draft_reply: String,
}

/// Every negative review, newest first, each with a model-drafted reply.
/// A failed draft degrades to a message in `draft_reply`.
pub async fn negative_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state
        .commerce
        .negative_reviews(state.config.admin.negative_rating_threshold, None)
        .await?;
    let product_names: HashMap<i64, String> = state
        .commerce
        .products()
        .await?
        .into_iter()
        .map(|p| (p.product_no, p.product_name))
        .collect();

    let mut entries = Vec::with_capacity(reviews.len());
    for review in reviews {
        let product_name = product_names
            .get(&review.product_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());

        let draft_reply = match state
            .tools
            .draft_review_reply(&review.review_text, &product_name)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Draft reply for {} failed: {}", review.review_id, e);
                format!("AI 답변 생성 실패 (예외: {})", e)
            }
        };

        entries.push(NegativeReviewEntry {
            review_id: review.review_id,
            product_name,
            rating: review.rating,
            review_text: review.review_text,
            created_at: format_timestamp(review.created_at),
            draft_reply,
        });
    }

    Ok(Json(json!({ "negative_reviews": entries })))
}

#[derive(Debug, Deserialize)]
pub struct SegmentQuery {
    pub segment: String,
}

pub async fn customers_by_segment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SegmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = query.segment.trim();
    if segment.is_empty() {
        return Err(ApiError::BadRequest("segment is required".to_string()));
    }
    let customers = state.commerce.customers_by_segment(segment).await?;
    Ok(Json(json!({ "customers": customers })))
}

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub customer_ids: Vec<String>,
    pub coupon_details: String,
}

/// Simulated: the request is only logged.
pub async fn send_coupon(Json(request): Json<CouponRequest>) -> impl IntoResponse {
    tracing::info!(
        recipients = request.customer_ids.len(),
        customer_ids = ?request.customer_ids,
        "Coupon send requested: {}",
        request.coupon_details
    );
    Json(json!({
        "message": format!(
            "{}명의 고객에게 쿠폰 발송 요청이 접수되었습니다. (시뮬레이션)",
            request.customer_ids.len()
        )
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReplyApproval {
    pub review_id: String,
    pub approved_reply: String,
}

/// Simulated: the approval is only logged.
pub async fn approve_review_reply(Json(approval): Json<ReplyApproval>) -> impl IntoResponse {
    tracing::info!(
        review_id = %approval.review_id,
        "Review reply approved: {}",
        approval.approved_reply
    );
    Json(json!({ "message": "리뷰 답변이 성공적으로 승인 및 게시되었습니다. (시뮬레이션)" }))
}

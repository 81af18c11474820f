use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::router::router;
use crate::commerce::fixtures::sample_snapshot;
use crate::core::config::{AppConfig, AppPaths};
use crate::history::Feedback;
use crate::llm::testing::ScriptedProvider;
use crate::llm::{ChatResponse, ToolCall};
use crate::state::AppState;

async fn test_state(llm: Arc<ScriptedProvider>) -> Arc<AppState> {
    let dir = std::env::temp_dir().join(format!("cs-agent-server-{}", uuid::Uuid::new_v4()));
    let paths = Arc::new(AppPaths::under(dir.clone(), dir));
    let state = AppState::build(paths, AppConfig::default(), llm).await.unwrap();
    state.commerce.replace_all(&sample_snapshot()).await.unwrap();
    Arc::new(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn chat_returns_log_id_response_and_tool_flag() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push(Ok(ChatResponse::with_tool_calls(vec![ToolCall::function(
        "call_1",
        "get_order_details",
        json!({ "customer_id": "C1" }),
    )])));
    llm.push_text("주문하신 상품은 배송 완료되었습니다.");
    let state = test_state(llm).await;

    let (status, body) = send(
        router(state.clone()),
        post_json("/api/chat", json!({ "customer_id": "C1", "query": "내 주문 상태 알려줘" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool_used"], true);
    assert_eq!(body["response"], "주문하신 상품은 배송 완료되었습니다.");
    let log_id = body["log_id"].as_str().unwrap();
    assert!(state.logs.get(log_id).await.unwrap().is_some());
}

#[tokio::test]
async fn chat_rejects_unknown_complexity() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;
    let (status, _) = send(
        router(state),
        post_json(
            "/api/chat",
            json!({ "customer_id": "C1", "query": "문의", "complexity": "extreme" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn feedback_form_updates_log_and_unknown_id_is_404() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;
    state.logs.insert("L1", "C1", "q", "a").await.unwrap();

    let (status, _) = send(
        router(state.clone()),
        post_form(
            "/api/feedback",
            "log_id=L1&resolution_feedback=failure&final_resolution=%EA%B5%90%ED%99%98",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let log = state.logs.get("L1").await.unwrap().unwrap();
    assert_eq!(log.feedback, Some(Feedback::Failure));
    assert_eq!(log.final_resolution.as_deref(), Some("교환"));

    let (status, body) = send(
        router(state.clone()),
        post_form("/api/feedback", "log_id=missing&resolution_feedback=success"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(
        router(state),
        post_form("/api/feedback", "log_id=L1&resolution_feedback=maybe"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_kpis_and_warnings() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;

    let (status, kpis) = send(router(state.clone()), get("/api/admin/kpis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis["unanswered_qnas"], 1);
    assert_eq!(kpis["pending_claims"], 1);
    assert_eq!(kpis["low_stock_products"], 1);

    let (_, warnings) = send(router(state), get("/api/admin/warnings")).await;
    let messages: Vec<&str> = warnings["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(messages.iter().any(|m| m.starts_with("[재고 경고] '왕갈비탕 2팩 세트'")));
    assert!(messages
        .iter()
        .any(|m| m.contains("'수제 김치 1kg' 상품, 24시간 내 부정 리뷰 3건")));
}

#[tokio::test]
async fn sales_trend_and_segment_lookup() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;

    let (_, trend) = send(router(state.clone()), get("/api/admin/sales_trend")).await;
    let points = trend["sales_trend"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["date"], "2024-05-09");

    let (_, vip) = send(
        router(state.clone()),
        get("/api/admin/customers_by_segment?segment=VIP"),
    )
    .await;
    assert_eq!(vip["customers"][0]["customer_id"], "C1");

    let (status, _) = send(router(state), get("/api/admin/customers_by_segment?segment=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_reviews_carry_draft_replies_newest_first() {
    let llm = Arc::new(ScriptedProvider::new());
    llm.push_text(r#"{"draft_reply": "불편을 드려 죄송합니다."}"#);
    llm.push_text("not json");
    let state = test_state(llm).await;

    let (_, body) = send(router(state), get("/api/admin/negative_reviews")).await;
    let entries = body["negative_reviews"].as_array().unwrap();
    let ids: Vec<&str> = entries
        .iter()
        .map(|e| e["review_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["REV-1002", "REV-1003", "REV-1004"]);
    assert_eq!(entries[0]["product_name"], "수제 김치 1kg");
    assert_eq!(entries[0]["draft_reply"], "불편을 드려 죄송합니다.");
    assert!(entries[1]["draft_reply"]
        .as_str()
        .unwrap()
        .starts_with("AI 답변 생성 실패 (JSON 오류"));
    assert!(entries[2]["draft_reply"]
        .as_str()
        .unwrap()
        .starts_with("AI 답변 생성 실패 (예외"));
}

#[tokio::test]
async fn simulated_admin_actions_acknowledge() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;

    let (status, body) = send(
        router(state.clone()),
        post_json(
            "/api/admin/send_coupon",
            json!({ "customer_ids": ["C1", "C2"], "coupon_details": "10% 할인" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("2명의 고객"));

    let (status, _) = send(
        router(state),
        post_json(
            "/api/admin/approve_review_reply",
            json!({ "review_id": "REV-1002", "approved_reply": "죄송합니다" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let state = test_state(Arc::new(ScriptedProvider::new())).await;
    let (status, body) = send(router(state.clone()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(router(state), get("/")).await;
    assert_eq!(status, StatusCode::OK);
}

use std::sync::Arc;

use serde_json::Value;

use super::ToolRegistry;
use crate::commerce::fixtures::seeded_store;
use crate::llm::testing::ScriptedProvider;
use crate::llm::ModelCatalog;

async fn registry() -> (ToolRegistry, Arc<ScriptedProvider>) {
    let llm = Arc::new(ScriptedProvider::new());
    let registry = ToolRegistry::new(seeded_store().await, llm.clone(), ModelCatalog::default(), 2);
    (registry, llm)
}

#[tokio::test]
async fn specs_cover_every_tool() {
    let (registry, _) = registry().await;
    let names: Vec<String> = registry
        .specs()
        .into_iter()
        .map(|s| s.function.name)
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"get_order_details".to_string()));
    assert!(names.contains(&"generate_review_reply".to_string()));
}

#[tokio::test]
async fn order_details_without_ids_is_structured_error() {
    let (registry, _) = registry().await;

    let value = registry.dispatch("get_order_details", "{}").await;
    assert!(value.get("error").is_some());
    assert_eq!(value["code"], "missing_arguments");

    let blank = registry
        .dispatch("get_order_details", r#"{"customer_id": "  "}"#)
        .await;
    assert_eq!(blank["code"], "missing_arguments");
}

#[tokio::test]
async fn order_details_by_customer() {
    let (registry, _) = registry().await;

    let value = registry
        .dispatch("get_order_details", r#"{"customer_id": "C1"}"#)
        .await;
    let orders = value.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], "O1");
    assert_eq!(orders[0]["order_status"], "DELIVERED");
    // Timestamps reach the model as ISO-8601 strings.
    assert!(orders[0]["payment_date"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn unknown_customer_is_not_found_value() {
    let (registry, _) = registry().await;
    let value = registry
        .dispatch("get_customer_info", r#"{"customer_id": "C404"}"#)
        .await;
    assert_eq!(value["code"], "not_found");
}

#[tokio::test]
async fn customer_rating_is_a_float() {
    let (registry, _) = registry().await;
    let value = registry
        .dispatch("get_customer_info", r#"{"customer_id": "C1"}"#)
        .await;
    assert_eq!(value["avg_rating"], Value::from(4.75));
    assert_eq!(value["last_order_date"], "2024-05-20");
}

#[tokio::test]
async fn unknown_tool_is_undefined_value() {
    let (registry, _) = registry().await;
    let value = registry.dispatch("refund_everything", "{}").await;
    assert_eq!(value["code"], "unknown_tool");
    assert!(value["error"].as_str().unwrap().contains("refund_everything"));
}

#[tokio::test]
async fn product_lookups_by_name_and_number() {
    let (registry, _) = registry().await;

    let by_name = registry
        .dispatch("get_product_info", r#"{"product_name": "왕갈비탕"}"#)
        .await;
    assert_eq!(by_name["product_no"], 1000001);

    let qnas = registry
        .dispatch("get_qna_by_product", r#"{"product_no": 1000004}"#)
        .await;
    assert_eq!(qnas["qnas"].as_array().unwrap().len(), 1);
    assert_eq!(qnas["qnas"][0]["question_id"], "QNA-2002");

    let reviews = registry
        .dispatch("get_reviews_by_product", r#"{"product_name": "김치"}"#)
        .await;
    assert_eq!(reviews["reviews"].as_array().unwrap().len(), 3);

    let missing = registry.dispatch("get_product_info", "{}").await;
    assert_eq!(missing["code"], "missing_arguments");
}

#[tokio::test]
async fn top_margin_defaults_to_three_over_seven_days() {
    let (registry, _) = registry().await;
    let value = registry.dispatch("get_top_margin_products", "{}").await;
    let rows = value.as_array().unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows[0]["margin"].as_i64().unwrap() >= rows[1]["margin"].as_i64().unwrap());
    assert!(rows[0]["margin_percentage"].is_f64());
}

#[tokio::test]
async fn negative_review_summary_uses_the_model() {
    let (registry, llm) = registry().await;
    llm.push_text("김치 상품의 변질 불만이 집중되고 있습니다.");

    let value = registry
        .dispatch("summarize_recent_negative_reviews", r#"{"days": 7}"#)
        .await;
    assert_eq!(value["review_count"], 3);
    assert_eq!(value["summary"], "김치 상품의 변질 불만이 집중되고 있습니다.");
    assert_eq!(llm.requests()[0].1, "gpt-4o");
}

#[tokio::test]
async fn model_failure_in_tool_is_structured() {
    let (registry, _) = registry().await;
    // Script is empty, so the provider reports a transport failure.
    let value = registry
        .dispatch(
            "generate_review_reply",
            r#"{"review_text": "별로예요", "product_name": "밀키트"}"#,
        )
        .await;
    assert_eq!(value["code"], "model_failed");
}

#[tokio::test]
async fn review_reply_tool_returns_draft() {
    let (registry, llm) = registry().await;
    llm.push_text(r#"{"draft_reply": "소중한 의견 감사합니다."}"#);

    let value = registry
        .dispatch(
            "generate_review_reply",
            r#"{"review_text": "포장이 터졌어요", "product_name": "수제 김치 1kg"}"#,
        )
        .await;
    assert_eq!(value["draft_reply"], "소중한 의견 감사합니다.");
}

#[tokio::test]
async fn out_of_range_period_is_rejected_before_lookup() {
    let (registry, _) = registry().await;

    let value = registry
        .dispatch("get_top_margin_products", r#"{"period_days": 4294967295}"#)
        .await;
    assert_eq!(value["code"], "invalid_arguments");

    let reviews = registry
        .dispatch("summarize_recent_negative_reviews", r#"{"days": 4294967295}"#)
        .await;
    assert_eq!(reviews["code"], "invalid_arguments");
}

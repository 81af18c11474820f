//! Bulk load of the store platform's JSON exports into the relational tables
//! and the knowledge collection.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::commerce::serialize::{parse_date, parse_timestamp};
use crate::commerce::{
    CommerceSnapshot, CommerceStore, CsManual, Customer, Order, Product, Qna, Review,
    SettlementDay,
};
use crate::core::errors::ApiError;
use crate::rag::documents::{manual_documents, product_documents, qna_documents, review_documents};
use crate::rag::KnowledgeBase;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecord {
    customer_id: String,
    name: String,
    segment: String,
    #[serde(default)]
    total_spend: i64,
    #[serde(default)]
    total_orders: i64,
    last_order_date: Option<String>,
    main_category: Option<String>,
    avg_rating: Option<f64>,
    #[serde(default)]
    total_claims: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    origin_product_no: i64,
    product_name: String,
    category: CategoryRecord,
    price: PriceRecord,
    #[serde(default)]
    stock_quantity: i64,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRecord {
    category_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRecord {
    sale_price: i64,
    #[serde(default)]
    cost_price: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    product_order_id: String,
    order_id: String,
    product_info: OrderProductRecord,
    orderer: OrdererRecord,
    order_status: String,
    payment_date: Option<String>,
    delivery_complete_date: Option<String>,
    claim_data: Option<ClaimRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderProductRecord {
    origin_product_no: i64,
    product_name: String,
    quantity: i64,
    total_amount: i64,
}

#[derive(Debug, Deserialize)]
struct OrdererRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRecord {
    claim_type: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QnaRecord {
    question_id: String,
    origin_product_no: Option<i64>,
    customer_id: String,
    #[serde(default)]
    question_type: String,
    question_text: String,
    #[serde(default)]
    is_answered: bool,
    answer: Option<AnswerRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRecord {
    answer_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    review_id: String,
    customer_id: String,
    product_id: i64,
    rating: i64,
    review_text: String,
    #[serde(default)]
    image_url: Option<String>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettlementRecord {
    settle_date: String,
    #[serde(default)]
    total_payment_amount: i64,
    #[serde(default)]
    total_commission: i64,
    #[serde(default)]
    total_settlement_amount: i64,
}

#[derive(Debug, Deserialize)]
struct ManualRecord {
    manual_id: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    urgency: String,
    content_for_rag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub qnas: usize,
    pub reviews: usize,
    pub settlement_days: usize,
    pub manuals: usize,
    pub knowledge_documents: usize,
}

/// Replaces the relational contents with the exports in `dir`, then loads
/// manuals, products, Q&A and reviews into the knowledge collection.
pub async fn seed(
    dir: &Path,
    commerce: &CommerceStore,
    knowledge: &KnowledgeBase,
) -> Result<SeedReport, ApiError> {
    let snapshot = load_snapshot(dir).await;
    commerce.replace_all(&snapshot).await?;
    tracing::info!("Relational tables replaced from {}", dir.display());

    let mut documents = manual_documents(&snapshot.manuals);
    documents.extend(product_documents(&snapshot.products));
    documents.extend(qna_documents(&snapshot.qnas));
    documents.extend(review_documents(&snapshot.reviews));
    let knowledge_documents = knowledge.ingest(documents).await?;
    tracing::info!("{} documents loaded into the knowledge collection", knowledge_documents);

    Ok(SeedReport {
        customers: snapshot.customers.len(),
        products: snapshot.products.len(),
        orders: snapshot.orders.len(),
        qnas: snapshot.qnas.len(),
        reviews: snapshot.reviews.len(),
        settlement_days: snapshot.settlement.len(),
        manuals: snapshot.manuals.len(),
        knowledge_documents,
    })
}

/// Missing or malformed files are reported and read as empty.
pub async fn load_snapshot(dir: &Path) -> CommerceSnapshot {
    CommerceSnapshot {
        customers: read_records::<CustomerRecord>(dir, "customers.json")
            .await
            .into_iter()
            .map(customer_from)
            .collect(),
        products: read_records::<ProductRecord>(dir, "products.json")
            .await
            .into_iter()
            .map(product_from)
            .collect(),
        orders: read_records::<OrderRecord>(dir, "orders.json")
            .await
            .into_iter()
            .map(order_from)
            .collect(),
        qnas: read_records::<QnaRecord>(dir, "qnas.json")
            .await
            .into_iter()
            .map(qna_from)
            .collect(),
        reviews: read_records::<ReviewRecord>(dir, "reviews.json")
            .await
            .into_iter()
            .filter_map(review_from)
            .collect(),
        settlement: read_records::<SettlementRecord>(dir, "settlement.json")
            .await
            .into_iter()
            .filter_map(settlement_from)
            .collect(),
        manuals: read_records::<ManualRecord>(dir, "cs_manuals.json")
            .await
            .into_iter()
            .map(|m| CsManual {
                manual_id: m.manual_id,
                domain: m.domain,
                urgency: m.urgency,
                content: m.content_for_rag,
            })
            .collect(),
    }
}

async fn read_records<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Vec<T> {
    let path = dir.join(file_name);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Seed file {} unavailable: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Seed file {} is malformed: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn customer_from(r: CustomerRecord) -> Customer {
    Customer {
        customer_id: r.customer_id,
        name: r.name,
        segment: r.segment,
        total_spend: r.total_spend,
        total_orders: r.total_orders,
        last_order_date: r.last_order_date.as_deref().and_then(parse_date),
        main_category: r.main_category,
        avg_rating: r.avg_rating,
        total_claims: r.total_claims,
    }
}

fn product_from(r: ProductRecord) -> Product {
    Product {
        product_no: r.origin_product_no,
        product_name: r.product_name,
        category_name: r.category.category_name,
        sale_price: r.price.sale_price,
        cost_price: r.price.cost_price,
        stock_quantity: r.stock_quantity,
        status: r.status,
    }
}

fn order_from(r: OrderRecord) -> Order {
    let (claim_type, claim_reason) = r
        .claim_data
        .map(|c| (c.claim_type, c.reason))
        .unwrap_or_default();

    Order {
        product_order_id: r.product_order_id,
        order_id: r.order_id,
        product_no: r.product_info.origin_product_no,
        product_name: r.product_info.product_name,
        quantity: r.product_info.quantity,
        total_amount: r.product_info.total_amount,
        customer_id: r.orderer.id,
        order_status: r.order_status,
        payment_date: r.payment_date.as_deref().and_then(parse_timestamp),
        delivery_complete_date: r.delivery_complete_date.as_deref().and_then(parse_timestamp),
        claim_type,
        claim_reason,
    }
}

fn qna_from(r: QnaRecord) -> Qna {
    Qna {
        question_id: r.question_id,
        product_no: r.origin_product_no,
        customer_id: r.customer_id,
        question_type: r.question_type,
        question_text: r.question_text,
        is_answered: r.is_answered,
        answer_text: r.answer.and_then(|a| a.answer_text),
    }
}

fn review_from(r: ReviewRecord) -> Option<Review> {
    let Some(created_at) = parse_timestamp(&r.created_at) else {
        tracing::warn!("Review {} skipped: bad created_at '{}'", r.review_id, r.created_at);
        return None;
    };
    Some(Review {
        review_id: r.review_id,
        customer_id: r.customer_id,
        product_id: r.product_id,
        rating: r.rating,
        review_text: r.review_text,
        image_url: r.image_url.filter(|u| !u.trim().is_empty()),
        created_at,
    })
}

fn settlement_from(r: SettlementRecord) -> Option<SettlementDay> {
    let Some(settle_date) = parse_date(&r.settle_date) else {
        tracing::warn!("Settlement row skipped: bad settleDate '{}'", r.settle_date);
        return None;
    };
    Some(SettlementDay {
        settle_date,
        total_payment_amount: r.total_payment_amount,
        total_commission: r.total_commission,
        total_settlement_amount: r.total_settlement_amount,
    })
}

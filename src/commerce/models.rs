use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    pub segment: String,
    pub total_spend: i64,
    pub total_orders: i64,
    pub last_order_date: Option<NaiveDate>,
    pub main_category: Option<String>,
    /// Two-decimal average; persisted as integer hundredths.
    pub avg_rating: Option<f64>,
    pub total_claims: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_no: i64,
    pub product_name: String,
    pub category_name: String,
    pub sale_price: i64,
    pub cost_price: i64,
    pub stock_quantity: i64,
    pub status: String,
}

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub product_order_id: String,
    pub order_id: String,
    pub product_no: i64,
    pub product_name: String,
    pub quantity: i64,
    pub total_amount: i64,
    pub customer_id: String,
    pub order_status: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub delivery_complete_date: Option<DateTime<Utc>>,
    pub claim_type: Option<String>,
    pub claim_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qna {
    pub question_id: String,
    pub product_no: Option<i64>,
    pub customer_id: String,
    pub question_type: String,
    pub question_text: String,
    pub is_answered: bool,
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub customer_id: String,
    pub product_id: i64,
    pub rating: i64,
    pub review_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDay {
    pub settle_date: NaiveDate,
    pub total_payment_amount: i64,
    pub total_commission: i64,
    pub total_settlement_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsManual {
    pub manual_id: String,
    pub domain: String,
    pub urgency: String,
    pub content: String,
}

/// Full contents of the relational tables, as loaded by the seeder.
#[derive(Debug, Clone, Default)]
pub struct CommerceSnapshot {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub qnas: Vec<Qna>,
    pub reviews: Vec<Review>,
    pub settlement: Vec<SettlementDay>,
    pub manuals: Vec<CsManual>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginReport {
    pub product_no: i64,
    pub product_name: String,
    pub total_sales: i64,
    pub total_cost: i64,
    pub margin: i64,
    pub margin_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminKpis {
    pub unanswered_qnas: i64,
    pub pending_claims: i64,
    pub low_stock_products: i64,
    pub latest_settlement_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub amount: i64,
}

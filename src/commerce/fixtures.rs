//! Sample store data shared by tests across modules.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;

use super::models::{
    CommerceSnapshot, CsManual, Customer, Order, Product, Qna, Review, SettlementDay,
};
use super::CommerceStore;
use crate::core::db;

pub fn temp_db_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cs-agent-{}-{}.db", label, uuid::Uuid::new_v4()))
}

pub async fn temp_pool(label: &str) -> SqlitePool {
    db::connect(&temp_db_path(label)).await.unwrap()
}

pub async fn seeded_store() -> CommerceStore {
    let store = CommerceStore::with_pool(temp_pool("commerce").await)
        .await
        .unwrap();
    store.replace_all(&sample_snapshot()).await.unwrap();
    store
}

pub fn product(no: i64, name: &str, sale_price: i64, cost_price: i64, stock: i64) -> Product {
    Product {
        product_no: no,
        product_name: name.to_string(),
        category_name: "한식/탕류".to_string(),
        sale_price,
        cost_price,
        stock_quantity: stock,
        status: "SALE".to_string(),
    }
}

pub fn order(
    product_order_id: &str,
    order_id: &str,
    customer_id: &str,
    product: &Product,
    quantity: i64,
    days_ago: i64,
    status: &str,
) -> Order {
    let paid = Utc::now() - Duration::days(days_ago);
    Order {
        product_order_id: product_order_id.to_string(),
        order_id: order_id.to_string(),
        product_no: product.product_no,
        product_name: product.product_name.clone(),
        quantity,
        total_amount: product.sale_price * quantity,
        customer_id: customer_id.to_string(),
        order_status: status.to_string(),
        payment_date: Some(paid),
        delivery_complete_date: (status == "DELIVERED").then(|| paid + Duration::days(1)),
        claim_type: None,
        claim_reason: None,
    }
}

pub fn review(id: &str, product_id: i64, rating: i64, text: &str, hours_ago: i64) -> Review {
    Review {
        review_id: id.to_string(),
        customer_id: "C2".to_string(),
        product_id,
        rating,
        review_text: text.to_string(),
        image_url: None,
        created_at: Utc::now() - Duration::hours(hours_ago),
    }
}

pub fn sample_snapshot() -> CommerceSnapshot {
    let galbitang = product(1000001, "순살 왕갈비탕 밀키트 650g", 15_900, 9_000, 120);
    let set = product(1000004, "왕갈비탕 2팩 세트", 29_000, 20_000, 30);
    let kimchi = product(1000016, "수제 김치 1kg", 20_000, 8_000, 80);

    let mut returned = order("PO-3", "O3", "C2", &kimchi, 1, 1, "PAYED");
    returned.claim_type = Some("RETURN".to_string());
    returned.claim_reason = Some("PRODUCT_UNSATISFIED".to_string());

    CommerceSnapshot {
        customers: vec![
            Customer {
                customer_id: "C1".to_string(),
                name: "김민지".to_string(),
                segment: "VIP".to_string(),
                total_spend: 1_250_000,
                total_orders: 42,
                last_order_date: NaiveDate::from_ymd_opt(2024, 5, 20),
                main_category: Some("한식/탕류".to_string()),
                avg_rating: Some(4.75),
                total_claims: 0,
            },
            Customer {
                customer_id: "C2".to_string(),
                name: "이준호".to_string(),
                segment: "신규".to_string(),
                total_spend: 49_000,
                total_orders: 2,
                last_order_date: None,
                main_category: None,
                avg_rating: None,
                total_claims: 1,
            },
        ],
        orders: vec![
            order("PO-1", "O1", "C1", &galbitang, 2, 2, "DELIVERED"),
            order("PO-2", "O2", "C2", &set, 1, 30, "DELIVERED"),
            returned,
        ],
        products: vec![galbitang, set, kimchi],
        qnas: vec![
            Qna {
                question_id: "QNA-2002".to_string(),
                product_no: Some(1000004),
                customer_id: "C2".to_string(),
                question_type: "배송".to_string(),
                question_text: "어제 주문했는데 오늘 출발 안했네요.".to_string(),
                is_answered: true,
                answer_text: Some("고객님, 저희 오늘출발 마감은 오후 2시입니다.".to_string()),
            },
            Qna {
                question_id: "QNA-2003".to_string(),
                product_no: Some(1000001),
                customer_id: "C1".to_string(),
                question_type: "상품".to_string(),
                question_text: "냉동 보관 기간이 얼마나 되나요?".to_string(),
                is_answered: false,
                answer_text: None,
            },
        ],
        reviews: vec![
            review("REV-1001", 1000001, 5, "국물이 진하고 고기가 많아요.", 48),
            review("REV-1002", 1000016, 1, "뚜껑 여니까 시큼한 냄새가 나고 곰팡이가 피어있습니다.", 3),
            review("REV-1003", 1000016, 2, "배송이 너무 늦어서 김치가 다 쉬었어요.", 5),
            review("REV-1004", 1000016, 1, "포장이 터져서 왔습니다.", 10),
        ],
        settlement: (1..=9)
            .map(|day| SettlementDay {
                settle_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                total_payment_amount: 1_000_000 + day as i64,
                total_commission: 50_000,
                total_settlement_amount: 950_000 + day as i64,
            })
            .collect(),
        manuals: vec![CsManual {
            manual_id: "CS-DEL-002".to_string(),
            domain: "배송".to_string(),
            urgency: "medium".to_string(),
            content: "배송 지연 4일 이상 시, 고객에게 지연 상황을 사과하고 보상 쿠폰을 즉시 발급한다."
                .to_string(),
        }],
    }
}

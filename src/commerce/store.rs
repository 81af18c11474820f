use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{
    AdminKpis, CommerceSnapshot, CsManual, Customer, MarginReport, Order, Product, Qna, Review,
    SalesPoint, SettlementDay,
};
use super::serialize::{
    format_date, format_timestamp, from_hundredths, parse_date, parse_timestamp, round2,
    to_hundredths,
};
use crate::core::db;
use crate::core::errors::ApiError;

/// Order statuses after which a claim no longer needs attention.
const RESOLVED_CLAIM_STATUSES: [&str; 3] = ["CANCELED", "RETURNED", "EXCHANGED"];

const SCHEMA: [&str; 7] = [
    "CREATE TABLE IF NOT EXISTS customers (
        customer_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        segment TEXT NOT NULL,
        total_spend INTEGER NOT NULL DEFAULT 0,
        total_orders INTEGER NOT NULL DEFAULT 0,
        last_order_date TEXT,
        main_category TEXT,
        avg_rating_hundredths INTEGER,
        total_claims INTEGER NOT NULL DEFAULT 0
    )",
    // `seq` keeps insertion order independent of the product number.
    "CREATE TABLE IF NOT EXISTS products (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        origin_product_no INTEGER NOT NULL UNIQUE,
        product_name TEXT NOT NULL,
        category_name TEXT NOT NULL,
        sale_price INTEGER NOT NULL,
        cost_price INTEGER NOT NULL,
        stock_quantity INTEGER NOT NULL,
        status TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        product_order_id TEXT PRIMARY KEY,
        order_id TEXT NOT NULL,
        origin_product_no INTEGER NOT NULL,
        product_name TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        total_amount INTEGER NOT NULL,
        customer_id TEXT NOT NULL,
        order_status TEXT NOT NULL,
        payment_date TEXT,
        delivery_complete_date TEXT,
        claim_type TEXT,
        claim_reason TEXT
    )",
    "CREATE TABLE IF NOT EXISTS qnas (
        question_id TEXT PRIMARY KEY,
        origin_product_no INTEGER,
        customer_id TEXT NOT NULL,
        question_type TEXT NOT NULL,
        question_text TEXT NOT NULL,
        is_answered INTEGER NOT NULL DEFAULT 0,
        answer_text TEXT
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        review_id TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL,
        product_id INTEGER NOT NULL,
        rating INTEGER NOT NULL,
        review_text TEXT NOT NULL,
        image_url TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS settlement (
        settle_date TEXT PRIMARY KEY,
        total_payment_amount INTEGER NOT NULL,
        total_commission INTEGER NOT NULL,
        total_settlement_amount INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cs_manuals (
        manual_id TEXT PRIMARY KEY,
        domain TEXT NOT NULL,
        urgency TEXT NOT NULL,
        content TEXT NOT NULL
    )",
];

const INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_orders_customer_id ON orders(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_payment_date ON orders(payment_date)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_product_id ON reviews(product_id)",
];

/// Read access to the store-platform tables, plus the bulk replace used by seeding.
#[derive(Clone)]
pub struct CommerceStore {
    pool: SqlitePool,
}

impl CommerceStore {
    pub async fn open(db_path: &Path) -> Result<Self, ApiError> {
        let pool = db::connect(db_path).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, ApiError> {
        for statement in SCHEMA.iter().chain(INDEXES.iter()) {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to init commerce schema: {}", e)))?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Replaces the contents of every commerce table in one transaction.
    pub async fn replace_all(&self, snapshot: &CommerceSnapshot) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for table in [
            "customers",
            "products",
            "orders",
            "qnas",
            "reviews",
            "settlement",
            "cs_manuals",
        ] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .map_err(ApiError::internal)?;
        }

        for c in &snapshot.customers {
            sqlx::query(
                "INSERT OR REPLACE INTO customers (customer_id, name, segment, total_spend, total_orders,
                    last_order_date, main_category, avg_rating_hundredths, total_claims)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&c.customer_id)
            .bind(&c.name)
            .bind(&c.segment)
            .bind(c.total_spend)
            .bind(c.total_orders)
            .bind(c.last_order_date.map(format_date))
            .bind(&c.main_category)
            .bind(c.avg_rating.map(to_hundredths))
            .bind(c.total_claims)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for p in &snapshot.products {
            sqlx::query(
                "INSERT OR REPLACE INTO products (origin_product_no, product_name, category_name,
                    sale_price, cost_price, stock_quantity, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(p.product_no)
            .bind(&p.product_name)
            .bind(&p.category_name)
            .bind(p.sale_price)
            .bind(p.cost_price)
            .bind(p.stock_quantity)
            .bind(&p.status)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for o in &snapshot.orders {
            sqlx::query(
                "INSERT OR REPLACE INTO orders (product_order_id, order_id, origin_product_no, product_name,
                    quantity, total_amount, customer_id, order_status, payment_date,
                    delivery_complete_date, claim_type, claim_reason)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&o.product_order_id)
            .bind(&o.order_id)
            .bind(o.product_no)
            .bind(&o.product_name)
            .bind(o.quantity)
            .bind(o.total_amount)
            .bind(&o.customer_id)
            .bind(&o.order_status)
            .bind(o.payment_date.map(format_timestamp))
            .bind(o.delivery_complete_date.map(format_timestamp))
            .bind(&o.claim_type)
            .bind(&o.claim_reason)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for q in &snapshot.qnas {
            sqlx::query(
                "INSERT OR REPLACE INTO qnas (question_id, origin_product_no, customer_id, question_type,
                    question_text, is_answered, answer_text)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&q.question_id)
            .bind(q.product_no)
            .bind(&q.customer_id)
            .bind(&q.question_type)
            .bind(&q.question_text)
            .bind(q.is_answered)
            .bind(&q.answer_text)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for r in &snapshot.reviews {
            sqlx::query(
                "INSERT OR REPLACE INTO reviews (review_id, customer_id, product_id, rating, review_text,
                    image_url, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&r.review_id)
            .bind(&r.customer_id)
            .bind(r.product_id)
            .bind(r.rating)
            .bind(&r.review_text)
            .bind(&r.image_url)
            .bind(format_timestamp(r.created_at))
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for s in &snapshot.settlement {
            sqlx::query(
                "INSERT OR REPLACE INTO settlement (settle_date, total_payment_amount, total_commission,
                    total_settlement_amount)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(format_date(s.settle_date))
            .bind(s.total_payment_amount)
            .bind(s.total_commission)
            .bind(s.total_settlement_amount)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        for m in &snapshot.manuals {
            sqlx::query(
                "INSERT OR REPLACE INTO cs_manuals (manual_id, domain, urgency, content) VALUES (?, ?, ?, ?)",
            )
            .bind(&m.manual_id)
            .bind(&m.domain)
            .bind(&m.urgency)
            .bind(&m.content)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, ApiError> {
        let row = sqlx::query("SELECT * FROM customers WHERE customer_id = ?")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    pub async fn customers_by_segment(&self, segment: &str) -> Result<Vec<Customer>, ApiError> {
        let rows = sqlx::query("SELECT * FROM customers WHERE segment = ? ORDER BY total_spend DESC")
            .bind(segment)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().map(row_to_customer).collect())
    }

    /// Order lines matching every filter given. Callers must supply at least one.
    pub async fn find_orders(
        &self,
        customer_id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<Vec<Order>, ApiError> {
        if customer_id.is_none() && order_id.is_none() {
            return Err(ApiError::BadRequest(
                "customer_id or order_id is required".to_string(),
            ));
        }

        let rows = sqlx::query(
            "SELECT * FROM orders
             WHERE (?1 IS NULL OR customer_id = ?1)
               AND (?2 IS NULL OR order_id = ?2)
             ORDER BY payment_date DESC, product_order_id",
        )
        .bind(customer_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_order).collect())
    }

    /// Exact product number wins; otherwise the first product (insertion order)
    /// whose name contains `product_name`.
    pub async fn find_product(
        &self,
        product_no: Option<i64>,
        product_name: Option<&str>,
    ) -> Result<Option<Product>, ApiError> {
        let fetched = if let Some(product_no) = product_no {
            sqlx::query("SELECT * FROM products WHERE origin_product_no = ?")
                .bind(product_no)
                .fetch_optional(&self.pool)
                .await
        } else if let Some(name) = product_name.map(str::trim).filter(|n| !n.is_empty()) {
            sqlx::query("SELECT * FROM products WHERE instr(product_name, ?) > 0 ORDER BY seq LIMIT 1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
        } else {
            return Ok(None);
        };

        let row = fetched.map_err(ApiError::internal)?;
        Ok(row.as_ref().map(row_to_product))
    }

    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    pub async fn low_stock_products(&self, threshold: i64) -> Result<Vec<Product>, ApiError> {
        let rows = sqlx::query("SELECT * FROM products WHERE stock_quantity < ? ORDER BY stock_quantity, seq")
            .bind(threshold)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    pub async fn qnas_for_product(&self, product_no: i64) -> Result<Vec<Qna>, ApiError> {
        let rows = sqlx::query("SELECT * FROM qnas WHERE origin_product_no = ? ORDER BY rowid")
            .bind(product_no)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().map(row_to_qna).collect())
    }

    pub async fn qnas(&self) -> Result<Vec<Qna>, ApiError> {
        let rows = sqlx::query("SELECT * FROM qnas ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().map(row_to_qna).collect())
    }

    pub async fn reviews_for_product(&self, product_no: i64) -> Result<Vec<Review>, ApiError> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE product_id = ? ORDER BY created_at DESC")
            .bind(product_no)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().filter_map(row_to_review).collect())
    }

    pub async fn reviews(&self) -> Result<Vec<Review>, ApiError> {
        let rows = sqlx::query("SELECT * FROM reviews ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().filter_map(row_to_review).collect())
    }

    /// Reviews rated at or below `max_rating`, newest first. `since` bounds the
    /// creation time when given.
    pub async fn negative_reviews(
        &self,
        max_rating: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Review>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM reviews
             WHERE rating <= ?1 AND (?2 IS NULL OR created_at >= ?2)
             ORDER BY created_at DESC, review_id",
        )
        .bind(max_rating)
        .bind(since.map(format_timestamp))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;
        Ok(rows.iter().filter_map(row_to_review).collect())
    }

    pub async fn manuals(&self) -> Result<Vec<CsManual>, ApiError> {
        let rows = sqlx::query("SELECT * FROM cs_manuals ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows
            .iter()
            .map(|row| CsManual {
                manual_id: row.get("manual_id"),
                domain: row.get("domain"),
                urgency: row.get("urgency"),
                content: row.get("content"),
            })
            .collect())
    }

    /// Per-product margin over orders paid at or after `since`.
    pub async fn top_margin_products(
        &self,
        limit: usize,
        since: DateTime<Utc>,
    ) -> Result<Vec<MarginReport>, ApiError> {
        let rows = sqlx::query(
            "SELECT o.origin_product_no AS product_no,
                    COALESCE(p.product_name, MAX(o.product_name)) AS product_name,
                    SUM(o.total_amount) AS total_sales,
                    SUM(o.quantity * COALESCE(p.cost_price, 0)) AS total_cost
             FROM orders o
             LEFT JOIN products p ON p.origin_product_no = o.origin_product_no
             WHERE o.payment_date IS NOT NULL AND o.payment_date >= ?
             GROUP BY o.origin_product_no",
        )
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let totals = rows
            .iter()
            .map(|row| ProductTotals {
                product_no: row.get("product_no"),
                product_name: row.get("product_name"),
                total_sales: row.try_get("total_sales").unwrap_or(0),
                total_cost: row.try_get("total_cost").unwrap_or(0),
            })
            .collect();

        Ok(rank_by_margin(totals, limit))
    }

    pub async fn kpis(&self, low_stock_threshold: i64) -> Result<AdminKpis, ApiError> {
        let unanswered_qnas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qnas WHERE is_answered = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let pending_claims: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders
             WHERE claim_type IS NOT NULL AND claim_type <> ''
               AND order_status NOT IN (?, ?, ?)",
        )
        .bind(RESOLVED_CLAIM_STATUSES[0])
        .bind(RESOLVED_CLAIM_STATUSES[1])
        .bind(RESOLVED_CLAIM_STATUSES[2])
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let low_stock_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock_quantity < ?")
                .bind(low_stock_threshold)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        let latest_settlement_amount: Option<i64> = sqlx::query_scalar(
            "SELECT total_settlement_amount FROM settlement ORDER BY settle_date DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(AdminKpis {
            unanswered_qnas,
            pending_claims,
            low_stock_products,
            latest_settlement_amount: latest_settlement_amount.unwrap_or(0),
        })
    }

    pub async fn settlement_days(&self) -> Result<Vec<SettlementDay>, ApiError> {
        let rows = sqlx::query("SELECT * FROM settlement ORDER BY settle_date")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(rows.iter().filter_map(row_to_settlement).collect())
    }

    /// The most recent `days` settlement days, oldest first.
    pub async fn sales_trend(&self, days: usize) -> Result<Vec<SalesPoint>, ApiError> {
        let settled = self.settlement_days().await?;
        let skip = settled.len().saturating_sub(days);
        Ok(settled
            .into_iter()
            .skip(skip)
            .map(|day| SalesPoint {
                date: day.settle_date,
                amount: day.total_settlement_amount,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProductTotals {
    pub product_no: i64,
    pub product_name: String,
    pub total_sales: i64,
    pub total_cost: i64,
}

/// Non-increasing margin order; ties keep the lower product number first.
pub(crate) fn rank_by_margin(totals: Vec<ProductTotals>, limit: usize) -> Vec<MarginReport> {
    let mut reports: Vec<MarginReport> = totals
        .into_iter()
        .map(|t| {
            let margin = t.total_sales - t.total_cost;
            let margin_percentage = if t.total_sales == 0 {
                0.0
            } else {
                round2(margin as f64 / t.total_sales as f64 * 100.0)
            };
            MarginReport {
                product_no: t.product_no,
                product_name: t.product_name,
                total_sales: t.total_sales,
                total_cost: t.total_cost,
                margin,
                margin_percentage,
            }
        })
        .collect();

    reports.sort_by(|a, b| b.margin.cmp(&a.margin).then(a.product_no.cmp(&b.product_no)));
    reports.truncate(limit);
    reports
}

fn row_to_customer(row: &SqliteRow) -> Customer {
    Customer {
        customer_id: row.get("customer_id"),
        name: row.get("name"),
        segment: row.get("segment"),
        total_spend: row.get("total_spend"),
        total_orders: row.get("total_orders"),
        last_order_date: row
            .get::<Option<String>, _>("last_order_date")
            .as_deref()
            .and_then(parse_date),
        main_category: row.get("main_category"),
        avg_rating: row
            .get::<Option<i64>, _>("avg_rating_hundredths")
            .map(from_hundredths),
        total_claims: row.get("total_claims"),
    }
}

fn row_to_product(row: &SqliteRow) -> Product {
    Product {
        product_no: row.get("origin_product_no"),
        product_name: row.get("product_name"),
        category_name: row.get("category_name"),
        sale_price: row.get("sale_price"),
        cost_price: row.get("cost_price"),
        stock_quantity: row.get("stock_quantity"),
        status: row.get("status"),
    }
}

fn row_to_order(row: &SqliteRow) -> Order {
    Order {
        product_order_id: row.get("product_order_id"),
        order_id: row.get("order_id"),
        product_no: row.get("origin_product_no"),
        product_name: row.get("product_name"),
        quantity: row.get("quantity"),
        total_amount: row.get("total_amount"),
        customer_id: row.get("customer_id"),
        order_status: row.get("order_status"),
        payment_date: row
            .get::<Option<String>, _>("payment_date")
            .as_deref()
            .and_then(parse_timestamp),
        delivery_complete_date: row
            .get::<Option<String>, _>("delivery_complete_date")
            .as_deref()
            .and_then(parse_timestamp),
        claim_type: row.get("claim_type"),
        claim_reason: row.get("claim_reason"),
    }
}

fn row_to_qna(row: &SqliteRow) -> Qna {
    Qna {
        question_id: row.get("question_id"),
        product_no: row.get("origin_product_no"),
        customer_id: row.get("customer_id"),
        question_type: row.get("question_type"),
        question_text: row.get("question_text"),
        is_answered: row.get("is_answered"),
        answer_text: row.get("answer_text"),
    }
}

fn row_to_review(row: &SqliteRow) -> Option<Review> {
    let raw_created: String = row.get("created_at");
    let Some(created_at) = parse_timestamp(&raw_created) else {
        tracing::warn!("Skipping review with unreadable created_at '{}'", raw_created);
        return None;
    };
    Some(Review {
        review_id: row.get("review_id"),
        customer_id: row.get("customer_id"),
        product_id: row.get("product_id"),
        rating: row.get("rating"),
        review_text: row.get("review_text"),
        image_url: row.get("image_url"),
        created_at,
    })
}

fn row_to_settlement(row: &SqliteRow) -> Option<SettlementDay> {
    let raw_date: String = row.get("settle_date");
    let settle_date = parse_date(&raw_date)?;
    Some(SettlementDay {
        settle_date,
        total_payment_amount: row.get("total_payment_amount"),
        total_commission: row.get("total_commission"),
        total_settlement_amount: row.get("total_settlement_amount"),
    })
}

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use super::models::{Product, Review};

/// Operator-facing alerts shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    LowStock {
        product_no: i64,
        product_name: String,
        stock_quantity: i64,
    },
    ClaimSurge {
        product_no: i64,
        product_name: String,
        count: usize,
        window_hours: i64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LowStock {
                product_no,
                product_name,
                stock_quantity,
            } => write!(
                f,
                "[재고 경고] '{}' (상품번호: {}) 재고 {}개 남음.",
                product_name, product_no, stock_quantity
            ),
            Warning::ClaimSurge {
                product_name,
                count,
                window_hours,
                ..
            } => write!(
                f,
                "[클레임 급증] '{}' 상품, {}시간 내 부정 리뷰 {}건 발생.",
                product_name, window_hours, count
            ),
        }
    }
}

pub struct WarningRules {
    pub surge_threshold: usize,
    pub window_hours: i64,
}

/// Builds low-stock warnings for every product in `low_stock`, then a claim-surge
/// warning for each product with at least `surge_threshold` entries in
/// `recent_negative` (already filtered to the window and rating).
pub fn compute_warnings(
    low_stock: &[Product],
    recent_negative: &[Review],
    catalog: &[Product],
    rules: &WarningRules,
) -> Vec<Warning> {
    let mut warnings: Vec<Warning> = low_stock
        .iter()
        .map(|p| Warning::LowStock {
            product_no: p.product_no,
            product_name: p.product_name.clone(),
            stock_quantity: p.stock_quantity,
        })
        .collect();

    let mut per_product: BTreeMap<i64, usize> = BTreeMap::new();
    for review in recent_negative {
        *per_product.entry(review.product_id).or_insert(0) += 1;
    }

    let names: HashMap<i64, &str> = catalog
        .iter()
        .map(|p| (p.product_no, p.product_name.as_str()))
        .collect();

    for (product_no, count) in per_product {
        if count < rules.surge_threshold {
            continue;
        }
        let product_name = names
            .get(&product_no)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("상품번호 {}", product_no));
        warnings.push(Warning::ClaimSurge {
            product_no,
            product_name,
            count,
            window_hours: rules.window_hours,
        });
    }

    warnings
}

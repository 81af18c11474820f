//! Typed arguments for every model-callable tool. The JSON schema sent to the
//! model and the one used to validate its arguments are both generated from
//! these structs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerInfoArgs {
    /// 조회할 고객 ID (예: "C1")
    pub customer_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderDetailsArgs {
    /// 주문자 고객 ID
    #[serde(default)]
    pub customer_id: Option<String>,
    /// 주문 번호
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductLookupArgs {
    /// 정확한 상품 번호
    #[serde(default)]
    pub product_no: Option<i64>,
    /// 상품명 일부
    #[serde(default)]
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TopMarginArgs {
    /// 반환할 상품 수
    #[serde(default = "default_margin_limit")]
    #[schemars(range(min = 1, max = 50))]
    pub limit: u32,
    /// 집계 기간 (일)
    #[serde(default = "default_period_days")]
    #[schemars(range(min = 1, max = 365))]
    pub period_days: u32,
}

impl Default for TopMarginArgs {
    fn default() -> Self {
        Self {
            limit: default_margin_limit(),
            period_days: default_period_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NegativeReviewArgs {
    /// 최근 며칠간의 리뷰를 볼지
    #[serde(default = "default_period_days")]
    #[schemars(range(min = 1, max = 365))]
    pub days: u32,
}

impl Default for NegativeReviewArgs {
    fn default() -> Self {
        Self {
            days: default_period_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewReplyArgs {
    /// 고객이 남긴 리뷰 원문
    pub review_text: String,
    /// 리뷰 대상 상품명
    pub product_name: String,
}

fn default_margin_limit() -> u32 {
    3
}

fn default_period_days() -> u32 {
    7
}

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::args::{
    CustomerInfoArgs, NegativeReviewArgs, OrderDetailsArgs, ProductLookupArgs, ReviewReplyArgs,
    TopMarginArgs,
};
use super::output::{ToolErrorCode, ToolOutput};
use super::schema::{parameters_schema, validate};
use crate::llm::ToolSpec;

/// The closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetCustomerInfo,
    GetOrderDetails,
    GetProductInfo,
    GetQnaByProduct,
    GetReviewsByProduct,
    GetTopMarginProducts,
    SummarizeRecentNegativeReviews,
    GenerateReviewReply,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        ToolName::GetCustomerInfo,
        ToolName::GetOrderDetails,
        ToolName::GetProductInfo,
        ToolName::GetQnaByProduct,
        ToolName::GetReviewsByProduct,
        ToolName::GetTopMarginProducts,
        ToolName::SummarizeRecentNegativeReviews,
        ToolName::GenerateReviewReply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetCustomerInfo => "get_customer_info",
            ToolName::GetOrderDetails => "get_order_details",
            ToolName::GetProductInfo => "get_product_info",
            ToolName::GetQnaByProduct => "get_qna_by_product",
            ToolName::GetReviewsByProduct => "get_reviews_by_product",
            ToolName::GetTopMarginProducts => "get_top_margin_products",
            ToolName::SummarizeRecentNegativeReviews => "summarize_recent_negative_reviews",
            ToolName::GenerateReviewReply => "generate_review_reply",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::GetCustomerInfo => {
                "고객 ID로 고객 등급, 누적 구매액, 주문 수, 클레임 이력 등 고객 정보를 조회합니다."
            }
            ToolName::GetOrderDetails => {
                "고객 ID 또는 주문 번호로 주문 상태, 결제일, 배송 완료일, 클레임 정보를 조회합니다. 둘 중 하나는 반드시 필요합니다."
            }
            ToolName::GetProductInfo => {
                "상품 번호 또는 상품명 일부로 가격, 재고, 판매 상태 등 상품 정보를 조회합니다."
            }
            ToolName::GetQnaByProduct => {
                "상품 번호 또는 상품명 일부로 해당 상품의 Q&A 목록을 조회합니다."
            }
            ToolName::GetReviewsByProduct => {
                "상품 번호 또는 상품명 일부로 해당 상품의 리뷰 목록을 조회합니다."
            }
            ToolName::GetTopMarginProducts => {
                "최근 기간 동안 판매 마진이 가장 높은 상품 순위를 조회합니다."
            }
            ToolName::SummarizeRecentNegativeReviews => {
                "최근 부정 리뷰(평점 2점 이하)의 패턴과 주요 불만, 즉시 조치 사항을 요약합니다."
            }
            ToolName::GenerateReviewReply => {
                "고객 리뷰에 대한 공손하고 전문적인 답변 초안을 생성합니다."
            }
        }
    }

    pub fn parameters(self) -> Value {
        match self {
            ToolName::GetCustomerInfo => parameters_schema::<CustomerInfoArgs>(),
            ToolName::GetOrderDetails => parameters_schema::<OrderDetailsArgs>(),
            ToolName::GetProductInfo | ToolName::GetQnaByProduct | ToolName::GetReviewsByProduct => {
                parameters_schema::<ProductLookupArgs>()
            }
            ToolName::GetTopMarginProducts => parameters_schema::<TopMarginArgs>(),
            ToolName::SummarizeRecentNegativeReviews => parameters_schema::<NegativeReviewArgs>(),
            ToolName::GenerateReviewReply => parameters_schema::<ReviewReplyArgs>(),
        }
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec::function(self.as_str(), self.description(), self.parameters())
    }
}

/// A validated, typed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    CustomerInfo(CustomerInfoArgs),
    OrderDetails(OrderDetailsArgs),
    ProductInfo(ProductLookupArgs),
    QnaByProduct(ProductLookupArgs),
    ReviewsByProduct(ProductLookupArgs),
    TopMarginProducts(TopMarginArgs),
    SummarizeNegativeReviews(NegativeReviewArgs),
    ReviewReply(ReviewReplyArgs),
}

impl ToolInvocation {
    /// Resolves the tool and checks `raw_arguments` against its schema. Failures
    /// come back as the structured error the model will see.
    pub fn parse(name: &str, raw_arguments: &str) -> Result<Self, ToolOutput> {
        let tool = ToolName::parse(name).ok_or_else(|| {
            ToolOutput::error(ToolErrorCode::UnknownTool, format!("정의되지 않은 도구입니다: {}", name))
        })?;

        let arguments = parse_arguments(raw_arguments)?;
        if let Err(errors) = validate(&tool.parameters(), &arguments) {
            return Err(ToolOutput::error(
                ToolErrorCode::InvalidArguments,
                format!("{} 인자가 올바르지 않습니다: {}", name, errors.join("; ")),
            ));
        }

        Ok(match tool {
            ToolName::GetCustomerInfo => ToolInvocation::CustomerInfo(typed(arguments)?),
            ToolName::GetOrderDetails => ToolInvocation::OrderDetails(typed(arguments)?),
            ToolName::GetProductInfo => ToolInvocation::ProductInfo(typed(arguments)?),
            ToolName::GetQnaByProduct => ToolInvocation::QnaByProduct(typed(arguments)?),
            ToolName::GetReviewsByProduct => ToolInvocation::ReviewsByProduct(typed(arguments)?),
            ToolName::GetTopMarginProducts => ToolInvocation::TopMarginProducts(typed(arguments)?),
            ToolName::SummarizeRecentNegativeReviews => {
                ToolInvocation::SummarizeNegativeReviews(typed(arguments)?)
            }
            ToolName::GenerateReviewReply => ToolInvocation::ReviewReply(typed(arguments)?),
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            ToolInvocation::CustomerInfo(_) => ToolName::GetCustomerInfo,
            ToolInvocation::OrderDetails(_) => ToolName::GetOrderDetails,
            ToolInvocation::ProductInfo(_) => ToolName::GetProductInfo,
            ToolInvocation::QnaByProduct(_) => ToolName::GetQnaByProduct,
            ToolInvocation::ReviewsByProduct(_) => ToolName::GetReviewsByProduct,
            ToolInvocation::TopMarginProducts(_) => ToolName::GetTopMarginProducts,
            ToolInvocation::SummarizeNegativeReviews(_) => ToolName::SummarizeRecentNegativeReviews,
            ToolInvocation::ReviewReply(_) => ToolName::GenerateReviewReply,
        }
    }
}

/// Models sometimes send an empty string for a call without arguments.
fn parse_arguments(raw: &str) -> Result<Value, ToolOutput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(trimmed).map_err(|e| {
        ToolOutput::error(
            ToolErrorCode::InvalidArguments,
            format!("도구 인자가 올바른 JSON이 아닙니다: {}", e),
        )
    })
}

fn typed<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolOutput::error(ToolErrorCode::InvalidArguments, e.to_string()))
}

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use super::args::{OrderDetailsArgs, ProductLookupArgs, ReviewReplyArgs};
use super::catalog::{ToolInvocation, ToolName};
use super::output::{ToolErrorCode, ToolOutput};
use super::reviews;
use crate::commerce::serialize::to_json_value;
use crate::commerce::{CommerceStore, Product};
use crate::core::errors::ApiError;
use crate::llm::{LlmProvider, ModelCatalog, ToolSpec};

/// Executes tool calls against the commerce store and the model.
///
/// `dispatch` never fails: lookup misses, bad arguments and backend errors all
/// come back as structured values the model can read.
#[derive(Clone)]
pub struct ToolRegistry {
    commerce: CommerceStore,
    llm: Arc<dyn LlmProvider>,
    models: ModelCatalog,
    negative_rating_threshold: i64,
}

impl ToolRegistry {
    pub fn new(
        commerce: CommerceStore,
        llm: Arc<dyn LlmProvider>,
        models: ModelCatalog,
        negative_rating_threshold: i64,
    ) -> Self {
        Self {
            commerce,
            llm,
            models,
            negative_rating_threshold,
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        ToolName::ALL.into_iter().map(ToolName::spec).collect()
    }

    pub async fn dispatch(&self, name: &str, raw_arguments: &str) -> Value {
        let output = match ToolInvocation::parse(name, raw_arguments) {
            Ok(invocation) => self.execute(invocation).await,
            Err(rejected) => rejected,
        };

        if let ToolOutput::Error { code, message } = &output {
            tracing::warn!("Tool {} returned {}: {}", name, code.as_str(), message);
        } else {
            tracing::debug!("Tool {} executed", name);
        }
        output.into_value()
    }

    async fn execute(&self, invocation: ToolInvocation) -> ToolOutput {
        match invocation {
            ToolInvocation::CustomerInfo(args) => {
                match self.commerce.get_customer(args.customer_id.trim()).await {
                    Ok(Some(customer)) => ToolOutput::Data(to_json_value(&customer)),
                    Ok(None) => ToolOutput::error(
                        ToolErrorCode::NotFound,
                        format!("고객 정보를 찾을 수 없습니다: {}", args.customer_id),
                    ),
                    Err(e) => lookup_failed(e),
                }
            }
            ToolInvocation::OrderDetails(args) => self.order_details(args).await,
            ToolInvocation::ProductInfo(args) => match self.resolve_product(&args).await {
                Ok(product) => ToolOutput::Data(to_json_value(&product)),
                Err(output) => output,
            },
            ToolInvocation::QnaByProduct(args) => {
                let product = match self.resolve_product(&args).await {
                    Ok(product) => product,
                    Err(output) => return output,
                };
                match self.commerce.qnas_for_product(product.product_no).await {
                    Ok(qnas) => ToolOutput::Data(json!({
                        "product_no": product.product_no,
                        "product_name": product.product_name,
                        "qnas": to_json_value(&qnas),
                    })),
                    Err(e) => lookup_failed(e),
                }
            }
            ToolInvocation::ReviewsByProduct(args) => {
                let product = match self.resolve_product(&args).await {
                    Ok(product) => product,
                    Err(output) => return output,
                };
                match self.commerce.reviews_for_product(product.product_no).await {
                    Ok(reviews) => ToolOutput::Data(json!({
                        "product_no": product.product_no,
                        "product_name": product.product_name,
                        "reviews": to_json_value(&reviews),
                    })),
                    Err(e) => lookup_failed(e),
                }
            }
            ToolInvocation::TopMarginProducts(args) => {
                let since = days_ago(args.period_days);
                match self
                    .commerce
                    .top_margin_products(args.limit as usize, since)
                    .await
                {
                    Ok(reports) => ToolOutput::Data(to_json_value(&reports)),
                    Err(e) => lookup_failed(e),
                }
            }
            ToolInvocation::SummarizeNegativeReviews(args) => {
                let since = days_ago(args.days);
                let reviews = match self
                    .commerce
                    .negative_reviews(self.negative_rating_threshold, Some(since))
                    .await
                {
                    Ok(reviews) => reviews,
                    Err(e) => return lookup_failed(e),
                };
                match reviews::summarize_negative_reviews(
                    self.llm.as_ref(),
                    &self.models.high_cost,
                    &reviews,
                    args.days,
                )
                .await
                {
                    Ok(summary) => ToolOutput::Data(json!({
                        "review_count": reviews.len(),
                        "summary": summary,
                    })),
                    Err(e) => ToolOutput::error(ToolErrorCode::ModelFailed, e.to_string()),
                }
            }
            ToolInvocation::ReviewReply(ReviewReplyArgs {
                review_text,
                product_name,
            }) => match self.draft_review_reply(&review_text, &product_name).await {
                Ok(draft_reply) => ToolOutput::Data(json!({ "draft_reply": draft_reply })),
                Err(e) => ToolOutput::error(ToolErrorCode::ModelFailed, e.to_string()),
            },
        }
    }

    /// Reply drafting outside a conversation, for the admin review queue.
    pub async fn draft_review_reply(
        &self,
        review_text: &str,
        product_name: &str,
    ) -> Result<String, crate::llm::LlmError> {
        reviews::draft_review_reply(
            self.llm.as_ref(),
            &self.models.high_cost,
            review_text,
            product_name,
        )
        .await
    }

    async fn order_details(&self, args: OrderDetailsArgs) -> ToolOutput {
        let customer_id = non_blank(args.customer_id.as_deref());
        let order_id = non_blank(args.order_id.as_deref());
        if customer_id.is_none() && order_id.is_none() {
            return ToolOutput::error(
                ToolErrorCode::MissingArguments,
                "customer_id 또는 order_id 중 하나는 반드시 필요합니다.",
            );
        }

        match self.commerce.find_orders(customer_id, order_id).await {
            Ok(orders) => ToolOutput::Data(to_json_value(&orders)),
            Err(e) => lookup_failed(e),
        }
    }

    async fn resolve_product(&self, args: &ProductLookupArgs) -> Result<Product, ToolOutput> {
        let name = non_blank(args.product_name.as_deref());
        if args.product_no.is_none() && name.is_none() {
            return Err(ToolOutput::error(
                ToolErrorCode::MissingArguments,
                "product_no 또는 product_name 중 하나는 반드시 필요합니다.",
            ));
        }

        match self.commerce.find_product(args.product_no, name).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(ToolOutput::error(
                ToolErrorCode::NotFound,
                "해당 상품을 찾을 수 없습니다.",
            )),
            Err(e) => Err(lookup_failed(e)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lookup_failed(err: ApiError) -> ToolOutput {
    tracing::error!("Tool lookup failed: {}", err);
    ToolOutput::error(ToolErrorCode::LookupFailed, "데이터 조회 중 오류가 발생했습니다.")
}

/// Start of a look-back window; saturates at the earliest representable time.
fn days_ago(days: u32) -> DateTime<Utc> {
    Utc::now()
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::prompt::{build_context_block, build_system_prompt, CorrectionDirective};
use crate::history::InquiryLogStore;
use crate::llm::{
    ChatMessage, ChatRequest, Complexity, ContentPart, ImageUrl, LlmError, LlmProvider,
    ModelCatalog,
};
use crate::rag::KnowledgeBase;
use crate::tools::{ToolCallResult, ToolRegistry};

pub const APOLOGY_MESSAGE: &str =
    "죄송합니다. 일시적인 오류로 답변을 드리지 못했습니다. 잠시 후 다시 문의해 주세요.";

const VISION_PROMPT: &str = "고객이 문의와 함께 첨부한 이미지입니다. \
상품 상태, 파손 여부, 보이는 문구 등 CS 처리에 필요한 내용을 객관적으로 설명해주세요.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub customer_id: String,
    pub query: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub complexity: Complexity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Answered,
    Degraded { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub log_id: String,
    pub text: String,
    /// Query as answered, with any image description prepended.
    pub input_text: String,
    pub tool_used: bool,
    pub tool_results: Vec<ToolCallResult>,
    pub model: String,
    pub outcome: ReplyOutcome,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub persona: String,
    pub failure_history_limit: usize,
    pub top_k: usize,
}

/// One customer turn: retrieve, correct, call the model, run tools, answer, log.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    knowledge: KnowledgeBase,
    logs: InquiryLogStore,
    tools: ToolRegistry,
    llm: Arc<dyn LlmProvider>,
    models: ModelCatalog,
    settings: AgentSettings,
}

impl ConversationOrchestrator {
    pub fn new(
        knowledge: KnowledgeBase,
        logs: InquiryLogStore,
        tools: ToolRegistry,
        llm: Arc<dyn LlmProvider>,
        models: ModelCatalog,
        settings: AgentSettings,
    ) -> Self {
        Self {
            knowledge,
            logs,
            tools,
            llm,
            models,
            settings,
        }
    }

    /// Always produces a reply. Model failures become an apology marked degraded;
    /// the log write happens afterwards and its failure is only logged.
    pub async fn respond(&self, inquiry: Inquiry) -> AgentReply {
        let log_id = uuid::Uuid::new_v4().to_string();
        let query = self.enrich_with_image(&inquiry).await;

        let documents = self.knowledge.retrieve(&query, self.settings.top_k).await;
        let context_block = build_context_block(&documents);

        let failures = match self
            .logs
            .recent_failures(&inquiry.customer_id, self.settings.failure_history_limit)
            .await
        {
            Ok(failures) => failures,
            Err(e) => {
                tracing::warn!("Failure history unavailable for {}: {}", inquiry.customer_id, e);
                Vec::new()
            }
        };
        let directive =
            CorrectionDirective::from_failures(failures, self.settings.failure_history_limit);

        let model = self.models.for_complexity(inquiry.complexity).to_string();
        tracing::info!(
            customer_id = %inquiry.customer_id,
            model = %model,
            context_docs = documents.len(),
            corrections = directive.len(),
            "Answering inquiry"
        );

        let system_prompt = build_system_prompt(&self.settings.persona, &context_block, &directive);
        let mut tool_results = Vec::new();
        let (text, outcome) = match self
            .run_turn(&system_prompt, &query, &model, &mut tool_results)
            .await
        {
            Ok(text) => (text, ReplyOutcome::Answered),
            Err(e) => {
                tracing::error!("Model call failed for {}: {}", inquiry.customer_id, e);
                (
                    APOLOGY_MESSAGE.to_string(),
                    ReplyOutcome::Degraded {
                        reason: e.to_string(),
                    },
                )
            }
        };

        if let Err(e) = self
            .logs
            .insert(&log_id, &inquiry.customer_id, &query, &text)
            .await
        {
            tracing::warn!("Inquiry log {} was not saved: {}", log_id, e);
        }

        AgentReply {
            log_id,
            text,
            input_text: query,
            tool_used: !tool_results.is_empty(),
            tool_results,
            model,
            outcome,
        }
    }

    async fn run_turn(
        &self,
        system_prompt: &str,
        query: &str,
        model: &str,
        tool_results: &mut Vec<ToolCallResult>,
    ) -> Result<String, LlmError> {
        let mut transcript = vec![ChatMessage::system(system_prompt), ChatMessage::user(query)];

        let first = self
            .llm
            .chat(
                ChatRequest::new(transcript.clone())
                    .with_tools(self.tools.specs())
                    .with_temperature(0.0),
                model,
            )
            .await?;

        if first.tool_calls.is_empty() {
            return Ok(first.content_or_empty().to_string());
        }

        transcript.push(ChatMessage::assistant_tool_calls(
            first.content.clone(),
            first.tool_calls.clone(),
        ));

        for call in &first.tool_calls {
            let output = self
                .tools
                .dispatch(&call.function.name, &call.function.arguments)
                .await;
            transcript.push(ChatMessage::tool_result(&call.id, output.to_string()));

            tool_results.push(ToolCallResult {
                tool_name: call.function.name.clone(),
                call_id: call.id.clone(),
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
                output,
            });
        }

        let second = self
            .llm
            .chat(ChatRequest::new(transcript).with_temperature(0.0), model)
            .await?;
        Ok(second.content_or_empty().to_string())
    }

    async fn enrich_with_image(&self, inquiry: &Inquiry) -> String {
        let Some(image_url) = inquiry.image_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return inquiry.query.clone();
        };

        match self.describe_image(image_url).await {
            Ok(description) if !description.is_empty() => {
                format!("[첨부 이미지 설명: {}]\n{}", description, inquiry.query)
            }
            Ok(_) => inquiry.query.clone(),
            Err(e) => {
                tracing::warn!("Image description failed, answering from text only: {}", e);
                inquiry.query.clone()
            }
        }
    }

    async fn describe_image(&self, image_url: &str) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: VISION_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image_url.to_string(),
                },
            },
        ])]);

        let response = self.llm.chat(request, &self.models.vision).await?;
        Ok(response.content_or_empty().trim().to_string())
    }
}

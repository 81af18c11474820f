use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::agent::{Inquiry, ReplyOutcome};
use crate::core::errors::ApiError;
use crate::history::Feedback;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(inquiry): Json<Inquiry>,
) -> Result<impl IntoResponse, ApiError> {
    if inquiry.customer_id.trim().is_empty() || inquiry.query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "customer_id and query are required".to_string(),
        ));
    }

    tracing::info!(customer_id = %inquiry.customer_id, "Chat request received");
    let reply = state.orchestrator.respond(inquiry).await;
    if let ReplyOutcome::Degraded { reason } = &reply.outcome {
        tracing::warn!(log_id = %reply.log_id, "Degraded reply: {}", reason);
    }

    Ok(Json(json!({
        "log_id": reply.log_id,
        "response": reply.text,
        "tool_used": reply.tool_used,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub log_id: String,
    pub resolution_feedback: String,
    #[serde(default)]
    pub final_resolution: Option<String>,
}

pub async fn feedback(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FeedbackForm>,
) -> Result<impl IntoResponse, ApiError> {
    let verdict: Feedback = form.resolution_feedback.parse()?;
    state
        .feedback
        .submit(&form.log_id, verdict, form.final_resolution.as_deref())
        .await?;

    Ok(Json(json!({ "message": "피드백이 성공적으로 저장되었습니다." })))
}

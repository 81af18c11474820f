use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "CS & CRM LLM Agent API가 실행 중입니다." }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let knowledge_documents = match state.knowledge.count(None).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Knowledge count unavailable: {}", e);
            None
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "knowledge_documents": knowledge_documents,
    }))
}

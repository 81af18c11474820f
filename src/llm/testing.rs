//! In-process provider doubles for unit and scenario tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::LlmError;
use super::provider::LlmProvider;
use super::types::{ChatRequest, ChatResponse};

pub const EMBEDDING_DIMS: usize = 256;

/// Deterministic character n-gram embedding: near-duplicate strings land close
/// together under cosine similarity.
pub fn ngram_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIMS];
    let chars: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let mut bump = |gram: &[char]| {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for c in gram {
            hash ^= *c as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        vector[(hash % EMBEDDING_DIMS as u64) as usize] += 1.0;
    };

    for c in chars.windows(1) {
        bump(c);
    }
    for pair in chars.windows(2) {
        bump(pair);
    }
    vector
}

/// Replays queued chat responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<(ChatRequest, String)>>,
    embed_calls: Mutex<Vec<Vec<String>>>,
    fail_embeddings: AtomicBool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        let provider = Self::new();
        provider
            .responses
            .lock()
            .unwrap()
            .extend(responses);
        provider
    }

    pub fn push(&self, response: Result<ChatResponse, LlmError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_text(&self, text: &str) {
        self.push(Ok(ChatResponse::text(text)));
    }

    pub fn fail_embeddings(&self) {
        self.fail_embeddings.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(ChatRequest, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn embed_calls(&self) -> Vec<Vec<String>> {
        self.embed_calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatResponse, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((request, model_id.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.lock().unwrap().push(inputs.to_vec());
        if self.fail_embeddings.load(Ordering::SeqCst) {
            return Err(LlmError::Status {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }
        Ok(inputs.iter().map(|text| ngram_embedding(text)).collect())
    }
}

use serde::{Deserialize, Serialize};

pub const DEFAULT_PERSONA: &str = "당신은 네이버 스마트스토어 CS 전문가입니다. \
고객에게 정중하고 정확하게 답변하며, 확인되지 않은 사실은 추측하지 않습니다.";

/// Typed view over the merged `config.yml` + `secrets.yaml` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub knowledge: KnowledgeConfig,
    pub agent: AgentConfig,
    pub evolution: EvolutionConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub low_cost_model: String,
    pub high_cost_model: String,
    pub vision_model: String,
    pub embedding_model: String,
    pub evolution_model: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            low_cost_model: "gpt-3.5-turbo".to_string(),
            high_cost_model: "gpt-4o".to_string(),
            vision_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            evolution_model: "gpt-4o".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub top_k: usize,
    pub embed_batch_size: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            embed_batch_size: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub persona: String,
    pub failure_history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            failure_history_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub temperature: f64,
    pub max_tokens: u32,
    /// Claims older than this are considered abandoned by a crashed run.
    pub stale_claim_minutes: i64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            stale_claim_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub low_stock_threshold: i64,
    pub claim_surge_threshold: usize,
    pub claim_surge_window_hours: i64,
    pub negative_rating_threshold: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 50,
            claim_surge_threshold: 3,
            claim_surge_window_hours: 24,
            negative_rating_threshold: 2,
        }
    }
}

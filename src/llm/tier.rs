use serde::{Deserialize, Serialize};

use crate::core::config::defaults::LlmConfig;

/// Inquiry complexity as classified by the caller. Unknown labels fail to
/// deserialize instead of silently landing on the cheap model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    HighUrgency,
    ComplexMultimodal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    LowCost,
    HighCost,
}

impl Complexity {
    pub fn tier(self) -> ModelTier {
        match self {
            Complexity::HighUrgency | Complexity::ComplexMultimodal => ModelTier::HighCost,
            Complexity::Low | Complexity::Medium => ModelTier::LowCost,
        }
    }
}

/// Model identifiers per role, resolved once from config.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    pub low_cost: String,
    pub high_cost: String,
    pub vision: String,
    pub embedding: String,
    pub evolution: String,
}

impl ModelCatalog {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            low_cost: config.low_cost_model.clone(),
            high_cost: config.high_cost_model.clone(),
            vision: config.vision_model.clone(),
            embedding: config.embedding_model.clone(),
            evolution: config.evolution_model.clone(),
        }
    }

    pub fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::LowCost => &self.low_cost,
            ModelTier::HighCost => &self.high_cost,
        }
    }

    pub fn for_complexity(&self, complexity: Complexity) -> &str {
        self.for_tier(complexity.tier())
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

use std::sync::Arc;

use crate::agent::{AgentSettings, ConversationOrchestrator};
use crate::commerce::{CommerceStore, WarningRules};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::db;
use crate::evolution::{EvolutionRunner, FeedbackIntake, LearningQueue, ReviewAnalyzer};
use crate::history::InquiryLogStore;
use crate::llm::{LlmProvider, ModelCatalog, OpenAiProvider};
use crate::rag::{KnowledgeBase, SqliteKnowledgeStore};
use crate::tools::ToolRegistry;

pub mod error;

use error::InitializationError;

/// Application-scoped services, built once at startup and shared by every
/// handler and batch command.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub models: ModelCatalog,
    pub llm: Arc<dyn LlmProvider>,
    pub commerce: CommerceStore,
    pub logs: InquiryLogStore,
    pub feedback: FeedbackIntake,
    pub queue: LearningQueue,
    pub knowledge: KnowledgeBase,
    pub tools: ToolRegistry,
    pub orchestrator: ConversationOrchestrator,
}

impl AppState {
    /// Loads configuration, connects the model client and opens both databases.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone())
            .load_app_config()
            .map_err(InitializationError::Config)?;

        let has_key = config
            .llm
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(InitializationError::MissingApiKey);
        }

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OpenAiProvider::from_config(&config.llm).map_err(InitializationError::Llm)?);

        let state = Self::build(paths, config, llm).await?;
        tracing::info!(
            db = %state.paths.db_path.display(),
            knowledge_db = %state.paths.knowledge_db_path.display(),
            "Application state initialized"
        );
        Ok(Arc::new(state))
    }

    /// Wires every service around an already constructed model client.
    pub async fn build(
        paths: Arc<AppPaths>,
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self, InitializationError> {
        let pool = db::connect(&paths.db_path)
            .await
            .map_err(|source| InitializationError::Database {
                store: "commerce",
                source,
            })?;
        let relational = |source| InitializationError::Database {
            store: "commerce",
            source,
        };
        let commerce = CommerceStore::with_pool(pool.clone())
            .await
            .map_err(relational)?;
        let logs = InquiryLogStore::with_pool(pool.clone())
            .await
            .map_err(relational)?;
        let queue = LearningQueue::with_pool(pool).await.map_err(relational)?;

        let knowledge_store = SqliteKnowledgeStore::open(&paths.knowledge_db_path)
            .await
            .map_err(|source| InitializationError::Database {
                store: "knowledge",
                source,
            })?;

        let models = ModelCatalog::from_config(&config.llm);
        let knowledge = KnowledgeBase::new(
            Arc::new(knowledge_store),
            llm.clone(),
            models.embedding.clone(),
            config.knowledge.top_k,
        )
        .with_embed_batch_size(config.knowledge.embed_batch_size);
        let tools = ToolRegistry::new(
            commerce.clone(),
            llm.clone(),
            models.clone(),
            config.admin.negative_rating_threshold,
        );
        let orchestrator = ConversationOrchestrator::new(
            knowledge.clone(),
            logs.clone(),
            tools.clone(),
            llm.clone(),
            models.clone(),
            AgentSettings {
                persona: config.agent.persona.clone(),
                failure_history_limit: config.agent.failure_history_limit,
                top_k: config.knowledge.top_k,
            },
        );

        Ok(AppState {
            paths,
            feedback: FeedbackIntake::new(logs.clone()),
            config,
            models,
            llm,
            commerce,
            logs,
            queue,
            knowledge,
            tools,
            orchestrator,
        })
    }

    pub fn warning_rules(&self) -> WarningRules {
        WarningRules {
            surge_threshold: self.config.admin.claim_surge_threshold,
            window_hours: self.config.admin.claim_surge_window_hours,
        }
    }

    pub fn evolution_runner(&self) -> EvolutionRunner {
        EvolutionRunner::new(
            self.logs.clone(),
            self.queue.clone(),
            self.knowledge.clone(),
            self.llm.clone(),
            self.models.evolution.clone(),
            self.config.evolution.clone(),
        )
    }

    pub fn review_analyzer(&self) -> ReviewAnalyzer {
        ReviewAnalyzer::new(
            self.llm.clone(),
            self.models.vision.clone(),
            self.config.admin.negative_rating_threshold,
        )
    }
}

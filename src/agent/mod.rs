mod orchestrator;
pub mod prompt;


pub use orchestrator::{
    AgentReply, AgentSettings, ConversationOrchestrator, Inquiry, ReplyOutcome, APOLOGY_MESSAGE,
};
pub use prompt::{build_context_block, CorrectionDirective};

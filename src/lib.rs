//! Customer-support backend for a single online store: retrieval-augmented
//! answers with commerce tools, a feedback-driven learning loop and an admin API.

pub mod agent;
pub mod commerce;
pub mod core;
pub mod evolution;
pub mod history;
pub mod llm;
pub mod rag;
pub mod seed;
pub mod server;
pub mod state;
pub mod tools;

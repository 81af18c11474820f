mod analyzer;
mod error;
mod feedback;
mod queue;
mod runner;

#[cfg(test)]
mod tests;

pub use analyzer::{ReviewAnalysis, ReviewAnalysisReport, ReviewAnalyzer, ReviewCategory, UrgentReview};
pub use error::LearningError;
pub use feedback::FeedbackIntake;
pub use queue::{LearningOpportunity, LearningQueue};
pub use runner::{BranchReport, EvolutionReport, EvolutionRunner};

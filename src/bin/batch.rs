use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cs_agent::core::config::AppPaths;
use cs_agent::core::logging::{self, LogTarget};
use cs_agent::seed;
use cs_agent::state::AppState;

#[derive(Parser)]
#[command(name = "cs-agent-batch", version, about = "Offline jobs for the CS agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace store data and rebuild the knowledge collection from JSON exports.
    Seed {
        /// Directory holding customers.json, products.json, ... (defaults to the data dir).
        #[arg(long, env = "CS_AGENT_SEED_DIR")]
        dir: Option<PathBuf>,
    },
    /// Learn from corrected failures and queued review complaints.
    Evolve,
    /// Categorize stored reviews and queue actionable complaints for learning.
    AnalyzeReviews,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, LogTarget::Batch);

    let state = AppState::initialize(paths)
        .await
        .context("Failed to initialize application state")?;

    let report = match cli.command {
        Command::Seed { dir } => {
            let dir = dir.unwrap_or_else(|| state.paths.seed_dir.clone());
            let report = seed::seed(&dir, &state.commerce, &state.knowledge)
                .await
                .with_context(|| format!("Seeding from {} failed", dir.display()))?;
            serde_json::to_value(report)?
        }
        Command::Evolve => {
            let report = state
                .evolution_runner()
                .run()
                .await
                .context("Evolution run failed")?;
            serde_json::to_value(report)?
        }
        Command::AnalyzeReviews => {
            let reviews = state
                .commerce
                .reviews()
                .await
                .context("Failed to read reviews")?;
            let report = state
                .review_analyzer()
                .analyze_all(&reviews, &state.queue)
                .await
                .context("Review analysis failed")?;
            serde_json::to_value(report)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

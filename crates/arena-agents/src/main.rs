use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use adjudication::RecordStore;
use arena_agents::{Arena, ArenaConfig, ClientPool, PromptLibrary};

/// Run a four-round model debate and append its record to the store.
#[derive(Debug, Parser)]
#[command(name = "arena-agents", version, about)]
struct Cli {
    /// Debate topic (overrides TOPIC).
    #[arg(long)]
    topic: Option<String>,
    /// Free-text debate conditions (overrides CONDITIONS).
    #[arg(long)]
    conditions: Option<String>,
    /// Blind the jury to true side labels (overrides JUDGE_BLIND).
    #[arg(long)]
    blind: Option<bool>,
    /// Directory for the record store (overrides ARENA_OUTPUT_DIR).
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Prompt template directory (overrides ARENA_PROMPT_DIR).
    #[arg(long)]
    prompt_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ArenaConfig::from_env()?;
    if let Some(topic) = cli.topic {
        config.topic = topic;
    }
    if let Some(conditions) = cli.conditions {
        config.conditions = conditions;
    }
    if let Some(blind) = cli.blind {
        config.blind_jury = blind;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(prompt_dir) = cli.prompt_dir {
        config.prompt_dir = Some(prompt_dir);
    }

    info!(
        a = %config.debater_a.backend,
        b = %config.debater_b.backend,
        judges = %config
            .judges
            .iter()
            .map(|j| j.backend.to_string())
            .collect::<Vec<_>>()
            .join(","),
        "backends"
    );
    info!(
        a = %config.debater_a.base_url,
        b = %config.debater_b.base_url,
        "base urls"
    );

    let prompts = PromptLibrary::load(config.prompt_dir.as_deref())?;
    let pool = ClientPool::from_config(&config);
    let store = RecordStore::new(config.output_dir.join("out.jsonl"));

    let mut arena = Arena::new(config, prompts, &pool)?;
    let record = arena.run().await?;
    store.append(&record)?;

    info!(
        id = %record.id,
        winner = %record.result.winner,
        path = %store.path().display(),
        "record appended"
    );
    Ok(())
}

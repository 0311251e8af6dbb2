use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;

use recap_agent::openai::OpenAiClient;
use recap_agent::runtime::AgentRuntime;
use recap_agent::tokenizer::Gpt2Tokenizer;
use recap_core::config::RecapConfig;
use recap_memory::{RateLimiter, SqliteRateLimitStore};

mod app;

#[derive(Parser, Debug)]
#[command(author, version, about = "Discord chat summarizer", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). Defaults to ~/.recap/recap.toml
    #[arg(short, long, env = "RECAP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "recap=info,recap_agent=info,recap_discord=info,recap_memory=info".into()
            }),
        )
        .init();

    let args = Args::parse();

    // load config: --config / RECAP_CONFIG > ~/.recap/recap.toml
    let config_path = args.config.as_deref().and_then(|p| p.to_str());
    let config = RecapConfig::load(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        RecapConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    recap_memory::db::init_db(&db)?;
    info!("database migrations complete");

    let store = SqliteRateLimitStore::new(db);
    info!(records = store.records()?.len(), "rate limit records loaded");
    let limiter = RateLimiter::new(Arc::new(store));

    let client = build_client(&config)?;
    let tokenizer = Gpt2Tokenizer::new()?;
    let agent = AgentRuntime::new(Box::new(client), Box::new(tokenizer), config.digest.clone());

    let state = Arc::new(app::AppState::new(config, agent, limiter));
    let discord_cfg = state
        .config
        .discord
        .as_ref()
        .context("no [discord] section configured; nothing to run")?;

    let adapter = recap_discord::DiscordAdapter::new(discord_cfg, Arc::clone(&state));
    info!("Discord bot starting");
    adapter.run().await?;

    Ok(())
}

/// Build the completion client: `[providers.openai]` first, then `OPENAI_API_KEY`.
fn build_client(config: &RecapConfig) -> anyhow::Result<OpenAiClient> {
    if let Some(ref openai) = config.providers.openai {
        info!(base_url = %openai.base_url, "completion client: OpenAI (config)");
        return Ok(OpenAiClient::new(
            openai.api_key.clone(),
            Some(openai.base_url.clone()),
        ));
    }

    let key = std::env::var("OPENAI_API_KEY")
        .context("no OpenAI credentials: set [providers.openai] or OPENAI_API_KEY")?;
    info!("completion client: OpenAI (env)");
    Ok(OpenAiClient::new(key, None))
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

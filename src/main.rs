mod assets;
mod breakdown;
mod config;
mod llm;
mod logging;
mod server;

#[cfg(test)]
mod main_test;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use dotenvy::dotenv;
use tracing::{error, info};

use crate::breakdown::{AppState, ExtractionMode};
use crate::config::{AppConfig, Provider};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "idea-breakdown",
    version,
    about = "HTTP service that turns a project idea into a prioritized build plan"
)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/idea-breakdown/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    listen: Option<String>,

    /// Model provider
    #[arg(long, value_enum)]
    provider: Option<Provider>,

    /// Provider API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// API key (set via env GOOGLE_AI_API_KEY / OPENAI_API_KEY recommended)
    #[arg(long)]
    api_key: Option<String>,

    /// How to locate the JSON object in model replies
    #[arg(long, value_enum)]
    extraction: Option<ExtractionMode>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("BREAKDOWN_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    logging::init_logging(&log_level, cli.log_json)?;

    let cfg = AppConfig::from_cli(&cli).context("load configuration")?;
    info!(?cfg, "app config");

    if let Err(e) = cfg.require_api_key() {
        error!(error=%e, "refusing to start");
        return Err(e.into());
    }

    let generator = llm::client_from_config(&cfg)?;
    info!(provider=%cfg.provider, model = generator.model(), "model client ready");

    let state = AppState {
        generator,
        extraction: cfg.extraction,
    };
    server::run(cfg.listen, state).await
}

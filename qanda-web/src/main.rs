//! Qanda Web Server
//!
//! HTTP interface for asking Gemini questions and browsing previous answers.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qanda_core::{init_logging, QandaConfig};
use qanda_web::QandaServerBuilder;

/// Qanda Web Server - ask Gemini questions over HTTP
#[derive(Parser)]
#[command(name = "qanda-web")]
#[command(about = "HTTP interface for qanda")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL for the query history
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<QandaConfig> {
    let mut config = QandaConfig::load(args.config.as_deref())?;
    config.apply_env()?;

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database_url) = &args.database_url {
        config.storage.database_url = database_url.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = load_config(&args).context("Failed to load configuration")?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if config.llm.api_key.is_none() {
        tracing::error!("GEMINI_API_KEY is not set");
    }

    let server = QandaServerBuilder::new()
        .config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}

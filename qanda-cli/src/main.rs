//! Qanda CLI - ask Gemini questions from the terminal

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use qanda_cli::{print_generation_models, run_loop};
use qanda_core::{
    init_logging, ErrorContext, LoggingConfig, QandaConfig, QandaError, QandaResult,
};
use qanda_llm::GeminiClient;

#[derive(Parser)]
#[command(name = "qanda")]
#[command(about = "Ask Gemini questions from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop (default)
    Ask,

    /// List models that support text generation
    Models,

    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> QandaResult<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // `config --init` may be pointed at a file that does not exist yet
    let creating = matches!(cli.command, Some(Commands::Config { init: true, .. }))
        && cli.config.as_deref().is_some_and(|path| !path.exists());
    let config = if creating {
        QandaConfig::default()
    } else {
        load_config(cli.config.as_deref())?
    };

    init_logging(&cli_logging(&config.logging, cli.verbose)).map_err(|e| QandaError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    info!("Starting qanda CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Ask) {
        Commands::Ask => {
            let client = GeminiClient::new(config.llm)?;
            let stdin = std::io::stdin();
            run_loop(&client, stdin.lock(), std::io::stdout()).await?;
        }
        Commands::Models => {
            let client = GeminiClient::new(config.llm)?;
            print_generation_models(&client, std::io::stdout()).await?;
        }
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(&config, cli.config.as_deref(), show, init, validate)?,
    }

    Ok(())
}

/// Quiet logging on stderr, so the transcript on stdout stays readable
fn cli_logging(base: &LoggingConfig, verbose: bool) -> LoggingConfig {
    let mut logging = base.clone();
    logging.level = if verbose { "debug" } else { "warn" }.to_string();
    logging.filter_directives.clear();
    logging.log_to_stderr = true;
    logging
}

fn load_config(path: Option<&Path>) -> QandaResult<QandaConfig> {
    let mut config = QandaConfig::load(path)?;
    config.apply_env()?;
    Ok(config)
}

fn handle_config(
    config: &QandaConfig,
    path: Option<&Path>,
    show: bool,
    init: bool,
    validate: bool,
) -> QandaResult<()> {
    if init {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        if config_path.exists() {
            println!("Configuration already exists at: {:?}", config_path);
        } else {
            QandaConfig::default().save_to_file(&config_path)?;
            println!("Configuration initialized at: {:?}", config_path);
            println!("Set GEMINI_API_KEY in your environment or .env file, or add llm.api_key.");
        }
    }

    if show {
        let mut shown = config.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        let rendered = toml::to_string_pretty(&shown).map_err(|e| QandaError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("config_show"),
        })?;
        println!("Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
        if config.llm.api_key.is_none() {
            println!("Warning: no API key configured (set GEMINI_API_KEY)");
        }
    }

    if !(init || show || validate) {
        println!("Nothing to do. Use --init, --show or --validate.");
    }

    Ok(())
}

fn default_config_path() -> QandaResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|dir| dir.join("qanda").join("config.toml"))
        .ok_or_else(|| QandaError::Config {
            message: "Could not determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("config_init")
                .with_suggestion("Pass --config with an explicit path"),
        })
}

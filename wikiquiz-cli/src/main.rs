//! WikiQuiz CLI
//!
//! Generate multiple-choice quizzes from Wikipedia articles, browse the
//! stored ones, and run the HTTP API for the frontend.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wikiquiz_core::config::ConfigError;
use wikiquiz_core::Config;

/// WikiQuiz - quizzes from Wikipedia articles
#[derive(Parser)]
#[command(name = "wikiquiz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to use (overrides config)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Server port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "WIKIQUIZ_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to the SQLite database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Generate and store a quiz for an article
    Generate {
        /// Wikipedia article URL
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract an article without calling the model
    Scrape {
        /// Wikipedia article URL
        url: String,

        /// Stop after this many paragraphs
        #[arg(long)]
        max_paragraphs: Option<usize>,
    },

    /// List stored quizzes
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a stored quiz
    Show {
        /// Quiz id
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the server is running
    Status,

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Initialize default configuration
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// Load configuration for `cli`, returning defaults plus the error when the
/// default config file is unreadable
fn load_config(cli: &Cli) -> Result<(Config, Option<ConfigError>)> {
    let creating = matches!(cli.command, Commands::Config(ConfigCommands::Init { .. }));

    match &cli.config {
        // `config init` is what creates the file
        Some(path) if creating && !path.exists() => Ok((Config::default(), None)),
        Some(path) => Ok((Config::load_from_file(path)?, None)),
        None => Ok(match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (mut config, config_error) = load_config(&cli)?;

    // Apply CLI overrides
    if let Some(model) = &cli.model {
        config.model.model_id = model.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }

    init_logging(&config.logging.level);
    if let Some(e) = config_error {
        tracing::warn!("Ignoring unreadable config file, using defaults: {}", e);
    }

    // Ensure wikiquiz directory exists
    Config::ensure_dirs()?;

    match cli.command {
        Commands::Serve => commands::serve::run(config).await,
        Commands::Generate { url, json } => commands::generate::run(config, &url, json).await,
        Commands::Scrape {
            url,
            max_paragraphs,
        } => commands::scrape::run(config, &url, max_paragraphs).await,
        Commands::History { json } => commands::history::run(config, json).await,
        Commands::Show { id, json } => commands::show::run(config, id, json).await,
        Commands::Status => commands::status::run(config).await,
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(config),
            ConfigCommands::Init { force } => commands::config::init(cli.config, force),
        },
    }
}

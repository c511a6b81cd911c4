use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod commands;
mod config;
mod error;
mod events;
mod session;
mod tui;
mod ui;

use config::Config;

#[derive(Parser)]
#[command(name = "taskchat")]
#[command(version)]
#[command(about = "Chat with the AI task assistant from your terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.taskchat/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Conversation endpoint URL, e.g. https://example.com/chat
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// User identifier sent with every message
    #[arg(long, global = true, value_name = "ID")]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Send {
        message: String,
        /// Continue an existing conversation
        #[arg(short, long)]
        conversation_id: Option<String>,
    },
    /// Show the resolved configuration
    Config,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Where log output goes
enum LogTarget<'a> {
    /// The terminal belongs to the UI, so log to a file
    File(&'a Path),
    Stderr,
}

fn init_logging(target: LogTarget<'_>, default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    match target {
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli, path: &Path) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(cli.endpoint.clone(), cli.user_id.clone());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match &cli.command {
        None | Some(Commands::Chat) => {
            let config = resolve_config(&cli, &config_path)?;
            config.validate()?;
            init_logging(LogTarget::File(&config.log_file), "taskchat=info")?;
            tracing::info!(config = %config_path.display(), "configuration loaded");
            app::run(config).await
        }
        Some(Commands::Send {
            message,
            conversation_id,
        }) => {
            init_logging(LogTarget::Stderr, "taskchat=warn")?;
            let config = resolve_config(&cli, &config_path)?;
            config.validate()?;
            commands::send_message(&config, message, conversation_id.clone()).await
        }
        Some(Commands::Config) => {
            init_logging(LogTarget::Stderr, "taskchat=warn")?;
            let config = resolve_config(&cli, &config_path)?;
            commands::show_config(&config, &config_path)?;
            if let Err(err) = config.validate() {
                println!("\n⚠️  {err:#}");
            }
            Ok(())
        }
        Some(Commands::Init { force }) => {
            init_logging(LogTarget::Stderr, "taskchat=warn")?;
            commands::init_config(&config_path, *force)
        }
    }
}

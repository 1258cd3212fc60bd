use aidoc::backend::HttpBackend;
use aidoc::config::Config;
use aidoc::manager::{SessionManager, SubmitOutcome};
use aidoc::{markup, ui};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aidoc")]
#[command(version = "0.1.0")]
#[command(about = "Terminal client for the AI Doctor symptom chat", long_about = None)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Read configuration from this file instead of ~/.aidoc/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Check whether the backend is online
    Health,
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("AIDOC_LOG").unwrap_or_else(|_| EnvFilter::new("aidoc=info"))
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The TUI owns the terminal, so its logs go to a file
fn init_file_logging(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "aidoc.log"));
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Configuration for talking to the backend, with `--api-url` applied for this run only
fn session_config(cli: &Cli, config: &Config) -> Config {
    let mut config = config.clone();
    if let Some(url) = &cli.api_url {
        config.set_api_base_url(url);
    }
    config
}

/// Emphasis becomes escape codes only when the output is a terminal
fn render_reply(content: &str, styled: bool) -> String {
    if styled {
        markup::to_ansi(content)
    } else {
        markup::to_plain(content)
    }
}

async fn ask(config: &Config, text: &str) -> Result<ExitCode> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let mut manager = SessionManager::new(backend);

    let outcome = manager.submit(text).await;
    if let SubmitOutcome::Rejected(reason) = outcome {
        anyhow::bail!("Nothing to send ({:?})", reason);
    }

    let Some(reply) = manager.session().log().last() else {
        anyhow::bail!("No reply was recorded");
    };

    if reply.is_error {
        eprintln!("{}", reply.content.as_str().red());
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", render_reply(&reply.content, io::stdout().is_terminal()));
    if !reply.context_used.is_empty() {
        println!();
        println!("{}", "📚 Medical context used:".cyan());
        for context in &reply.context_used {
            println!("  • {}", context.as_str().dark_grey());
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn health(config: &Config) -> Result<ExitCode> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let status = SessionManager::init_session(backend).await.session().health();

    println!("{} {}", config.api_base_url, status.label());
    Ok(if status.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(config: &Config, init: bool) -> Result<ExitCode> {
    if init {
        config.save()?;
        println!("✅ Wrote {}", config.config_path().display());
    }

    println!("📄 {}", config.config_path().display());
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let stored = load_config(&cli)?;
    let config = session_config(&cli, &stored);

    match cli.command {
        None => {
            let _guard = init_file_logging(&config)?;
            let backend = Arc::new(HttpBackend::new(&config)?);
            ui::run(&config, backend).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { text }) => {
            init_stderr_logging();
            ask(&config, &text.join(" ")).await
        }
        Some(Commands::Health) => {
            init_stderr_logging();
            health(&config).await
        }
        Some(Commands::Config { init }) => show_config(&stored, init),
    }
}

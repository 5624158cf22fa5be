mod app;
mod client;
mod commands;
mod query;
mod refresh;
mod terminal;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use apo_core::agent::Agent;
use apo_core::config::{Config, config_dir};
use apo_core::source::DataSource;
use apo_core::state::DataSnapshot;

use app::App;
use client::{AzureClient, FakeSource};
use query::BlockingAgent;
use refresh::Refresher;
use terminal::{RawModeGuard, Terminal, install_panic_hook};
use ui::views::DetailContext;

const LOG_ENV: &str = "APO_LOG";
const DEFAULT_LOG_FILTER: &str = "apo=info";
/// One-shot commands share the terminal with their output, so stay quieter.
const DEFAULT_STDERR_FILTER: &str = "apo=warn";
const LOG_FILE: &str = "apo.log";
const DEMO_LATENCY: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "apo", version)]
#[command(
    about = "Azure Prod Ops - a terminal dashboard for Azure DevOps",
    long_about = None
)]
struct Cli {
    /// Use built-in demo data instead of connecting to Azure DevOps
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the dashboard (default)
    #[command(alias = "ui")]
    Tui,
    /// Ask a question in plain English
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Configure the Azure DevOps connection
    Config,
}

fn log_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// The dashboard owns the terminal, so its logs go to a file.
fn init_file_logging() -> io::Result<PathBuf> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(DEFAULT_LOG_FILTER))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(path)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(DEFAULT_STDERR_FILTER))
        .with_writer(io::stderr)
        .init();
}

/// Pick the data source: demo data, or the live client from the saved config.
fn open_source(demo: bool) -> anyhow::Result<(Arc<dyn DataSource>, DetailContext)> {
    if demo {
        let context = DetailContext {
            organization: "demo".into(),
            project: "apo".into(),
        };
        let source: Arc<dyn DataSource> = Arc::new(FakeSource::new().with_latency(DEMO_LATENCY));
        return Ok((source, context));
    }

    let config = Config::load().context("loading config")?;
    config
        .validate_with_project()
        .context("connection not configured; run 'apo config' first")?;
    let client: Arc<dyn DataSource> = Arc::new(AzureClient::new(&config)?);
    let context = DetailContext {
        organization: config.organization,
        project: config.project,
    };
    Ok((client, context))
}

async fn run_tui(demo: bool) -> anyhow::Result<()> {
    match init_file_logging() {
        Ok(path) => tracing::info!(path = %path.display(), "logging to file"),
        Err(e) => eprintln!("warning: file logging disabled: {}", e),
    }

    let (source, context) = open_source(demo)?;
    tracing::info!(source = source.name(), "starting dashboard");

    let handle = Handle::current();
    let snapshot = DataSnapshot::shared();
    let (refresher, refresh_done) =
        Refresher::new(source.clone(), snapshot.clone(), handle.clone());
    let query = BlockingAgent::new(Arc::new(Agent::new(source)), handle);
    let mut app = App::new(context, Box::new(query), snapshot, refresher, refresh_done);

    install_panic_hook();

    // Key reads block, so the UI loop gets its own thread.
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut term = Terminal::new();
        let _guard = RawModeGuard::enable(&mut term)?;
        app.run(&mut term)
    })
    .await??;

    tracing::info!("dashboard closed");
    Ok(())
}

async fn run_ask(demo: bool, question: &[String]) -> anyhow::Result<()> {
    init_stderr_logging();
    let (source, _) = open_source(demo)?;
    commands::run_ask(source, &question.join(" ")).await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => {
            init_stderr_logging();
            commands::run_config().await
        }
        Some(Commands::Ask { question }) => run_ask(cli.demo, &question).await,
        Some(Commands::Tui) | None => run_tui(cli.demo).await,
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use repochat_core::{AnalyzerClient, Config, Controller, HttpAnalyzerApi};

mod app;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "repochat")]
#[command(version, about = "Ask questions about any GitHub repository from the terminal")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Analyzer service base URL (overrides REPOCHAT_ENDPOINT and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Write logs here instead of the cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Repository URL to start analyzing right away
    repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the config file location and the settings in effect
    Config {
        /// Save this analyzer service base URL to the config file
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { endpoint }) = cli.command {
        let config = match endpoint {
            Some(endpoint) => {
                let config = Config::save_endpoint(&endpoint)?;
                println!("Saved endpoint {}", endpoint.trim());
                config
            }
            None => Config::load()?,
        };
        return print_config(&config);
    }

    let _guard = init_logging(cli.log_file.as_deref())?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config file, using defaults");
        Config::new()
    });
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    info!(%endpoint, "starting repochat");

    let api = HttpAnalyzerApi::new(&endpoint, config.request_timeout())?;
    let client = AnalyzerClient::new(Arc::new(api))
        .with_schedules(config.analyzer_schedule(), config.query_schedule());
    let mut controller = Controller::new(client);
    if let Some(prompt) = config.welcome_prompt.clone() {
        controller = controller.with_welcome_prompt(prompt);
    }

    let mut app = App::new(controller, endpoint);
    if let Some(repo) = cli.repo {
        app.insert_str(&repo);
        app.submit_input();
    }

    // Install panic hook before entering TUI mode
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event)?,
                None => break,
            },
            _ = app.controller.next_update() => {
                app.controller.drain_updates();
                app.sync_with_conversation();
            }
        }
    }

    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file. `RUST_LOG` picks the
/// level, defaulting to info.
fn init_logging(log_file: Option<&Path>) -> Result<WorkerGuard> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?
            .join("repochat")
            .join("repochat.log"),
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;
    fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

fn print_config(config: &Config) -> Result<()> {
    let analyzer = config.analyzer_schedule();
    let query = config.query_schedule();

    println!("Config file:      {}", Config::get_config_path()?.display());
    println!("Endpoint:         {}", config.resolve_endpoint(None));
    println!("Request timeout:  {}s", config.request_timeout().as_secs());
    println!(
        "Analyzer polling: every {}ms, up to {} attempts",
        analyzer.interval.as_millis(),
        analyzer.max_attempts
    );
    println!(
        "Query polling:    every {}ms, up to {} attempts",
        query.interval.as_millis(),
        query.max_attempts
    );
    if config.welcome_prompt.is_some() {
        println!("Welcome prompt:   custom");
    }
    Ok(())
}

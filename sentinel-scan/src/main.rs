//! Sentinel Scan - Main Entry Point

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sentinel_scan::cli::{Cli, Command};
use sentinel_scan::engine::{encode_file, ScanClient, GENERIC_SCAN_ERROR};
use sentinel_scan::logging::init_logging;
use sentinel_scan::terminal::render::{render_error, render_history, render_report};
use sentinel_scan::{
    Config, Database, GeminiOracle, HistoryStore, KeyValueStore, MemoryStore, ScanOrchestrator,
    ScanTarget, TerminalServer,
};

use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn scan(
    orchestrator: &ScanOrchestrator,
    target: ScanTarget,
    json: bool,
) -> Result<(), BoxError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Analyzing {}...", target.label()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = orchestrator.submit_scan(target).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
        Ok(result) => println!("{}", render_report(&result)),
        Err(_) => {
            let message = orchestrator
                .state()
                .last_error
                .unwrap_or_else(|| GENERIC_SCAN_ERROR.to_string());
            return Err(message.into());
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = cli.apply(Config::from_env());

    let backend: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(Database::open(&config.database_path)?)
    };
    let history = HistoryStore::load_with_limit(backend, config.history_limit);

    if cli.command == Command::History {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(history.items())?);
        } else {
            print!("{}", render_history(history.items()));
        }
        return Ok(());
    }

    let oracle = Arc::new(GeminiOracle::from_config(&config)?);
    info!("Using model {}", oracle.model());
    let orchestrator = ScanOrchestrator::new(ScanClient::new(oracle), history);

    match cli.command {
        Command::Url { url } => scan(&orchestrator, ScanTarget::link(url), cli.json).await,
        Command::File { path, mime } => {
            let target = encode_file(&path, mime.as_deref(), config.max_file_bytes).await?;
            scan(&orchestrator, target, cli.json).await
        }
        Command::Serve { .. } => {
            let server = TerminalServer::new(
                config.terminal_port,
                Arc::new(orchestrator),
                config.max_file_bytes,
            );
            println!("Sentinel UI at http://127.0.0.1:{}", config.terminal_port);
            server.run().await?;
            Ok(())
        }
        Command::History => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let guard = init_logging();
    info!("Sentinel Scan starting...");

    let failed = match run(cli).await {
        Ok(()) => false,
        Err(e) => {
            eprintln!("{}", render_error(&e.to_string()));
            true
        }
    };

    // flush the log file before exiting
    drop(guard);
    if failed {
        std::process::exit(1);
    }
}

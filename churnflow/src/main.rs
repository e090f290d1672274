// churnflow/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "churnflow.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Setup Logging (Tracing)
    // CHURNFLOW_LOG=debug churnflow run ... to see the details
    let _guard = init_tracing(&cli.log_level, cli.command.project_dir());
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "churnflow starting");

    match cli.command {
        Commands::Run { project_dir, date } => commands::run::execute(project_dir, date).await,
        Commands::Ingest { project_dir, date } => {
            commands::ingest::execute(project_dir, date).await
        }
        Commands::Validate { project_dir, date } => commands::validate::execute(project_dir, date),
        Commands::Prepare { project_dir } => commands::prepare::execute(project_dir),
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}

/// Human-readable stderr plus a daily JSON file under `<project>/logs/`.
/// The returned guard flushes the file writer on drop.
fn init_tracing(level: &str, project_dir: &Path) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let log_dir = project_dir.join(LOG_DIR);
    let (json_layer, guard) = if std::fs::create_dir_all(&log_dir).is_ok() {
        let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new("debug"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

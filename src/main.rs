//! Main entry point for the application.
//!
//! This module loads environment variables and configuration, initializes
//! logging, opens the database, starts the chart worker and serves the API.

mod cli;

use chartaccess::analysis::SimulatedAnalyzer;
use chartaccess::api::server::launch_server;
use chartaccess::config::{self, AppConfig};
use chartaccess::core::{ChartWorker, TaskManager, WorkerContext};
use chartaccess::db::Database;
use chartaccess::errors::Error;
use chartaccess::utils;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main entry point that initializes and runs the application.
///
/// # Initialization steps:
/// 1. Parse CLI arguments
/// 2. Load environment variables
/// 3. Initialize logging system
/// 4. Load configuration
/// 5. Start the worker and the API server
#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let dotenv = dotenvy::dotenv();
    utils::init_logging(&cli.logging_level, cli.log_to_file);

    if let Err(e) = dotenv {
        warn!("Failed to load .env file: {}", e);
    }

    let mut app_config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        app_config.server.port = port;
    }

    match run(app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(app_config: AppConfig) -> Result<(), Error> {
    let database = Database::new(&app_config.database_path)?;
    let worker = Arc::new(ChartWorker::new());
    let manager = TaskManager::new(database.clone(), Arc::clone(&worker), &app_config);

    let seeded = manager.seed_system_templates()?;
    info!("System templates ready ({} new)", seeded);

    let analyzer = Arc::new(SimulatedAnalyzer::with_point_count(
        app_config.worker.point_count,
    ));
    let context = WorkerContext::new(database, analyzer)
        .with_slow_task_warning(app_config.worker.slow_task_warning()?);
    worker.start(context);

    info!(
        "Serving uploads from {} as {}/uploads",
        app_config.upload_folder.display(),
        app_config.public_base_url
    );
    launch_server(manager, &app_config.server).await
}

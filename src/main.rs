use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentiment_history::{
    classifier::HttpClassifier,
    cli::{execute_command, Cli},
    config::{Config, LogFormat},
    history::{Hydration, RecordStore},
    storage::SqliteStorage,
    AnalysisOrchestrator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Sentiment history starting");

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize classifier client
    let classifier = match HttpClassifier::new(&config.classifier, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.classifier.base_url, "Classifier client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize classifier client");
            return Err(e.into());
        }
    };

    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(classifier),
        RecordStore::new(Arc::new(storage), config.history.key.clone()),
    );

    if let Hydration::Unavailable { reason } = orchestrator.hydrate().await {
        warn!(reason = %reason, "Stored history unavailable; continuing with an empty history");
    }

    let result = execute_command(cli.command, &orchestrator).await;
    if result.exit_code == 0 {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

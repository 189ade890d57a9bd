//! gridfs2s3 - Main entry point

use std::process;
use std::sync::Arc;

use anyhow::Context;
use gridfs2s3::config::SourceConfig;
use gridfs2s3::source::GridFsSource;
use gridfs2s3::storage::S3Destination;
use gridfs2s3::{Cli, MigrationCoordinator};
use gridfs2s3_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    // Loads .env first so argument fallbacks and LOG_* see it
    let cli = Cli::load();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("gridfs2s3")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid logging configuration: {:#}", e);
            process::exit(2);
        }
    };

    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(&cli).await {
        error!(error = %format!("{:#}", e), "Migration failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let source_config = SourceConfig::from_env().context("Failed to read source settings")?;
    let config = cli.config(source_config);
    config.validate()?;

    let source = GridFsSource::connect(&config.source)
        .await
        .context("Failed to connect to the source store")?;
    let destination = S3Destination::connect(&config.destination)
        .await
        .context("Failed to connect to the destination store")?;

    let mut coordinator = MigrationCoordinator::new(
        source,
        Arc::new(destination),
        config.destination.key_builder(),
        config.migration,
    );

    let result = coordinator.run().await;
    coordinator.into_source().close().await;
    result.context("Migration aborted")?;

    Ok(())
}

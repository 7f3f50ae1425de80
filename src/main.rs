#![allow(missing_docs)]

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use catalog_sync_lib::commands::{self, Cli, CommandOutcome};
use catalog_sync_lib::infrastructure::config::{AppConfig, ConfigManager};
use catalog_sync_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use catalog_sync_lib::infrastructure::PrestashopClient;

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config()?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
        config
            .logging
            .module_filters
            .insert("catalog_sync_lib".to_string(), level.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> ExitCode {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {e:#}");
            return ExitCode::from(CommandOutcome::Failed.exit_code());
        }
    };

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("❌ Failed to initialize logging: {e:#}");
        return ExitCode::from(CommandOutcome::Failed.exit_code());
    }
    log_system_info();

    let client = match PrestashopClient::new(&config.api) {
        Ok(client) => client,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::from(CommandOutcome::Failed.exit_code());
        }
    };

    let cancel = CancellationToken::new();
    let work = commands::execute(&cli.command, &config, &client, &cancel);
    tokio::pin!(work);

    let result = tokio::select! {
        result = &mut work => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("🛑 Interrupted; stopping after the current item...");
            cancel.cancel();
            work.await
        }
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("❌ {:#}", e);
            CommandOutcome::Failed
        }
    };
    ExitCode::from(outcome.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(cli));
    // An abandoned stdin prompt leaves a blocking read behind.
    runtime.shutdown_timeout(Duration::from_millis(100));
    code
}

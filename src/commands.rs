//! Command-line commands
//!
//! One subcommand per import pass, plus `full` for the whole run and
//! `check` for a connection test.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::{
    AutoConfirm, CatalogCleaner, Confirm, FullImportOptions, ImportError, ImportPipeline,
    Reconciler,
};
use crate::domain::repositories::{RemoteResource, Resource};
use crate::infrastructure::config::AppConfig;

/// Idempotent catalog import into a PrestaShop webservice
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true, env = "CATALOG_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level override: error, warn, info, debug, trace
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Delete products, manufacturers, custom categories and features
    Clean(ConfirmArgs),

    /// Import the category tree
    ImportCategories,

    /// Import products with manufacturers and features
    ImportProducts,

    /// Set stock quantities and bring product images in line with disk
    SyncStockImages,

    /// Run clean, categories, products and stock/images in order
    Full(FullArgs),

    /// Test the connection and show catalog counts
    Check,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfirmArgs {
    /// Do not ask before deleting
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FullArgs {
    /// Keep existing shop data
    #[arg(long)]
    pub skip_clean: bool,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failed,
    Cancelled,
}

impl CommandOutcome {
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::Cancelled => 130,
        }
    }
}

/// Interactive confirmation on stdin. A pending prompt is abandoned, and
/// counts as declined, when the run is cancelled.
pub struct StdinConfirm {
    cancel: CancellationToken,
}

impl StdinConfirm {
    pub const fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

/// Answers that approve a deletion.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y" | "tak" | "t")
}

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&mut self, resource: Resource, count: usize) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "⚠️  Delete {} {}? (yes/no): ", count, resource);
        let _ = stderr.flush();

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                let _ = writeln!(stderr);
                false
            }
            read = stdin.read_line(&mut answer) => match read {
                Ok(_) => is_affirmative(&answer),
                Err(e) => {
                    warn!("Cannot read confirmation: {}", e);
                    false
                }
            },
        }
    }
}

fn confirmer(args: &ConfirmArgs, cancel: &CancellationToken) -> Box<dyn Confirm> {
    if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm::new(cancel.clone()))
    }
}

/// Run one command against `client`.
pub async fn execute(
    command: &Command,
    config: &AppConfig,
    client: &dyn RemoteResource,
    cancel: &CancellationToken,
) -> Result<CommandOutcome> {
    let pipeline = ImportPipeline::new(client, config);

    let result = match command {
        Command::Clean(args) => pipeline
            .clean(&mut *confirmer(args, cancel), cancel)
            .await
            .map(|summary| {
                info!("🧹 Clean: {}", summary);
                summary.interrupted
            }),
        Command::ImportCategories => {
            let mut reconciler = Reconciler::new(client);
            pipeline
                .import_categories(&mut reconciler, cancel)
                .await
                .map(|summary| summary.interrupted)
        }
        Command::ImportProducts => {
            let mut reconciler = Reconciler::new(client);
            pipeline
                .import_products(&mut reconciler, cancel)
                .await
                .map(|summary| summary.interrupted)
        }
        Command::SyncStockImages => pipeline
            .sync_stock_images(cancel)
            .await
            .map(|summary| summary.interrupted),
        Command::Full(args) => {
            let options = FullImportOptions {
                skip_clean: args.skip_clean,
            };
            let report = pipeline
                .run_full_import(options, &mut *confirmer(&args.confirm, cancel), cancel)
                .await;
            report.log();
            return Ok(if report.interrupted {
                CommandOutcome::Cancelled
            } else if report.succeeded() {
                CommandOutcome::Success
            } else {
                CommandOutcome::Failed
            });
        }
        Command::Check => return check(client).await,
    };

    Ok(match result {
        Ok(false) => CommandOutcome::Success,
        Ok(true) | Err(ImportError::Cancelled) => CommandOutcome::Cancelled,
        Err(e) => {
            error!("❌ {}", e);
            CommandOutcome::Failed
        }
    })
}

async fn check(client: &dyn RemoteResource) -> Result<CommandOutcome> {
    if let Err(e) = client.ping().await {
        error!("❌ Shop not reachable: {}", e);
        return Ok(CommandOutcome::Failed);
    }
    info!("✅ Connected to the shop webservice");

    let stats = CatalogCleaner::new(client)
        .stats()
        .await
        .context("Failed to count catalog entities")?;
    info!("📊 Catalog: {}", stats);
    Ok(CommandOutcome::Success)
}

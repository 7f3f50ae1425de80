//! Import passes and the full import run
//!
//! Wires configuration, inputs and the shop client into each pass and runs
//! them in their fixed order: clean, categories, products, stock/images.

#![allow(clippy::uninlined_format_args)]

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::catalog_cleaner::{CatalogCleaner, CleanSummary, Confirm};
use crate::application::category_importer::{CategoryImportSummary, CategoryImporter};
use crate::application::error::{ImportError, ImportResult};
use crate::application::input::{load_categories, load_products};
use crate::application::product_importer::{ProductImportSummary, ProductImporter};
use crate::application::reconciler::Reconciler;
use crate::application::stock_image_sync::{StockImageSummary, StockImageSync};
use crate::domain::entities::RemoteId;
use crate::domain::repositories::RemoteResource;
use crate::domain::services::{PayloadBuilder, ProductService};
use crate::infrastructure::config::{AppConfig, ImportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    Clean,
    Categories,
    Products,
    StockImages,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean",
            Self::Categories => "categories",
            Self::Products => "products",
            Self::StockImages => "stock/images",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Completed(String),
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
    pub duration: Duration,
    pub interrupted: bool,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        !self.interrupted
            && self
                .steps
                .iter()
                .all(|s| !matches!(s.status, StepStatus::Failed(_)))
    }

    /// Print the end-of-run table.
    pub fn log(&self) {
        info!("==================== Import summary ====================");
        for report in &self.steps {
            let secs = report.duration.as_secs_f64();
            match &report.status {
                StepStatus::Completed(details) => {
                    info!("✅ {:<13} {:>7.1}s  {}", report.step, secs, details);
                }
                StepStatus::Failed(reason) => {
                    error!("❌ {:<13} {:>7.1}s  {}", report.step, secs, reason);
                }
                StepStatus::Skipped => info!("⏭️ {:<13}   skipped", report.step),
            }
        }
        info!("Total time: {:.1}s", self.duration.as_secs_f64());
        if self.interrupted {
            warn!("⚠️ Import interrupted; re-run to continue");
        }
    }
}

/// Options of a full import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullImportOptions {
    pub skip_clean: bool,
}

fn ensure_running(cancel: &CancellationToken) -> ImportResult<()> {
    if cancel.is_cancelled() {
        Err(ImportError::Cancelled)
    } else {
        Ok(())
    }
}

pub struct ImportPipeline<'c> {
    client: &'c dyn RemoteResource,
    import: ImportConfig,
    payloads: PayloadBuilder,
    products: ProductService,
}

impl<'c> ImportPipeline<'c> {
    pub fn new(client: &'c dyn RemoteResource, config: &AppConfig) -> Self {
        let import = config.import.clone();
        Self {
            client,
            payloads: PayloadBuilder::new(
                config.api.language_id,
                import.tax_rules_group_id,
                import.shop_id,
            ),
            products: ProductService::new(import.tax_multiplier, import.short_description_chars),
            import,
        }
    }

    fn home_id(&self) -> RemoteId {
        RemoteId::new(self.import.home_category_id.trim())
    }

    pub async fn clean(
        &self,
        confirm: &mut dyn Confirm,
        cancel: &CancellationToken,
    ) -> ImportResult<CleanSummary> {
        ensure_running(cancel)?;
        CatalogCleaner::new(self.client).clean(confirm, cancel).await
    }

    pub async fn import_categories(
        &self,
        reconciler: &mut Reconciler<'c>,
        cancel: &CancellationToken,
    ) -> ImportResult<CategoryImportSummary> {
        ensure_running(cancel)?;
        let tree = load_categories(&self.import.categories_file).await?;
        let home_id = self.home_id();
        info!("🌳 Importing category tree under {}", home_id);
        let summary = CategoryImporter::new(reconciler, &self.payloads)
            .import_tree(&tree, &home_id, cancel)
            .await;
        info!("Categories: {}", summary);
        Ok(summary)
    }

    pub async fn import_products(
        &self,
        reconciler: &mut Reconciler<'c>,
        cancel: &CancellationToken,
    ) -> ImportResult<ProductImportSummary> {
        ensure_running(cancel)?;
        let records = load_products(&self.import.products_file).await?;
        info!("🛒 Importing {} products", records.len());
        let summary = ProductImporter::new(reconciler, &self.payloads, &self.products, self.home_id())
            .import_all(&records, cancel)
            .await;
        info!("Products: {}", summary);
        info!("Reconciliation: {}", reconciler.stats());
        Ok(summary)
    }

    pub async fn sync_stock_images(&self, cancel: &CancellationToken) -> ImportResult<StockImageSummary> {
        ensure_running(cancel)?;
        let records = load_products(&self.import.products_file).await?;
        let summary = StockImageSync::new(
            self.client,
            self.payloads,
            &self.import.images_dir,
            self.import.stock_min..=self.import.stock_max,
        )
        .run(&records, cancel)
        .await?;
        info!("Stock/images: {}", summary);
        Ok(summary)
    }

    /// Run every pass in order. A failed pass is recorded and the next one
    /// still runs; cancellation stops the run.
    pub async fn run_full_import(
        &self,
        options: FullImportOptions,
        confirm: &mut dyn Confirm,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let started = Instant::now();
        let mut report = PipelineReport::default();
        let mut reconciler = Reconciler::new(self.client);

        for step in [Step::Clean, Step::Categories, Step::Products, Step::StockImages] {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }
            if step == Step::Clean && options.skip_clean {
                report.steps.push(StepReport {
                    step,
                    status: StepStatus::Skipped,
                    duration: Duration::ZERO,
                });
                continue;
            }

            info!("▶️ Step: {}", step);
            let step_started = Instant::now();
            let result = match step {
                Step::Clean => self
                    .clean(confirm, cancel)
                    .await
                    .map(|s| (s.to_string(), s.interrupted)),
                Step::Categories => self
                    .import_categories(&mut reconciler, cancel)
                    .await
                    .map(|s| (s.to_string(), s.interrupted)),
                Step::Products => self
                    .import_products(&mut reconciler, cancel)
                    .await
                    .map(|s| (s.to_string(), s.interrupted)),
                Step::StockImages => self
                    .sync_stock_images(cancel)
                    .await
                    .map(|s| (s.to_string(), s.interrupted)),
            };

            let (status, interrupted) = match result {
                Ok((details, interrupted)) => (StepStatus::Completed(details), interrupted),
                Err(ImportError::Cancelled) => (StepStatus::Failed("cancelled".to_string()), true),
                Err(e) => {
                    error!("❌ Step {} failed: {}", step, e);
                    (StepStatus::Failed(e.to_string()), false)
                }
            };
            report.steps.push(StepReport {
                step,
                status,
                duration: step_started.elapsed(),
            });
            if interrupted {
                report.interrupted = true;
                break;
            }
        }

        report.duration = started.elapsed();
        report
    }
}

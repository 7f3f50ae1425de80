//! Application layer - import passes
//!
//! This module contains the reconciliation engine and the passes built on
//! it, coordinating domain logic against the shop webservice.

pub mod catalog_cleaner;
pub mod category_importer;
pub mod category_resolver;
pub mod error;
pub mod identity_cache;
pub mod import_pipeline;
pub mod input;
pub mod product_importer;
pub mod reconciler;
pub mod stock_image_sync;

// Re-export commonly used items
pub use catalog_cleaner::{AutoConfirm, CatalogCleaner, CatalogStats, CleanSummary, Confirm};
pub use category_importer::{CategoryImportSummary, CategoryImporter};
pub use category_resolver::resolve_category_path;
pub use error::{ImportError, ImportResult};
pub use identity_cache::IdentityCache;
pub use import_pipeline::{FullImportOptions, ImportPipeline, PipelineReport, Step, StepStatus};
pub use product_importer::{ProductImportSummary, ProductImporter, ProductOutcome, SkipReason};
pub use reconciler::{Origin, ReconcileStats, Reconciled, Reconciler};
pub use stock_image_sync::{ImagePlan, StockImageSummary, StockImageSync, plan_images};

//! Catalog Sync - idempotent catalog import into a PrestaShop webservice
//!
//! Scraped categories and products are reconciled against the shop by
//! natural key: whatever the shop already has is reused, everything else is
//! created exactly once, so every pass can be re-run safely.

// Module declarations
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

//! Scraped JSON inputs

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use crate::application::error::{ImportError, ImportResult};
use crate::domain::entities::{CategoryNode, ProductRecord};

async fn read_json<T: DeserializeOwned>(path: &Path) -> ImportResult<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ImportError::input(path, e))?;
    serde_json::from_str(&raw).map_err(|e| ImportError::input(path, e))
}

/// Category tree: `[{"name": …, "subcategories": […]}, …]`.
pub async fn load_categories(path: &Path) -> ImportResult<Vec<CategoryNode>> {
    let nodes: Vec<CategoryNode> = read_json(path).await?;
    info!("📂 Loaded {} top-level categories from {:?}", nodes.len(), path);
    Ok(nodes)
}

/// Product records with details.
pub async fn load_products(path: &Path) -> ImportResult<Vec<ProductRecord>> {
    let records: Vec<ProductRecord> = read_json(path).await?;
    info!("📂 Loaded {} product records from {:?}", records.len(), path);
    Ok(records)
}

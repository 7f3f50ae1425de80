//! Stock and image pass
//!
//! Runs after the product import and matches products by name. Every
//! product found in the shop gets a fresh stock quantity, and its image
//! count is brought in line with the images on disk: missing images are
//! uploaded, surplus ones deleted.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::error::{ImportError, ImportResult};
use crate::domain::constants::catalog;
use crate::domain::document::Element;
use crate::domain::entities::{ProductRecord, RemoteId};
use crate::domain::repositories::{RemoteResource, Resource};
use crate::domain::services::PayloadBuilder;
use crate::domain::value_objects::Query;
use crate::infrastructure::api_error::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockImageSummary {
    pub products_matched: usize,
    pub products_missing: usize,
    pub stock_updated: usize,
    pub stock_failed: usize,
    pub images_uploaded: usize,
    pub images_deleted: usize,
    pub image_failures: usize,
    /// Products whose remote image count already matched.
    pub products_in_sync: usize,
    pub interrupted: bool,
}

impl fmt::Display for StockImageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matched {}, missing {}, stock updated {} (failed {}), images uploaded {}, deleted {}, failed {}, in sync {}",
            self.products_matched,
            self.products_missing,
            self.stock_updated,
            self.stock_failed,
            self.images_uploaded,
            self.images_deleted,
            self.image_failures,
            self.products_in_sync
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

/// What to do with a product's remote images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlan {
    InSync,
    Upload(Vec<PathBuf>),
    Delete(Vec<RemoteId>),
}

/// Compare local images with remote image ids.
///
/// Surplus remote images are the highest-numbered ones; missing remote images
/// are the local tail beyond the remote count. No local images means the
/// product is left alone.
pub fn plan_images(local: &[PathBuf], remote: &[RemoteId]) -> ImagePlan {
    if local.is_empty() || local.len() == remote.len() {
        return ImagePlan::InSync;
    }
    if remote.len() > local.len() {
        let mut ids = remote.to_vec();
        ids.sort_by_key(|id| (id.as_number().unwrap_or(u64::MAX), id.as_str().to_string()));
        return ImagePlan::Delete(ids.split_off(local.len()));
    }
    ImagePlan::Upload(local[remote.len()..].to_vec())
}

/// First directory (by name) under `images_root` named `<source_id>_…`.
pub async fn find_image_dir(images_root: &Path, source_id: &str) -> Option<PathBuf> {
    let prefix = format!("{source_id}_");
    let mut entries = tokio::fs::read_dir(images_root).await.ok()?;
    let mut matches = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        if is_dir && name.starts_with(&prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    matches.into_iter().next()
}

/// Product images in upload order. The main image is optional on its own;
/// numbered images are taken until the first missing one.
pub async fn local_images(dir: &Path) -> Vec<PathBuf> {
    let Some((main, numbered)) = catalog::IMAGE_FILE_NAMES.split_first() else {
        return Vec::new();
    };
    let mut images = Vec::new();
    let main = dir.join(main);
    if tokio::fs::try_exists(&main).await.unwrap_or(false) {
        images.push(main);
    }
    for file_name in numbered {
        let path = dir.join(file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            break;
        }
        images.push(path);
    }
    images
}

pub struct StockImageSync<'c> {
    client: &'c dyn RemoteResource,
    payloads: PayloadBuilder,
    images_dir: PathBuf,
    stock_range: RangeInclusive<u32>,
    rng: fastrand::Rng,
}

impl<'c> StockImageSync<'c> {
    pub fn new(
        client: &'c dyn RemoteResource,
        payloads: PayloadBuilder,
        images_dir: impl Into<PathBuf>,
        stock_range: RangeInclusive<u32>,
    ) -> Self {
        Self {
            client,
            payloads,
            images_dir: images_dir.into(),
            stock_range,
            rng: fastrand::Rng::new(),
        }
    }

    /// Use a fixed seed for the generated stock quantities.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Name → id of every product in the shop. The first id wins when two
    /// products share a name.
    pub async fn product_index(&self) -> ApiResult<HashMap<String, RemoteId>> {
        let listing = self
            .client
            .get(Resource::Products, &Query::new().display_fields(&["id", "name"]))
            .await?;

        let mut index = HashMap::new();
        for product in listing.collection_items(Resource::Products.path(), Resource::Products.element()) {
            let (Some(id), Some(name)) = (
                product.entity_id(),
                product.find("name").and_then(Element::localized_text),
            ) else {
                continue;
            };
            if let Some(existing) = index.get(name) {
                warn!("⚠️ Duplicate product name '{}' ({} and {}), using {}", name, existing, id, existing);
                continue;
            }
            index.insert(name.to_string(), id);
        }
        Ok(index)
    }

    pub async fn run(
        &mut self,
        records: &[ProductRecord],
        cancel: &CancellationToken,
    ) -> ImportResult<StockImageSummary> {
        info!("🔍 Fetching product list from the shop...");
        let index = self.product_index().await.map_err(ImportError::Api)?;
        info!("Found {} products in the shop", index.len());

        let mut summary = StockImageSummary::default();
        for (position, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            let Some(name) = record.display_name() else {
                continue;
            };
            let Some(product_id) = index.get(name) else {
                debug!("[{}/{}] {} not in the shop, skipping", position + 1, records.len(), name);
                summary.products_missing += 1;
                continue;
            };

            info!("[{}/{}] 📦 {} ({})", position + 1, records.len(), name, product_id);
            summary.products_matched += 1;

            match self.update_stock(product_id).await {
                Ok(quantity) => {
                    summary.stock_updated += 1;
                    info!("  ✅ Stock set to {}", quantity);
                }
                Err(e) => {
                    summary.stock_failed += 1;
                    warn!("  ❌ Stock update failed: {}", e);
                }
            }

            if let Some(source_id) = record.source_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                self.sync_images(product_id, source_id, &mut summary).await;
            }
        }

        Ok(summary)
    }

    /// Put a new random quantity on the product's stock record.
    pub async fn update_stock(&mut self, product_id: &RemoteId) -> ApiResult<u32> {
        let listing = self
            .client
            .get(
                Resource::StockAvailables,
                &Query::new()
                    .filter("id_product", product_id.as_str())
                    .display_fields(&["id"]),
            )
            .await?;

        let stock_id = listing
            .collection_items(Resource::StockAvailables.path(), Resource::StockAvailables.element())
            .into_iter()
            .find_map(Element::entity_id)
            .ok_or_else(|| ApiError::missing_element(Resource::StockAvailables.element()))?;

        let quantity = self.rng.u32(self.stock_range.clone());
        self.client
            .update(
                Resource::StockAvailables,
                &stock_id,
                &self.payloads.stock(&stock_id, product_id, quantity),
            )
            .await?;
        Ok(quantity)
    }

    async fn sync_images(&self, product_id: &RemoteId, source_id: &str, summary: &mut StockImageSummary) {
        let Some(dir) = find_image_dir(&self.images_dir, source_id).await else {
            debug!("  No image directory for source id {}", source_id);
            return;
        };
        let local = local_images(&dir).await;
        if local.is_empty() {
            debug!("  No images in {:?}", dir);
            return;
        }

        let remote = match self.client.list_image_ids(product_id).await {
            Ok(ids) => ids,
            Err(e) => {
                summary.image_failures += 1;
                warn!("  ❌ Cannot list images: {}", e);
                return;
            }
        };

        match plan_images(&local, &remote) {
            ImagePlan::InSync => {
                summary.products_in_sync += 1;
                debug!("  Images in sync ({}/{})", remote.len(), local.len());
            }
            ImagePlan::Delete(surplus) => {
                info!("  🗑️ {} remote images, {} local: deleting {:?}", remote.len(), local.len(), surplus);
                for image_id in &surplus {
                    match self.client.delete_image(product_id, image_id).await {
                        Ok(()) => summary.images_deleted += 1,
                        Err(e) => {
                            summary.image_failures += 1;
                            warn!("  ❌ Deleting image {} failed: {}", image_id, e);
                        }
                    }
                }
            }
            ImagePlan::Upload(missing) => {
                info!("  🖼️ {} remote images, {} local: uploading {}", remote.len(), local.len(), missing.len());
                for path in &missing {
                    match self.client.upload_image(product_id, path).await {
                        Ok(()) => summary.images_uploaded += 1,
                        Err(e) => {
                            summary.image_failures += 1;
                            warn!("  ❌ Uploading {:?} failed: {}", path, e);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        catalog::IMAGE_FILE_NAMES[..n].iter().map(PathBuf::from).collect()
    }

    fn ids(values: &[&str]) -> Vec<RemoteId> {
        values.iter().map(|v| RemoteId::from(*v)).collect()
    }

    #[test]
    fn test_plan_upload_missing_tail() {
        assert_eq!(
            plan_images(&paths(3), &ids(&["40"])),
            ImagePlan::Upload(vec![PathBuf::from("product_2.jpg"), PathBuf::from("product_3.jpg")])
        );
    }

    #[test]
    fn test_plan_delete_highest_numbered() {
        assert_eq!(
            plan_images(&paths(2), &ids(&["100", "9", "31", "10"])),
            ImagePlan::Delete(ids(&["31", "100"]))
        );
    }

    #[test]
    fn test_plan_in_sync() {
        assert_eq!(plan_images(&paths(2), &ids(&["1", "2"])), ImagePlan::InSync);
        assert_eq!(plan_images(&[], &ids(&["1", "2"])), ImagePlan::InSync);
    }

    #[tokio::test]
    async fn test_local_images_stop_at_gap() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["product.jpg", "product_2.jpg", "product_4.jpg"] {
            std::fs::write(dir.path().join(name), b"jpg").unwrap();
        }
        let images = local_images(dir.path()).await;
        assert_eq!(images, vec![dir.path().join("product.jpg"), dir.path().join("product_2.jpg")]);
    }

    #[tokio::test]
    async fn test_local_images_without_main_image() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["product_2.jpg", "product_3.jpg"] {
            std::fs::write(dir.path().join(name), b"jpg").unwrap();
        }
        let images = local_images(dir.path()).await;
        assert_eq!(images, vec![dir.path().join("product_2.jpg"), dir.path().join("product_3.jpg")]);
    }

    #[tokio::test]
    async fn test_find_image_dir_by_prefix() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("123_klocki")).unwrap();
        std::fs::create_dir(root.path().join("1234_puzzle")).unwrap();
        std::fs::write(root.path().join("123_notes.txt"), b"").unwrap();

        assert_eq!(
            find_image_dir(root.path(), "123").await,
            Some(root.path().join("123_klocki"))
        );
        assert_eq!(find_image_dir(root.path(), "99").await, None);
    }
}

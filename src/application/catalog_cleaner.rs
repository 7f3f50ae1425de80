//! Catalog cleanup
//!
//! Deletes everything the import passes create, so a full import can start
//! from an empty shop. Root and Home categories always survive. Each kind of
//! entity needs its own confirmation.

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::error::{ImportError, ImportResult};
use crate::domain::constants::shop;
use crate::domain::document::Element;
use crate::domain::entities::RemoteId;
use crate::domain::repositories::{RemoteResource, Resource};
use crate::domain::value_objects::Query;
use crate::infrastructure::api_error::ApiResult;

/// Resource kinds in deletion order.
pub const CLEAN_ORDER: [Resource; 4] = [
    Resource::Products,
    Resource::Manufacturers,
    Resource::Categories,
    Resource::ProductFeatures,
];

/// Permission to delete `count` entities of one kind. An interactive
/// implementation must give up (answer `false`) once the run is cancelled.
#[async_trait]
pub trait Confirm: Send {
    async fn confirm(&mut self, resource: Resource, count: usize) -> bool;
}

/// Approves everything (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&mut self, _resource: Resource, _count: usize) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub declined: bool,
    pub listing_failed: bool,
}

impl fmt::Display for KindSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.listing_failed {
            f.write_str("listing failed")
        } else if self.declined {
            write!(f, "declined ({} kept)", self.total)
        } else {
            write!(f, "{}/{} deleted", self.deleted, self.total)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub products: KindSummary,
    pub manufacturers: KindSummary,
    pub categories: KindSummary,
    pub features: KindSummary,
    pub interrupted: bool,
}

impl CleanSummary {
    pub const fn kind(&self, resource: Resource) -> Option<&KindSummary> {
        match resource {
            Resource::Products => Some(&self.products),
            Resource::Manufacturers => Some(&self.manufacturers),
            Resource::Categories => Some(&self.categories),
            Resource::ProductFeatures => Some(&self.features),
            Resource::ProductFeatureValues | Resource::StockAvailables => None,
        }
    }

    fn kind_mut(&mut self, resource: Resource) -> Option<&mut KindSummary> {
        match resource {
            Resource::Products => Some(&mut self.products),
            Resource::Manufacturers => Some(&mut self.manufacturers),
            Resource::Categories => Some(&mut self.categories),
            Resource::ProductFeatures => Some(&mut self.features),
            Resource::ProductFeatureValues | Resource::StockAvailables => None,
        }
    }
}

impl fmt::Display for CleanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "products {}, manufacturers {}, categories {}, features {}",
            self.products, self.manufacturers, self.categories, self.features
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

/// Entity counts as the import passes see them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub products: usize,
    pub manufacturers: usize,
    /// Categories other than Root and Home.
    pub categories: usize,
    pub features: usize,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "products {}, manufacturers {}, categories {}, features {}",
            self.products, self.manufacturers, self.categories, self.features
        )
    }
}

/// Progress bar over the deletions of one kind.
fn delete_progress(resource: Resource, total: usize) -> ProgressBar {
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
    {
        bar.set_style(style.progress_chars("█▓▒░"));
    }
    bar.set_message(format!("Deleting {resource}"));
    bar
}

pub struct CatalogCleaner<'c> {
    client: &'c dyn RemoteResource,
}

impl<'c> CatalogCleaner<'c> {
    pub fn new(client: &'c dyn RemoteResource) -> Self {
        Self { client }
    }

    /// Delete all products, manufacturers, custom categories and features.
    /// Fails only when the shop is unreachable.
    pub async fn clean(
        &self,
        confirm: &mut dyn Confirm,
        cancel: &CancellationToken,
    ) -> ImportResult<CleanSummary> {
        self.client.ping().await.map_err(ImportError::Api)?;
        info!("🔗 Connected to the shop");

        let mut summary = CleanSummary::default();
        for resource in CLEAN_ORDER {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            let (kind, interrupted) = self.clean_kind(resource, confirm, cancel).await;
            if let Some(slot) = summary.kind_mut(resource) {
                *slot = kind;
            }
            if interrupted {
                summary.interrupted = true;
                break;
            }
        }

        Ok(summary)
    }

    /// Delete one kind of entity; the flag reports a cancellation mid-way.
    async fn clean_kind(
        &self,
        resource: Resource,
        confirm: &mut dyn Confirm,
        cancel: &CancellationToken,
    ) -> (KindSummary, bool) {
        let mut kind = KindSummary::default();

        info!("🧹 Cleaning {}", resource);
        let ids = match self.deletable_ids(resource).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("❌ Cannot list {}: {}", resource, e);
                kind.listing_failed = true;
                return (kind, false);
            }
        };
        kind.total = ids.len();
        if ids.is_empty() {
            info!("ℹ️ No {} to delete", resource);
            return (kind, false);
        }
        if cancel.is_cancelled() {
            return (kind, true);
        }
        let approved = confirm.confirm(resource, ids.len()).await;
        if cancel.is_cancelled() {
            return (kind, true);
        }
        if !approved {
            info!("⏭️ Skipped deleting {} {}", ids.len(), resource);
            kind.declined = true;
            return (kind, false);
        }

        let progress = delete_progress(resource, ids.len());
        for id in &ids {
            if cancel.is_cancelled() {
                progress.abandon();
                return (kind, true);
            }
            match self.client.delete(resource, id).await {
                Ok(()) => {
                    kind.deleted += 1;
                    debug!("🗑️ Deleted {} {}", resource.element(), id);
                }
                Err(e) => {
                    kind.failed += 1;
                    progress.suspend(|| warn!("❌ Deleting {} {} failed: {}", resource.element(), id, e));
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!("✅ Deleted {}/{} {}", kind.deleted, kind.total, resource);
        (kind, false)
    }

    /// Ids the cleanup would delete for `resource`, in deletion order.
    /// Categories come highest id first so children go before parents.
    pub async fn deletable_ids(&self, resource: Resource) -> ApiResult<Vec<RemoteId>> {
        let listing = self.client.get(resource, &Query::new()).await?;
        let mut ids: Vec<RemoteId> = listing
            .collection_items(resource.path(), resource.element())
            .into_iter()
            .filter_map(Element::entity_id)
            .collect();

        if resource == Resource::Categories {
            ids.retain(|id| id.as_number().is_some_and(|n| n > shop::PROTECTED_CATEGORY_MAX_ID));
            ids.sort_by_key(|id| std::cmp::Reverse(id.as_number()));
        }
        Ok(ids)
    }

    pub async fn stats(&self) -> ApiResult<CatalogStats> {
        Ok(CatalogStats {
            products: self.deletable_ids(Resource::Products).await?.len(),
            manufacturers: self.deletable_ids(Resource::Manufacturers).await?.len(),
            categories: self.deletable_ids(Resource::Categories).await?.len(),
            features: self.deletable_ids(Resource::ProductFeatures).await?.len(),
        })
    }
}

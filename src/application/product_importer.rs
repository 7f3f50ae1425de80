//! Product import
//!
//! Each scraped record becomes one shop product together with what it
//! depends on: its manufacturer, its category path and one feature value
//! per attribute. Products are only ever created; a name the shop already
//! knows is skipped.

use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::category_resolver::resolve_category_path;
use crate::application::reconciler::Reconciler;
use crate::domain::entities::{NaturalKey, ProductDraft, ProductRecord, RemoteId};
use crate::domain::repositories::Resource;
use crate::domain::services::{PayloadBuilder, ProductService, slugify};
use crate::domain::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingDetails,
    AlreadyExists(RemoteId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("record has no name"),
            Self::MissingDetails => f.write_str("record has no details"),
            Self::AlreadyExists(id) => write!(f, "already exists as {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOutcome {
    Created(RemoteId),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductImportSummary {
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub interrupted: bool,
}

impl ProductImportSummary {
    fn record(&mut self, outcome: &ProductOutcome) {
        match outcome {
            ProductOutcome::Created(_) => self.created += 1,
            ProductOutcome::Skipped(_) => self.skipped += 1,
            ProductOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for ProductImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: created {}, skipped {}, failed {}",
            self.total, self.created, self.skipped, self.failed
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

pub struct ProductImporter<'r, 'c> {
    reconciler: &'r mut Reconciler<'c>,
    payloads: &'r PayloadBuilder,
    products: &'r ProductService,
    default_category_id: RemoteId,
}

impl<'r, 'c> ProductImporter<'r, 'c> {
    pub fn new(
        reconciler: &'r mut Reconciler<'c>,
        payloads: &'r PayloadBuilder,
        products: &'r ProductService,
        default_category_id: RemoteId,
    ) -> Self {
        Self {
            reconciler,
            payloads,
            products,
            default_category_id,
        }
    }

    /// Import every record in order, stopping between records when cancelled.
    pub async fn import_all(
        &mut self,
        records: &[ProductRecord],
        cancel: &CancellationToken,
    ) -> ProductImportSummary {
        let mut summary = ProductImportSummary {
            total: records.len(),
            ..ProductImportSummary::default()
        };

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let label = record.display_name().unwrap_or("<unnamed>");
            let outcome = self.import_product(record).await;
            match &outcome {
                ProductOutcome::Created(id) => {
                    info!("[{}/{}] ✅ {} -> created {}", index + 1, records.len(), label, id);
                }
                ProductOutcome::Skipped(reason) => {
                    info!("[{}/{}] ⏭️ {}: {}", index + 1, records.len(), label, reason);
                }
                ProductOutcome::Failed(reason) => {
                    warn!("[{}/{}] ❌ {}: {}", index + 1, records.len(), label, reason);
                }
            }
            summary.record(&outcome);
        }

        summary
    }

    pub async fn import_product(&mut self, record: &ProductRecord) -> ProductOutcome {
        let Some(name) = record.display_name() else {
            return ProductOutcome::Skipped(SkipReason::MissingName);
        };
        let Some(details) = record.usable_details() else {
            return ProductOutcome::Skipped(SkipReason::MissingDetails);
        };

        let product_key = NaturalKey::product(name);
        match self.reconciler.find(&product_key).await {
            Ok(Some(id)) => return ProductOutcome::Skipped(SkipReason::AlreadyExists(id)),
            Ok(None) => {}
            Err(e) => return ProductOutcome::Failed(format!("product lookup failed: {e}")),
        }

        let manufacturer_id = match details.brand_name() {
            Some(brand) => self.manufacturer(brand).await,
            None => None,
        };

        let path = resolve_category_path(
            self.reconciler,
            record.category_path.as_deref(),
            &self.default_category_id,
        )
        .await;

        let attributes = details.attribute_pairs();
        let mut features = Vec::with_capacity(attributes.len());
        for (feature_name, value) in &attributes {
            if let Some(pair) = self.feature_pair(feature_name, value).await {
                features.push(pair);
            }
        }

        let description = self
            .products
            .description(details.description.as_deref(), &attributes);
        let draft = ProductDraft {
            name: name.to_string(),
            slug: slugify(name),
            short_description: self.products.short_description(&description),
            description,
            manufacturer_id,
            default_category_id: path.terminal_id.clone(),
            category_ids: path.ancestor_ids,
            price: self.products.net_price(details.price.as_deref()),
            features,
        };

        let response = match self
            .reconciler
            .client()
            .create(Resource::Products, &self.payloads.product(&draft))
            .await
        {
            Ok(response) => response,
            Err(e) => return ProductOutcome::Failed(format!("create failed: {e}")),
        };

        match response
            .single_item(Resource::Products.element())
            .and_then(Element::entity_id)
        {
            Some(id) => {
                self.reconciler.remember(product_key, id.clone());
                ProductOutcome::Created(id)
            }
            None => ProductOutcome::Failed("create response carries no product id".to_string()),
        }
    }

    async fn manufacturer(&mut self, brand: &str) -> Option<RemoteId> {
        let payloads = self.payloads;
        match self
            .reconciler
            .reconcile(NaturalKey::manufacturer(brand), || payloads.manufacturer(brand))
            .await
        {
            Ok(reconciled) => Some(reconciled.id),
            Err(e) => {
                warn!("⚠️ Manufacturer '{}' unavailable, importing without it: {}", brand, e);
                None
            }
        }
    }

    async fn feature_pair(&mut self, feature_name: &str, value: &str) -> Option<(RemoteId, RemoteId)> {
        let payloads = self.payloads;
        let feature_id = match self
            .reconciler
            .reconcile(NaturalKey::feature(feature_name), || payloads.feature(feature_name))
            .await
        {
            Ok(reconciled) => reconciled.id,
            Err(e) => {
                warn!("⚠️ Feature '{}' unavailable, dropping '{}': {}", feature_name, value, e);
                return None;
            }
        };

        match self
            .reconciler
            .reconcile(NaturalKey::feature_value(&feature_id, value), || {
                payloads.feature_value(&feature_id, value)
            })
            .await
        {
            Ok(reconciled) => Some((feature_id, reconciled.id)),
            Err(e) => {
                warn!("⚠️ Value '{}' of feature '{}' unavailable: {}", value, feature_name, e);
                None
            }
        }
    }
}

//! Repository interfaces for the shop webservice
//!
//! The import passes only talk to the shop through [`RemoteResource`], so the
//! reconciliation logic can be exercised against an in-memory shop in tests.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

use crate::domain::document::Element;
use crate::domain::entities::RemoteId;
use crate::domain::value_objects::Query;
use crate::infrastructure::api_error::ApiResult;

/// Webservice resources touched by the import passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Categories,
    Manufacturers,
    ProductFeatures,
    ProductFeatureValues,
    Products,
    StockAvailables,
}

impl Resource {
    /// URL path segment and listing element name (`categories`).
    pub const fn path(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Manufacturers => "manufacturers",
            Self::ProductFeatures => "product_features",
            Self::ProductFeatureValues => "product_feature_values",
            Self::Products => "products",
            Self::StockAvailables => "stock_availables",
        }
    }

    /// Element name of a single entity (`category`).
    pub const fn element(self) -> &'static str {
        match self {
            Self::Categories => "category",
            Self::Manufacturers => "manufacturer",
            Self::ProductFeatures => "product_feature",
            Self::ProductFeatureValues => "product_feature_value",
            Self::Products => "product",
            Self::StockAvailables => "stock_available",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[async_trait]
pub trait RemoteResource: Send + Sync {
    // Generic resource access. Entities passed to `create`/`update` are
    // wrapped in the document root by the implementation.
    async fn get(&self, resource: Resource, query: &Query) -> ApiResult<Element>;
    async fn create(&self, resource: Resource, document: &Element) -> ApiResult<Element>;
    async fn update(&self, resource: Resource, id: &RemoteId, document: &Element) -> ApiResult<()>;
    async fn delete(&self, resource: Resource, id: &RemoteId) -> ApiResult<()>;

    // Product images
    async fn list_image_ids(&self, product_id: &RemoteId) -> ApiResult<Vec<RemoteId>>;
    async fn upload_image(&self, product_id: &RemoteId, image_path: &Path) -> ApiResult<()>;
    async fn delete_image(&self, product_id: &RemoteId, image_id: &RemoteId) -> ApiResult<()>;

    // Connectivity
    async fn ping(&self) -> ApiResult<()>;
}

//! Domain entities
//!
//! Natural keys, remote identifiers and the scraped records the import
//! passes consume.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::domain::repositories::Resource;
use crate::domain::value_objects::Query;

/// Identifier assigned by the shop on creation. Opaque and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, when the shop uses integer ids (it always does in practice).
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RemoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields that identify one remote entity from the source catalog's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Category { name: String, parent_id: RemoteId },
    Manufacturer { name: String },
    Feature { name: String },
    FeatureValue { feature_id: RemoteId, value: String },
    Product { name: String },
}

impl NaturalKey {
    pub fn category(name: impl Into<String>, parent_id: &RemoteId) -> Self {
        Self::Category {
            name: name.into(),
            parent_id: parent_id.clone(),
        }
    }

    pub fn manufacturer(name: impl Into<String>) -> Self {
        Self::Manufacturer { name: name.into() }
    }

    pub fn feature(name: impl Into<String>) -> Self {
        Self::Feature { name: name.into() }
    }

    pub fn feature_value(feature_id: &RemoteId, value: impl Into<String>) -> Self {
        Self::FeatureValue {
            feature_id: feature_id.clone(),
            value: value.into(),
        }
    }

    pub fn product(name: impl Into<String>) -> Self {
        Self::Product { name: name.into() }
    }

    pub const fn resource(&self) -> Resource {
        match self {
            Self::Category { .. } => Resource::Categories,
            Self::Manufacturer { .. } => Resource::Manufacturers,
            Self::Feature { .. } => Resource::ProductFeatures,
            Self::FeatureValue { .. } => Resource::ProductFeatureValues,
            Self::Product { .. } => Resource::Products,
        }
    }

    /// Exact-match query that finds the entity this key describes.
    pub fn lookup_query(&self) -> Query {
        let query = match self {
            Self::Category { name, parent_id } => Query::new()
                .filter("name", name)
                .filter("id_parent", parent_id.as_str()),
            Self::Manufacturer { name } | Self::Feature { name } | Self::Product { name } => {
                Query::new().filter("name", name)
            }
            Self::FeatureValue { feature_id, value } => Query::new()
                .filter("id_feature", feature_id.as_str())
                .filter("value", value),
        };
        query.display_full()
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category { name, parent_id } => write!(f, "category '{name}' (parent {parent_id})"),
            Self::Manufacturer { name } => write!(f, "manufacturer '{name}'"),
            Self::Feature { name } => write!(f, "feature '{name}'"),
            Self::FeatureValue { feature_id, value } => {
                write!(f, "feature value '{value}' (feature {feature_id})")
            }
            Self::Product { name } => write!(f, "product '{name}'"),
        }
    }
}

/// Node of the scraped category tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(name: impl Into<String>, subcategories: Vec<Self>) -> Self {
        Self {
            name: Some(name.into()),
            subcategories,
        }
    }

    /// Trimmed name; `None` for nodes that must be skipped.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// One scraped product as written by the product detail scraper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "nazwa", default)]
    pub name: Option<String>,
    #[serde(rename = "id_produktu", default, deserialize_with = "string_or_number")]
    pub source_id: Option<String>,
    #[serde(rename = "kategoria_pelna_sciezka", default)]
    pub category_path: Option<String>,
    #[serde(rename = "szczegoly_produktu", default)]
    pub details: Option<ProductDetails>,
}

impl ProductRecord {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Details, when the scraper managed to collect any.
    pub fn usable_details(&self) -> Option<&ProductDetails> {
        self.details.as_ref().filter(|d| !d.is_empty())
    }
}

/// Detail-page data of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDetails {
    #[serde(rename = "cena", default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(rename = "opis", default)]
    pub description: Option<String>,
    #[serde(rename = "marka", default)]
    pub brand: Option<String>,
    /// Attribute table in page order ("Kraj pochodzenia" → "Polska").
    #[serde(rename = "szczegoly", default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "zdjecia", default)]
    pub image_urls: Vec<String>,
}

impl ProductDetails {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.description.is_none()
            && self.brand.is_none()
            && self.attributes.is_empty()
            && self.image_urls.is_empty()
    }

    /// Brand name, `None` when absent or blank.
    pub fn brand_name(&self) -> Option<&str> {
        self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// Attribute pairs with a non-empty value, in page order.
    pub fn attribute_pairs(&self) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (!text.is_empty() && !key.trim().is_empty()).then(|| (key.trim().to_string(), text))
            })
            .collect()
    }
}

/// Result of walking a category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath {
    /// Last successfully resolved segment (or the default category).
    pub terminal_id: RemoteId,
    /// Default category plus every resolved segment, first-seen order, no duplicates.
    pub ancestor_ids: Vec<RemoteId>,
    /// Segment the walk stopped at, if it could not be resolved.
    pub unresolved_segment: Option<String>,
}

impl CategoryPath {
    pub fn default_only(default_id: &RemoteId) -> Self {
        Self {
            terminal_id: default_id.clone(),
            ancestor_ids: vec![default_id.clone()],
            unresolved_segment: None,
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.unresolved_segment.is_none()
    }
}

/// Everything needed to build a product creation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub manufacturer_id: Option<RemoteId>,
    pub default_category_id: RemoteId,
    pub category_ids: Vec<RemoteId>,
    /// Net price, two decimals.
    pub price: String,
    /// (feature id, feature value id) pairs.
    pub features: Vec<(RemoteId, RemoteId)>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_record_from_scraper_json() {
        let record: ProductRecord = serde_json::from_value(json!({
            "nazwa": "Klocki drewniane",
            "id_produktu": 1042,
            "kategoria_pelna_sciezka": "Zabawki/Klocki",
            "szczegoly_produktu": {
                "cena": "31,00 zł",
                "opis": "Opis",
                "marka": "Woody",
                "szczegoly": {"Kraj pochodzenia": "Polska", "Wiek": "", "Materiał": "drewno"}
            }
        }))
        .unwrap();

        assert_eq!(record.display_name(), Some("Klocki drewniane"));
        assert_eq!(record.source_id.as_deref(), Some("1042"));
        let details = record.usable_details().unwrap();
        assert_eq!(details.brand_name(), Some("Woody"));
        assert_eq!(
            details.attribute_pairs(),
            vec![
                ("Kraj pochodzenia".to_string(), "Polska".to_string()),
                ("Materiał".to_string(), "drewno".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_details_are_not_usable() {
        let record: ProductRecord =
            serde_json::from_value(json!({"nazwa": "X", "szczegoly_produktu": {}})).unwrap();
        assert!(record.usable_details().is_none());
    }

    #[test]
    fn test_category_key_lookup_query() {
        let key = NaturalKey::category("Klocki", &RemoteId::from("7"));
        assert_eq!(key.resource(), Resource::Categories);
        assert_eq!(
            key.lookup_query().to_params(),
            vec![
                ("filter[name]".to_string(), "Klocki".to_string()),
                ("filter[id_parent]".to_string(), "7".to_string()),
                ("display".to_string(), "full".to_string()),
            ]
        );
    }

    #[test]
    fn test_category_node_blank_name() {
        let node: CategoryNode = serde_json::from_value(json!({"name": "  ", "subcategories": []})).unwrap();
        assert!(node.display_name().is_none());
    }
}

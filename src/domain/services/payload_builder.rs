//! Creation and update payloads for webservice entities.
//!
//! Builders return the entity element only; the client wraps it with
//! [`Element::document`] right before sending.

use crate::domain::document::Element;
use crate::domain::entities::{ProductDraft, RemoteId};
use crate::domain::services::slug::slugify;

/// Builds entity payloads for one shop language.
#[derive(Debug, Clone, Copy)]
pub struct PayloadBuilder {
    language_id: u32,
    tax_rules_group_id: u32,
    shop_id: u32,
}

impl PayloadBuilder {
    pub const fn new(language_id: u32, tax_rules_group_id: u32, shop_id: u32) -> Self {
        Self {
            language_id,
            tax_rules_group_id,
            shop_id,
        }
    }

    pub fn category(&self, name: &str, parent_id: &RemoteId) -> Element {
        Element::new("category")
            .child(Element::with_text("active", "1"))
            .child(Element::with_text("id_parent", parent_id.as_str()))
            .child(Element::localized("name", self.language_id, name))
            .child(Element::localized("link_rewrite", self.language_id, slugify(name)))
    }

    pub fn manufacturer(&self, name: &str) -> Element {
        Element::new("manufacturer")
            .child(Element::with_text("active", "1"))
            .child(Element::with_text("name", name))
    }

    pub fn feature(&self, name: &str) -> Element {
        Element::new("product_feature").child(Element::localized("name", self.language_id, name))
    }

    pub fn feature_value(&self, feature_id: &RemoteId, value: &str) -> Element {
        Element::new("product_feature_value")
            .child(Element::with_text("id_feature", feature_id.as_str()))
            .child(Element::localized("value", self.language_id, value))
    }

    pub fn product(&self, draft: &ProductDraft) -> Element {
        let lang = self.language_id;
        let mut product = Element::new("product")
            .child(Element::localized("name", lang, &draft.name))
            .child(Element::localized("link_rewrite", lang, &draft.slug))
            .child(Element::localized("description", lang, &draft.description))
            .child(Element::localized("description_short", lang, &draft.short_description));

        if let Some(manufacturer_id) = &draft.manufacturer_id {
            product.push(Element::with_text("id_manufacturer", manufacturer_id.as_str()));
        }

        let categories = draft.category_ids.iter().map(|id| {
            Element::new("category").child(Element::with_text("id", id.as_str()))
        });
        let features = draft.features.iter().map(|(feature_id, value_id)| {
            Element::new("product_feature")
                .child(Element::with_text("id", feature_id.as_str()))
                .child(Element::with_text("id_feature_value", value_id.as_str()))
        });

        product
            .child(Element::with_text("id_category_default", draft.default_category_id.as_str()))
            .child(Element::with_text("price", &draft.price))
            .child(Element::with_text("id_tax_rules_group", self.tax_rules_group_id.to_string()))
            .child(Element::with_text("active", "1"))
            .child(Element::with_text("available_for_order", "1"))
            .child(Element::with_text("show_price", "1"))
            .child(Element::with_text("state", "1"))
            .child(Element::with_text("minimal_quantity", "1"))
            .child(Element::with_text("id_shop_default", self.shop_id.to_string()))
            .child(
                Element::new("associations")
                    .child(Element::new("categories").children(categories))
                    .child(Element::new("product_features").children(features)),
            )
    }

    /// Stock record of a simple product (no combinations).
    pub fn stock(&self, stock_id: &RemoteId, product_id: &RemoteId, quantity: u32) -> Element {
        Element::new("stock_available")
            .child(Element::with_text("id", stock_id.as_str()))
            .child(Element::with_text("id_product", product_id.as_str()))
            .child(Element::with_text("id_product_attribute", "0"))
            .child(Element::with_text("id_shop", self.shop_id.to_string()))
            .child(Element::with_text("quantity", quantity.to_string()))
            .child(Element::with_text("depends_on_stock", "0"))
            .child(Element::with_text("out_of_stock", "2"))
    }
}

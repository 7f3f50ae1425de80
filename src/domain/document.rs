//! Webservice document model
//!
//! PrestaShop exchanges XML documents rooted at `<prestashop>`. This module
//! holds the tree representation shared by the client, the reconciler and
//! the payload builders. Parsing and serialization live in
//! `infrastructure::xml_codec`.

use crate::domain::constants::shop;
use crate::domain::entities::RemoteId;

/// One XML element: name, attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element holding only text, e.g. `<active>1</active>`.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Localized field: `<name><language id="1">text</language></name>`.
    pub fn localized(name: impl Into<String>, language_id: u32, text: impl Into<String>) -> Self {
        Self::new(name).child(Self::with_text("language", text).attr("id", language_id.to_string()))
    }

    /// Wrap an entity in the `<prestashop>` document root.
    pub fn document(entity: Self) -> Self {
        Self::new(shop::DOCUMENT_ROOT)
            .attr("xmlns:xlink", shop::XLINK_NAMESPACE)
            .child(entity)
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content, `None` when absent or blank.
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of a direct child, e.g. `product.child_text("price")`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Self::text_content)
    }

    /// Text of a localized field: the first `<language>` child when present,
    /// otherwise the element's own text.
    pub fn localized_text(&self) -> Option<&str> {
        self.find("language")
            .and_then(Self::text_content)
            .or_else(|| self.text_content())
    }

    /// Identifier of an entity element. Full listings carry it as an `<id>`
    /// child, short listings as an `id` attribute.
    pub fn entity_id(&self) -> Option<RemoteId> {
        self.child_text("id")
            .or_else(|| self.attribute("id").map(str::trim).filter(|v| !v.is_empty()))
            .map(RemoteId::from)
    }

    /// Entities of a listing response: `<prestashop><categories><category/>…`.
    /// Only direct children of the collection element are returned, so nested
    /// association entries with the same element name are never mistaken for
    /// matches.
    pub fn collection_items<'a>(&'a self, collection: &'a str, item: &'a str) -> Vec<&'a Self> {
        let container = if self.name == collection {
            Some(self)
        } else {
            self.find(collection)
        };
        container
            .map(|c| c.find_all(item).collect())
            .unwrap_or_default()
    }

    /// Entity returned by a create call: `<prestashop><category><id>…`.
    pub fn single_item(&self, item: &str) -> Option<&Self> {
        if self.name == item {
            Some(self)
        } else {
            self.find(item)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Element {
        Element::new("prestashop").child(
            Element::new("categories")
                .child(
                    Element::new("category")
                        .child(Element::with_text("id", "12"))
                        .child(Element::localized("name", 1, "Klocki"))
                        .child(
                            Element::new("associations").child(
                                Element::new("categories")
                                    .child(Element::new("category").child(Element::with_text("id", "99"))),
                            ),
                        ),
                )
                .child(Element::new("category").attr("id", "13")),
        )
    }

    #[test]
    fn test_collection_items_ignores_nested_associations() {
        let doc = listing();
        let ids: Vec<String> = doc
            .collection_items("categories", "category")
            .into_iter()
            .filter_map(Element::entity_id)
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["12", "13"]);
    }

    #[test]
    fn test_localized_text_prefers_language_child() {
        let name = Element::localized("name", 1, "  Klocki ");
        assert_eq!(name.localized_text(), Some("Klocki"));
        assert_eq!(Element::with_text("name", "Plain").localized_text(), Some("Plain"));
        assert_eq!(Element::new("name").localized_text(), None);
    }

    #[test]
    fn test_document_wraps_entity() {
        let doc = Element::document(Element::new("manufacturer"));
        assert_eq!(doc.name, "prestashop");
        assert_eq!(doc.attribute("xmlns:xlink"), Some(shop::XLINK_NAMESPACE));
        assert!(doc.single_item("manufacturer").is_some());
    }

    #[test]
    fn test_entity_id_blank_is_none() {
        assert!(Element::with_text("id", "  ").entity_id().is_none());
        assert!(Element::new("product").child(Element::with_text("id", " ")).entity_id().is_none());
    }
}

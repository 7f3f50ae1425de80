//! # Domain Value Objects
//!
//! Immutable value types describing how the webservice is queried.

/// Which fields a listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display {
    /// `display=full`: every field of every entity.
    Full,
    /// `display=[id,name]`: the listed fields only.
    Fields(Vec<String>),
}

impl Display {
    fn to_param(&self) -> String {
        match self {
            Self::Full => "full".to_string(),
            Self::Fields(fields) => format!("[{}]", fields.join(",")),
        }
    }
}

/// Listing query: exact-match filters plus the display mode.
///
/// Filter values are sent verbatim (`filter[name]=Klocki`), which the
/// webservice treats as an equality match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    display: Option<Display>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn display_full(mut self) -> Self {
        self.display = Some(Display::Full);
        self
    }

    #[must_use]
    pub fn display_fields(mut self, fields: &[&str]) -> Self {
        self.display = Some(Display::Fields(
            fields.iter().map(|f| (*f).to_string()).collect(),
        ));
        self
    }

    /// Filters as (field, value) pairs, without the `filter[...]` wrapping.
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub const fn display(&self) -> Option<&Display> {
        self.display.as_ref()
    }

    /// Query-string parameters in request order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(field, value)| (format!("filter[{field}]"), value.clone()))
            .collect();
        if let Some(display) = &self.display {
            params.push(("display".to_string(), display.to_param()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_has_no_params() {
        assert!(Query::new().to_params().is_empty());
    }

    #[test]
    fn test_display_fields_param() {
        let params = Query::new()
            .filter("id_product", "15")
            .display_fields(&["id"])
            .to_params();
        assert_eq!(
            params,
            vec![
                ("filter[id_product]".to_string(), "15".to_string()),
                ("display".to_string(), "[id]".to_string()),
            ]
        );
    }

    #[test]
    fn test_display_id_and_name() {
        let query = Query::new().display_fields(&["id", "name"]);
        assert_eq!(query.display(), Some(&Display::Fields(vec!["id".into(), "name".into()])));
        assert_eq!(query.to_params()[0].1, "[id,name]");
    }
}

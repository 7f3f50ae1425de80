//! Product domain service
//!
//! Pure transformations from scraped product text to shop field values:
//! net price, HTML description and the short description.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::constants::catalog;

lazy_static! {
    /// Capitalised lead-in directly followed by a line break and a lower-case word.
    static ref LEAD_IN: Regex =
        Regex::new(r"([A-ZĄĆĘŁŃÓŚŹŻ][a-ząćęłńóśźż\s]+)\n([a-ząćęłńóśźż])").unwrap();
    /// Lower-case letter or period right before a bolded lead-in.
    static ref BREAK_BEFORE_BOLD: Regex = Regex::new(r"([a-ząćęłńóśźż.]) <strong>").unwrap();
    static ref NOT_PRICE_CHAR: Regex = Regex::new(r"[^\d.]").unwrap();
}

const PARAGRAPH_MARKER: &str = "|||PARAGRAPH|||";

/// Product domain service
#[derive(Debug, Clone)]
pub struct ProductService {
    tax_multiplier: f64,
    short_description_chars: usize,
}

impl ProductService {
    pub const fn new(tax_multiplier: f64, short_description_chars: usize) -> Self {
        Self {
            tax_multiplier,
            short_description_chars,
        }
    }

    /// Net price from a scraped gross price: `"31,00 zł"` → `"25.20"`.
    pub fn net_price(&self, gross_text: Option<&str>) -> String {
        let gross = parse_gross_price(gross_text.unwrap_or_default());
        if self.tax_multiplier <= 0.0 {
            return format!("{gross:.2}");
        }
        format!("{:.2}", gross / self.tax_multiplier)
    }

    /// Full HTML description: formatted narrative plus the attribute list.
    pub fn description(&self, text: Option<&str>, attributes: &[(String, String)]) -> String {
        let mut html = format_description(text.unwrap_or_default());
        if !attributes.is_empty() {
            html.push_str(&attributes_list(attributes));
        }
        html
    }

    /// First characters of the full description.
    pub fn short_description(&self, description: &str) -> String {
        description.chars().take(self.short_description_chars).collect()
    }
}

/// Gross price as a number. Currency symbols and spaces are dropped and a
/// decimal comma becomes a point; anything unparseable is zero.
pub fn parse_gross_price(text: &str) -> f64 {
    let normalized = text.replace(',', ".");
    let digits = NOT_PRICE_CHAR.replace_all(&normalized, "");
    digits
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0)
}

/// Free text to HTML paragraphs.
///
/// Blank lines separate paragraphs and single line breaks become spaces. A
/// capitalised line that runs straight into a lower-case line is treated as a
/// heading and bolded; every bolded heading after the first sentence starts on
/// its own line.
pub fn format_description(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = LEAD_IN.replace_all(text, "<strong>${1}</strong>\n${2}");
    let text = text
        .replace("\n\n", PARAGRAPH_MARKER)
        .replace('\n', " ")
        .replace(PARAGRAPH_MARKER, "</p><p>");
    let text = BREAK_BEFORE_BOLD.replace_all(&text, "${1}<br><strong>");
    format!("<p>{text}</p>")
}

/// Attribute pairs as a definition-style list under a heading.
pub fn attributes_list(attributes: &[(String, String)]) -> String {
    let mut html = format!("\n<h3>{}</h3>\n<ul>\n", catalog::ATTRIBUTES_HEADING);
    for (key, value) in attributes {
        html.push_str(&format!("<li><strong>{key}:</strong> {value}</li>\n"));
    }
    html.push_str("</ul>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn service() -> ProductService {
        ProductService::new(1.23, 150)
    }

    #[rstest]
    #[case(Some("31,00 zł"), "25.20")]
    #[case(Some("31.00 zł"), "25.20")]
    #[case(Some("1 230,00 zł"), "1000.00")]
    #[case(Some(""), "0.00")]
    #[case(Some("zł"), "0.00")]
    #[case(Some("1.2.3"), "0.00")]
    #[case(None, "0.00")]
    fn test_net_price(#[case] gross: Option<&str>, #[case] expected: &str) {
        assert_eq!(service().net_price(gross), expected);
    }

    #[test]
    fn test_gross_price_normalization() {
        assert!((parse_gross_price("31,00 zł") - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(
            format_description("pierwszy akapit\nciąg dalszy\n\ndrugi akapit"),
            "<p>pierwszy akapit ciąg dalszy</p><p>drugi akapit</p>"
        );
    }

    #[test]
    fn test_bold_lead_in() {
        let html = format_description("Opis produktu\nklocki z drewna. Wymiary\nduże pudełko");
        assert_eq!(
            html,
            "<p><strong>Opis produktu</strong> klocki z drewna.<br><strong>Wymiary</strong> duże pudełko</p>"
        );
    }

    #[test]
    fn test_empty_description_is_empty() {
        assert_eq!(format_description(""), "");
        assert_eq!(service().description(None, &[]), "");
    }

    #[test]
    fn test_description_appends_attributes() {
        let attributes = vec![("Kraj pochodzenia".to_string(), "Polska".to_string())];
        let html = service().description(Some("tekst"), &attributes);
        assert!(html.starts_with("<p>tekst</p>"));
        assert!(html.contains("<h3>Szczegóły produktu:</h3>"));
        assert!(html.contains("<li><strong>Kraj pochodzenia:</strong> Polska</li>"));
        assert!(html.ends_with("</ul>"));
    }

    #[test]
    fn test_short_description_respects_char_boundaries() {
        let svc = ProductService::new(1.23, 3);
        assert_eq!(svc.short_description("żółć"), "żół");
    }

    proptest::proptest! {
        #[test]
        fn prop_net_price_always_two_decimals(input in "\\PC{0,20}") {
            let price = service().net_price(Some(&input));
            let (_, decimals) = price.split_once('.').unwrap();
            proptest::prop_assert_eq!(decimals.len(), 2);
        }
    }
}

//! Manufacturer product page scraping.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Elements tried in order for the company name.
const COMPANY_SELECTORS: [&str; 6] = [
    "title",
    ".company-name",
    ".brand-name",
    ".logo-text",
    "h1",
    ".site-title",
];

/// Elements tried in order for feature bullets.
const FEATURE_SELECTORS: [&str; 4] = [".features li", ".benefits li", ".advantages li", "ul li"];

const MAX_COMPANY_CHARS: usize = 100;
const MIN_FEATURE_CHARS: usize = 10;
const MAX_FEATURE_CHARS: usize = 200;
const MAX_FEATURES: usize = 5;

/// What a manufacturer page told us.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerInfo {
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// The product name appears somewhere in the page text.
    pub found_on_site: bool,
}

impl ManufacturerInfo {
    /// Nothing usable was extracted.
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none() && self.features.is_empty()
    }
}

/// Extract company name, feature bullets and a product mention from a page.
pub fn parse_manufacturer_page(html: &str, source_url: &str, product_name: &str) -> ManufacturerInfo {
    static COMPANY: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        COMPANY_SELECTORS
            .iter()
            .map(|s| Selector::parse(s).expect("valid selector"))
            .collect()
    });
    static FEATURES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        FEATURE_SELECTORS
            .iter()
            .map(|s| Selector::parse(s).expect("valid selector"))
            .collect()
    });

    let doc = Html::parse_document(html);

    let company_name = COMPANY.iter().find_map(|sel| {
        doc.select(sel).next().and_then(|el| {
            let text = element_text(el);
            (!text.is_empty() && text.chars().count() < MAX_COMPANY_CHARS).then_some(text)
        })
    });

    let mut features: Vec<String> = Vec::new();
    'outer: for sel in FEATURES.iter() {
        for el in doc.select(sel) {
            let text = element_text(el);
            let len = text.chars().count();
            if !(MIN_FEATURE_CHARS..=MAX_FEATURE_CHARS).contains(&len) || features.contains(&text) {
                continue;
            }
            features.push(text);
            if features.len() == MAX_FEATURES {
                break 'outer;
            }
        }
    }

    let needle = product_name.trim().to_lowercase();
    let found_on_site = !needle.is_empty()
        && element_text(doc.root_element())
            .to_lowercase()
            .contains(&needle);

    ManufacturerInfo {
        source_url: source_url.to_string(),
        company_name,
        features,
        found_on_site,
    }
}

/// Cache key for a website + product pair.
pub fn cache_key(website: &str, product_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(website.trim().as_bytes());
    hasher.update(b"_");
    hasher.update(product_name.trim().to_lowercase().as_bytes());
    format!("manufacturer:{:x}", hasher.finalize())
}

/// Element text with whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("../../../fixtures/html/manufacturer.html").expect("fixture")
    }

    #[test]
    fn parses_fixture_page() {
        let info = parse_manufacturer_page(&fixture(), "https://www.hilti.co.uk", "Hilti TE1000");

        assert_eq!(info.company_name.as_deref(), Some("Hilti Great Britain"));
        assert_eq!(info.features.len(), 4);
        assert_eq!(
            info.features[0],
            "Active Vibration Reduction for lower operator strain"
        );
        assert!(!info.features.iter().any(|f| f == "Short"));
        assert!(info.found_on_site);
        assert!(!info.is_empty());
    }

    #[test]
    fn falls_through_company_selectors() {
        let html = "<html><head><title></title></head><body><div class='brand-name'>Belle Group</div></body></html>";
        let info = parse_manufacturer_page(html, "https://belle.example", "Minimix");
        assert_eq!(info.company_name.as_deref(), Some("Belle Group"));
        assert!(!info.found_on_site);
    }

    #[test]
    fn caps_features_at_five() {
        let items: String = (1..=8)
            .map(|i| format!("<li>Feature number {i} is useful</li>"))
            .collect();
        let html = format!("<html><body><ul class='features'>{items}</ul></body></html>");
        let info = parse_manufacturer_page(&html, "https://x.example", "");
        assert_eq!(info.features.len(), 5);
        assert!(!info.found_on_site);
    }

    #[test]
    fn empty_page_is_empty() {
        let info = parse_manufacturer_page("<html><body></body></html>", "https://x.example", "X");
        assert!(info.is_empty());
    }

    #[test]
    fn cache_key_is_stable_and_case_folded() {
        let a = cache_key("https://www.honda.co.uk", "Honda EU22i");
        let b = cache_key("https://www.honda.co.uk ", "honda eu22i");
        assert_eq!(a, b);
        assert!(a.starts_with("manufacturer:"));
        assert_ne!(a, cache_key("https://www.honda.co.uk", "Honda EU30is"));
    }
}

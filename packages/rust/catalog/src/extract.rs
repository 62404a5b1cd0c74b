//! Field extraction: brand, model, category and power type.
//!
//! Applied once per record at load time. Everything here is a pure function of
//! the record's title, description and code.

use std::sync::LazyLock;

use regex::Regex;

use copydesk_shared::{PowerType, ProductRecord, UNCATEGORIZED, UNKNOWN_BRAND};

/// Brands recognized in titles, in match priority order.
pub const KNOWN_BRANDS: [&str; 20] = [
    "Honda", "Stihl", "Makita", "Bosch", "Husqvarna", "DeWalt", "Hilti", "Karcher", "JCB",
    "Kubota", "Yanmar", "Bomag", "Weber", "Belle", "Wacker", "Mikasa", "Altrad", "Evolution",
    "Festool", "Metabo",
];

/// Code prefix → category.
pub const CATEGORY_PREFIXES: [(&str, &str); 25] = [
    ("01", "Access Equipment"),
    ("02", "Air Compressors & Tools"),
    ("03", "Breaking & Drilling"),
    ("04", "Cleaning Equipment"),
    ("05", "Compaction Equipment"),
    ("06", "Concrete Equipment"),
    ("07", "Cutting & Grinding"),
    ("08", "Dehumidifiers"),
    ("09", "Electrical Equipment"),
    ("10", "Fans & Ventilation"),
    ("11", "Floor Care"),
    ("12", "Garden Equipment"),
    ("13", "Generators"),
    ("14", "Hand Tools"),
    ("15", "Heating"),
    ("16", "Lifting Equipment"),
    ("17", "Lighting"),
    ("18", "Power Tools"),
    ("19", "Pumps"),
    ("20", "Safety Equipment"),
    ("21", "Site Equipment"),
    ("22", "Temporary Structures"),
    ("23", "Testing Equipment"),
    ("24", "Waste Management"),
    ("25", "Welding Equipment"),
];

/// Word prefixes per power type, in tie-break order.
const POWER_KEYWORDS: [(PowerType, &[&str]); 6] = [
    (PowerType::Petrol, &["petrol", "gasoline"]),
    (PowerType::Electric, &["electric", "mains", "240v", "110v"]),
    (PowerType::Diesel, &["diesel"]),
    (PowerType::Battery, &["battery", "batteries", "cordless"]),
    (PowerType::Hydraulic, &["hydraulic"]),
    (PowerType::Pneumatic, &["pneumatic"]),
];

/// Populate brand, model, category and power type. All four are derived;
/// any values carried in from the export are replaced.
pub fn extract(mut record: ProductRecord) -> ProductRecord {
    match brand_from_title(&record.title) {
        Some(brand) => {
            record.brand = brand.to_string();
            record.model = model_after_brand(&record.title, brand).unwrap_or_default();
        }
        None => {
            record.brand = UNKNOWN_BRAND.to_string();
            record.model = String::new();
        }
    }

    record.category = category_for_code(&record.code).to_string();

    record.power_type = match power_type_from_text(&record.description) {
        PowerType::Unspecified => power_type_from_text(&record.title),
        found => found,
    };

    record
}

/// First known brand appearing as a whole token in `title`.
pub fn brand_from_title(title: &str) -> Option<&'static str> {
    let tokens: Vec<&str> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    KNOWN_BRANDS
        .into_iter()
        .find(|brand| tokens.iter().any(|t| t.eq_ignore_ascii_case(brand)))
}

/// The model token right after `brand`, if it looks like a model number.
pub fn model_after_brand(title: &str, brand: &str) -> Option<String> {
    static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
        KNOWN_BRANDS
            .into_iter()
            .map(|b| {
                let re = Regex::new(&format!(r"(?i)\b{}\s+([A-Z0-9\-]+)", regex::escape(b)))
                    .expect("valid regex");
                (b, re)
            })
            .collect()
    });

    let (_, re) = PATTERNS
        .iter()
        .find(|(b, _)| b.eq_ignore_ascii_case(brand))?;

    let model = re.captures(title)?.get(1)?.as_str();
    model
        .chars()
        .any(|c| c.is_ascii_digit())
        .then(|| model.to_string())
}

/// Category for the code's leading segment, or `"Uncategorized"`.
pub fn category_for_code(code: &str) -> &'static str {
    let Some((prefix, _)) = code.trim().split_once(['/', '-']) else {
        return UNCATEGORIZED;
    };

    CATEGORY_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix.trim())
        .map(|(_, category)| *category)
        .unwrap_or(UNCATEGORIZED)
}

/// Case-insensitive keyword scan. Keywords match as word prefixes, so
/// "electrical" counts as electric but "remains" does not count as mains.
pub fn power_type_from_text(text: &str) -> PowerType {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    POWER_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| words.iter().any(|w| w.starts_with(k)))
        })
        .map(|(power, _)| *power)
        .unwrap_or(PowerType::Unspecified)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, title: &str, description: &str) -> ProductRecord {
        ProductRecord {
            code: code.into(),
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_all_fields() {
        let out = extract(record(
            "03/185",
            "Hilti TE1000 Electric Breaker",
            "Heavy duty breaker running on 110v site power.",
        ));
        assert_eq!(out.brand, "Hilti");
        assert_eq!(out.model, "TE1000");
        assert_eq!(out.category, "Breaking & Drilling");
        assert_eq!(out.power_type, PowerType::Electric);
        assert!(out.title.contains(&out.brand));
    }

    #[test]
    fn brand_must_be_a_whole_token() {
        // "Weber" is listed, "Webertown" is not a match.
        assert_eq!(brand_from_title("Webertown Site Heater"), None);
        assert_eq!(brand_from_title("belle minimix 150"), Some("Belle"));
        assert_eq!(brand_from_title("Wacker/Weber Plate"), Some("Weber"));
    }

    #[test]
    fn brand_list_order_breaks_ties() {
        // Both appear; Honda is earlier in the list than Belle.
        assert_eq!(brand_from_title("Belle Mixer with Honda Engine"), Some("Honda"));
    }

    #[test]
    fn unknown_brand_ignores_export_column() {
        let mut r = record("12/004", "Garden Shredder", "Shreds branches.");
        r.brand = "Camon".into();
        r.model = "C50".into();

        let out = extract(r);
        assert_eq!(out.brand, UNKNOWN_BRAND);
        assert_eq!(out.model, "");
    }

    #[test]
    fn model_without_digit_is_cleared() {
        let mut r = record("12/010", "Stihl Petrol Hedge Trimmer", "");
        r.model = "HS45".into();
        assert_eq!(extract(r).model, "");
    }

    #[test]
    fn model_requires_a_digit() {
        assert_eq!(
            model_after_brand("Stihl MS-250 Chainsaw", "Stihl").as_deref(),
            Some("MS-250")
        );
        assert_eq!(model_after_brand("Stihl Petrol Hedge Trimmer", "Stihl"), None);
        assert_eq!(model_after_brand("Hedge Trimmer", "Stihl"), None);
    }

    #[test]
    fn category_prefix_table() {
        assert_eq!(category_for_code("03/185"), "Breaking & Drilling");
        assert_eq!(category_for_code("25-004"), "Welding Equipment");
        assert_eq!(category_for_code("99/001"), UNCATEGORIZED);
        assert_eq!(category_for_code("03185"), UNCATEGORIZED);
        assert_eq!(category_for_code(""), UNCATEGORIZED);
    }

    #[test]
    fn power_type_vocabulary_order() {
        assert_eq!(power_type_from_text("DIESEL or petrol engine"), PowerType::Petrol);
        assert_eq!(power_type_from_text("Cordless drill"), PowerType::Battery);
        assert_eq!(power_type_from_text("Electrical tester"), PowerType::Electric);
        assert_eq!(power_type_from_text("Remains stable"), PowerType::Unspecified);
        assert_eq!(power_type_from_text(""), PowerType::Unspecified);
    }

    #[test]
    fn power_type_falls_back_to_title() {
        let out = extract(record("13/010", "Diesel Generator 20kVA", "Quiet and reliable."));
        assert_eq!(out.power_type, PowerType::Diesel);
    }

    #[test]
    fn no_keyword_means_unspecified_power() {
        let mut r = record("19/001", "Submersible Pump", "Moves water fast.");
        r.power_type = PowerType::Diesel;
        assert_eq!(extract(r.clone()).power_type, PowerType::Unspecified);

        r.description = "Hydraulic drive.".into();
        assert_eq!(extract(r).power_type, PowerType::Hydraulic);
    }
}

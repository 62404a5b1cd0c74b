//! Source header → canonical field mapping.
//!
//! Exports from different shop platforms name the same column differently
//! (`SKU`, `Meta: _technical_specification`, `Short description`, ...). Headers
//! are normalized once, then looked up in a fixed alias table.

use std::collections::HashMap;

use csv::StringRecord;

/// A field the catalog understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    Code,
    Title,
    Description,
    SpecText,
    ManufacturerWebsite,
    PowerOutput,
}

impl CanonicalField {
    /// Fields whose absence is reported when a catalog is loaded.
    pub const REQUIRED: [CanonicalField; 4] = [
        CanonicalField::Code,
        CanonicalField::Title,
        CanonicalField::Description,
        CanonicalField::SpecText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Title => "title",
            Self::Description => "description",
            Self::SpecText => "technical_specification",
            Self::ManufacturerWebsite => "manufacturer_website",
            Self::PowerOutput => "power_output",
        }
    }
}

/// Normalized header → canonical field.
const ALIASES: &[(&str, CanonicalField)] = &[
    ("sku", CanonicalField::Code),
    ("code", CanonicalField::Code),
    ("product code", CanonicalField::Code),
    ("stock number", CanonicalField::Code),
    ("stock code", CanonicalField::Code),
    ("name", CanonicalField::Title),
    ("title", CanonicalField::Title),
    ("post title", CanonicalField::Title),
    ("product name", CanonicalField::Title),
    ("description", CanonicalField::Description),
    ("short description", CanonicalField::Description),
    ("content", CanonicalField::Description),
    ("post content", CanonicalField::Description),
    ("technical specification", CanonicalField::SpecText),
    ("technical specifications", CanonicalField::SpecText),
    ("tech specs", CanonicalField::SpecText),
    ("specifications", CanonicalField::SpecText),
    ("manufacturer website", CanonicalField::ManufacturerWebsite),
    ("manufacturer url", CanonicalField::ManufacturerWebsite),
    ("power output", CanonicalField::PowerOutput),
];

/// Look up the canonical field for an already-normalized header.
pub fn canonical_field(normalized: &str) -> Option<CanonicalField> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| *field)
}

/// Normalize a raw header for alias lookup.
///
/// Strips a BOM, lowercases, drops a `meta:` prefix and leading underscores,
/// and collapses whitespace, `_` and `-` runs into single spaces.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim_start_matches('\u{feff}').trim().to_lowercase();
    let without_meta = lowered
        .strip_prefix("meta:")
        .unwrap_or(&lowered)
        .trim()
        .trim_start_matches('_');

    without_meta
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column plan for one export, built from its header row.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    /// Column indices per field, ascending.
    fields: HashMap<CanonicalField, Vec<usize>>,
    /// Headers with no alias (original spelling).
    ignored: Vec<String>,
    /// Normalized headers that appeared more than once.
    duplicates: Vec<String>,
}

impl SchemaMap {
    /// Build the plan. For identical normalized headers only the last
    /// occurrence is kept.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut last_seen: HashMap<String, (usize, &'a str)> = HashMap::new();
        let mut duplicates = Vec::new();

        for (idx, raw) in headers.into_iter().enumerate() {
            let normalized = normalize_header(raw);
            if normalized.is_empty() {
                continue;
            }
            if last_seen.insert(normalized.clone(), (idx, raw)).is_some()
                && !duplicates.contains(&normalized)
            {
                duplicates.push(normalized);
            }
        }

        let mut columns: Vec<(String, usize, &str)> = last_seen
            .into_iter()
            .map(|(normalized, (idx, raw))| (normalized, idx, raw))
            .collect();
        columns.sort_by_key(|(_, idx, _)| *idx);

        let mut fields: HashMap<CanonicalField, Vec<usize>> = HashMap::new();
        let mut ignored = Vec::new();
        for (normalized, idx, raw) in columns {
            match canonical_field(&normalized) {
                Some(field) => fields.entry(field).or_default().push(idx),
                None => ignored.push(raw.trim().to_string()),
            }
        }

        Self {
            fields,
            ignored,
            duplicates,
        }
    }

    pub fn has(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Required fields with no mapped column.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn ignored_headers(&self) -> &[String] {
        &self.ignored
    }

    pub fn duplicate_headers(&self) -> &[String] {
        &self.duplicates
    }

    /// Rightmost non-empty value for `field` in `row`, trimmed.
    pub fn value<'r>(&self, field: CanonicalField, row: &'r StringRecord) -> Option<&'r str> {
        self.fields.get(&field)?.iter().rev().find_map(|idx| {
            row.get(*idx)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }

    /// Like [`value`](Self::value) but owned, empty when absent.
    pub fn text(&self, field: CanonicalField, row: &StringRecord) -> String {
        self.value(field, row).unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_wordpress_headers() {
        assert_eq!(normalize_header("SKU"), "sku");
        assert_eq!(normalize_header("  Post title "), "post title");
        assert_eq!(
            normalize_header("Meta: _technical_specification"),
            "technical specification"
        );
        assert_eq!(
            normalize_header("Meta: technical_specification"),
            "technical specification"
        );
        assert_eq!(normalize_header("\u{feff}Short-Description"), "short description");
        assert_eq!(normalize_header("   "), "");
    }

    #[test]
    fn maps_aliases_and_ignores_unknown() {
        let map = SchemaMap::from_headers(["ID", "SKU", "Name", "Description", "Regular price"]);
        assert!(map.has(CanonicalField::Code));
        assert!(map.has(CanonicalField::Title));
        assert!(map.has(CanonicalField::Description));
        assert_eq!(map.ignored_headers(), ["ID", "Regular price"]);
        assert_eq!(map.missing_required(), vec![CanonicalField::SpecText]);
    }

    #[test]
    fn derived_columns_are_not_mapped() {
        let map = SchemaMap::from_headers(["SKU", "Name", "Brand", "Model", "Power Type"]);
        assert_eq!(map.ignored_headers(), ["Brand", "Model", "Power Type"]);
    }

    #[test]
    fn duplicate_header_last_occurrence_wins() {
        let map = SchemaMap::from_headers(["sku", "name", "Name"]);
        let row = StringRecord::from(vec!["01/001", "first", ""]);
        // The later `Name` column shadows the earlier one even when empty.
        assert_eq!(map.value(CanonicalField::Title, &row), None);
        assert_eq!(map.duplicate_headers(), ["name"]);

        let row = StringRecord::from(vec!["01/001", "first", "second"]);
        assert_eq!(map.value(CanonicalField::Title, &row), Some("second"));
    }

    #[test]
    fn distinct_aliases_prefer_rightmost_non_empty() {
        let map = SchemaMap::from_headers(["SKU", "Short description", "Description"]);

        let row = StringRecord::from(vec!["02/010", "short text", "long text"]);
        assert_eq!(map.value(CanonicalField::Description, &row), Some("long text"));

        let row = StringRecord::from(vec!["02/010", "short text", "  "]);
        assert_eq!(map.value(CanonicalField::Description, &row), Some("short text"));
    }

    #[test]
    fn short_rows_yield_none() {
        let map = SchemaMap::from_headers(["SKU", "Name", "Power Output"]);
        let row = StringRecord::from(vec!["03/185", "Hilti TE 1000"]);
        assert_eq!(map.value(CanonicalField::PowerOutput, &row), None);
        assert_eq!(map.text(CanonicalField::PowerOutput, &row), "");
    }
}

//! Technical specification text parsing.
//!
//! Spec text arrives as free text or an HTML fragment with one `key: value`
//! pair per line, but exports are inconsistent about the separator.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separators tried per line, highest priority first.
pub const DELIMITERS: [char; 4] = [':', '=', '-', '|'];

/// Keys at or above this many characters are prose, not spec labels.
const MAX_KEY_CHARS: usize = 50;

/// One parsed specification row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

/// Split raw spec text into candidate lines, with HTML tags treated as breaks.
pub fn spec_lines(raw: &str) -> Vec<String> {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    let text = TAG_RE.replace_all(raw, "\n");
    let text = decode_entities(&text);

    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse one line using the first delimiter present (in priority order).
///
/// Only that delimiter is tried: a line containing `:` is never re-split on
/// `-` even when the `:` split is rejected.
pub fn parse_spec_line(line: &str) -> Option<SpecEntry> {
    let delimiter = DELIMITERS.into_iter().find(|d| line.contains(*d))?;
    let (key, value) = line.split_once(delimiter)?;
    let (key, value) = (key.trim(), value.trim());

    if key.is_empty() || value.is_empty() || key.chars().count() >= MAX_KEY_CHARS {
        return None;
    }

    Some(SpecEntry {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Every parseable row, in source order. Repeated keys are kept.
pub fn parse_spec_text(raw: &str) -> Vec<SpecEntry> {
    spec_lines(raw)
        .iter()
        .filter_map(|line| parse_spec_line(line))
        .collect()
}

/// Tag-free, entity-decoded text with lines joined by single spaces.
pub fn plain_text(raw: &str) -> String {
    spec_lines(raw).join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_priority_per_line() {
        let raw = "Weight: 10-12 kg\nVoltage = 110V\nBlade - 300mm\nNoise | 98 dB";
        let specs = parse_spec_text(raw);
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].key, "Weight");
        assert_eq!(specs[0].value, "10-12 kg");
        assert_eq!(specs[1].value, "110V");
        assert_eq!(specs[2].key, "Blade");
        assert_eq!(specs[3].value, "98 dB");
    }

    #[test]
    fn html_fragment_lines() {
        let raw = "<ul><li>Max Depth: 150mm</li><li>Fuel: Petrol</li></ul><p>Hire&nbsp;Period: 1 day &amp; up</p>";
        let specs = parse_spec_text(raw);
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[2].key, "Hire Period");
        assert_eq!(specs[2].value, "1 day & up");
    }

    #[test]
    fn rejects_empty_sides_and_long_keys() {
        assert!(parse_spec_line("Weight:").is_none());
        assert!(parse_spec_line(": 10kg").is_none());
        assert!(parse_spec_line("no separator here").is_none());
        // `:` wins even though the split leaves an empty value.
        assert!(parse_spec_line("Size - large:").is_none());

        let long_key = format!("{}: value", "k".repeat(50));
        assert!(parse_spec_line(&long_key).is_none());
        let ok_key = format!("{}: value", "k".repeat(49));
        assert!(parse_spec_line(&ok_key).is_some());
    }

    #[test]
    fn splits_once_only() {
        let entry = parse_spec_line("Dimensions: 1200 x 800: folded").expect("parse");
        assert_eq!(entry.key, "Dimensions");
        assert_eq!(entry.value, "1200 x 800: folded");
    }

    #[test]
    fn crlf_and_blank_lines() {
        let raw = "Power: 2.2kW\r\n\r\n  \r\nOutput: 230V\r\n";
        assert_eq!(spec_lines(raw).len(), 2);
        assert_eq!(parse_spec_text(raw).len(), 2);
    }

    #[test]
    fn plain_text_strips_markup() {
        let raw = "<p>Quiet&nbsp;running.</p>\n<p>Fuel &amp; oil included.</p>";
        assert_eq!(plain_text(raw), "Quiet running. Fuel & oil included.");
    }
}

//! Style analysis over same-category products.
//!
//! The profile summarizes how the existing catalog writes about a category:
//! recurring title words, sentence openings and spec fields. Its
//! `confidence` reports how much reference material backed a generation, and
//! `lead_word` decides how the opening sentence starts.

use std::collections::HashMap;

use copydesk_catalog::{parse_spec_text, plain_text};
use copydesk_shared::{ProductRecord, StyleProfile};

const STOP_WORDS: [&str; 15] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "-",
];
const MAX_TITLE_WORDS: usize = 15;
const MAX_STARTERS: usize = 10;
const STARTER_SENTENCES: usize = 3;
const STARTER_WORDS: usize = 4;
/// Descriptions this short are ignored for sentence statistics.
const MIN_DESCRIPTION_CHARS: usize = 10;

/// Build a [`StyleProfile`] from the samples.
pub fn analyze_style(samples: &[&ProductRecord]) -> StyleProfile {
    if samples.is_empty() {
        return StyleProfile::default();
    }

    let mut title_words = Counter::default();
    for record in samples {
        for word in record.title.split_whitespace() {
            let word = word.to_lowercase();
            if word.chars().count() > 2 && !STOP_WORDS.contains(&word.as_str()) {
                title_words.add(word);
            }
        }
    }

    let descriptions: Vec<String> = samples
        .iter()
        .map(|r| plain_text(&r.description))
        .filter(|d| d.chars().count() > MIN_DESCRIPTION_CHARS)
        .collect();

    let mut starters = Counter::default();
    let mut leads = Counter::default();
    for description in &descriptions {
        if let Some(first) = description.split_whitespace().next() {
            leads.add(first.to_string());
        }
        for sentence in description.split('.').take(STARTER_SENTENCES) {
            let words: Vec<&str> = sentence.split_whitespace().take(STARTER_WORDS).collect();
            if words.len() >= 2 {
                starters.add(words.join(" "));
            }
        }
    }

    let mut spec_fields = Counter::default();
    for record in samples {
        for entry in parse_spec_text(&record.spec_text) {
            spec_fields.add(entry.key);
        }
    }

    let avg_description_words = if descriptions.is_empty() {
        0
    } else {
        descriptions
            .iter()
            .map(|d| d.split_whitespace().count())
            .sum::<usize>()
            / descriptions.len()
    };

    StyleProfile {
        samples: samples.len(),
        common_title_words: title_words.repeated(MAX_TITLE_WORDS),
        sentence_starters: starters.repeated(MAX_STARTERS),
        common_spec_fields: spec_fields.repeated(usize::MAX),
        avg_description_words,
        lead_word: leads.repeated(1).into_iter().next(),
    }
}

/// Occurrence counter that remembers first-seen order for stable ties.
#[derive(Default)]
struct Counter {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl Counter {
    fn add(&mut self, item: String) {
        let count = self.counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            self.order.push(item);
        }
        *count += 1;
    }

    /// Items seen more than once, by descending count.
    fn repeated(&self, limit: usize) -> Vec<String> {
        let mut items: Vec<(&String, usize)> = self
            .order
            .iter()
            .map(|item| (item, self.counts[item]))
            .filter(|(_, count)| *count > 1)
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1));
        items
            .into_iter()
            .take(limit)
            .map(|(item, _)| item.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, description: &str, spec: &str) -> ProductRecord {
        ProductRecord {
            title: title.into(),
            description: description.into(),
            spec_text: spec.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_samples_give_base_confidence() {
        let profile = analyze_style(&[]);
        assert_eq!(profile.samples, 0);
        assert!((profile.confidence() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn finds_repeated_patterns() {
        let a = record(
            "Honda EU22i Petrol Generator",
            "This generator delivers quiet power. Ideal for events.",
            "Output: 2.2kVA\nWeight: 21kg",
        );
        let b = record(
            "Honda EU30is Petrol Generator",
            "This generator delivers quiet running. Runs all day.",
            "Output: 3kVA\nFuel: Petrol",
        );
        let c = record("Yanmar Diesel Generator", "Short", "");
        let profile = analyze_style(&[&a, &b, &c]);

        assert_eq!(profile.samples, 3);
        assert_eq!(profile.common_title_words[0], "generator");
        assert!(profile.common_title_words.contains(&"honda".to_string()));
        assert!(profile.common_title_words.contains(&"petrol".to_string()));
        assert_eq!(profile.sentence_starters, ["This generator delivers quiet"]);
        assert_eq!(profile.common_spec_fields, ["Output"]);
        assert_eq!(profile.avg_description_words, 8);
        assert_eq!(profile.lead_word.as_deref(), Some("This"));
    }

    #[test]
    fn descriptions_are_read_as_plain_text() {
        let a = record("Belle Minimix 150", "<p>Our mixer turns out small batches.</p>", "");
        let b = record("Belle Minimix 130", "<p>Our mixer turns out mortar on petrol.</p>", "");
        let profile = analyze_style(&[&a, &b]);
        assert_eq!(profile.lead_word.as_deref(), Some("Our"));
        assert_eq!(profile.sentence_starters, ["Our mixer turns out"]);
    }

    #[test]
    fn confidence_grows_with_samples_and_patterns() {
        let a = record("Stihl HS45 Hedge Trimmer", "Cuts hedges fast. Light to carry.", "Weight: 5kg");
        let b = record("Stihl HS82 Hedge Trimmer", "Cuts hedges fast. Long reach.", "Weight: 6kg");
        let profile = analyze_style(&[&a, &b]);

        // 0.3 + 0.2 + title words + starters + spec fields
        assert!((profile.confidence() - 0.8).abs() < 1e-9);

        let many: Vec<ProductRecord> = (0..8).map(|_| a.clone()).collect();
        let refs: Vec<&ProductRecord> = many.iter().collect();
        assert!((analyze_style(&refs).confidence() - 1.0).abs() < 1e-9);
    }
}

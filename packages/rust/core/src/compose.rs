//! Description composer: fills the fixed product template.
//!
//! Output is always the same five-part description (opening, feature list,
//! practical use, optional enrichment clause, call to action), a spec table,
//! a capped meta description and a title. Enrichment only ever adds the
//! clause and extra feature bullets; its absence leaves the structure intact.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::debug;

use copydesk_catalog::{SpecEntry, parse_spec_text, plain_text};
use copydesk_enrich::Enrichment;
use copydesk_shared::{ComposeOptions, GeneratedContent, ProductRecord, UNKNOWN_BRAND};

use crate::style::analyze_style;
use crate::taxonomy;

/// Manufacturer bullets appended after the description's own.
const MAX_MANUFACTURER_FEATURES: usize = 3;
const MIN_FEATURE_WORDS: usize = 3;
const MAX_FEATURE_CHARS: usize = 200;
const ELLIPSIS: char = '…';
/// Determiners a catalog's own descriptions may open with.
const OPENERS: [&str; 3] = ["The", "This", "Our"];

/// Render every output fragment for one product.
pub fn compose(
    record: &ProductRecord,
    samples: &[&ProductRecord],
    enrichment: &Enrichment,
    options: &ComposeOptions,
) -> GeneratedContent {
    let profile = analyze_style(samples);
    let specs = parse_spec_text(&record.spec_text);
    let description = plain_text(&record.description);
    let sentences = split_clauses(&description);

    let mut html = String::new();
    html.push_str(&paragraph(&opening_sentence(
        record,
        opener(profile.lead_word.as_deref()),
        sentences.first().map(String::as_str),
    )));
    html.push_str(&feature_list(&feature_items(
        record,
        sentences.get(1..).unwrap_or_default(),
        enrichment,
        options.feature_limit,
    )));
    html.push_str(&paragraph(&practical_use(&record.category)));
    if let Some(clause) = enrichment_clause(enrichment) {
        html.push_str(&paragraph(&clause));
    }
    html.push_str(&paragraph(&options.call_to_action));

    let title = product_title(record);
    let meta = meta_description(&title, sentences.first().map(String::as_str), &record.category);

    debug!(
        code = %record.code,
        spec_rows = specs.len(),
        samples = profile.samples,
        "composed product content"
    );

    GeneratedContent {
        code: record.code.clone(),
        title,
        category: record.category.clone(),
        description_html: html,
        spec_table_html: spec_table(&specs),
        meta_description: truncate_meta(&meta, options.meta_description_max),
        style_confidence: profile.confidence(),
        samples_used: profile.samples,
        style: profile,
        enrichment_sources: enrichment.sources(),
        generated_at: Utc::now(),
    }
}

/// The record title, or `brand model type - power type` when it is blank.
pub fn product_title(record: &ProductRecord) -> String {
    let title = record.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }

    let mut parts: Vec<&str> = Vec::new();
    if !record.brand.is_empty() && record.brand != UNKNOWN_BRAND {
        parts.push(&record.brand);
    }
    if !record.model.is_empty() {
        parts.push(&record.model);
    }
    parts.push(taxonomy::product_type(&record.category));

    let mut title = parts.join(" ");
    if record.power_type.is_specified() {
        title.push_str(" - ");
        title.push_str(record.power_type.as_str());
    }
    title
}

/// `<table>` with one row per parseable spec line.
pub fn spec_table(specs: &[SpecEntry]) -> String {
    let mut html = String::from("<table class=\"technical-specifications\"><tbody>");
    for entry in specs {
        html.push_str("<tr><th>");
        html.push_str(&escape_html(&entry.key));
        html.push_str("</th><td>");
        html.push_str(&escape_html(&entry.value));
        html.push_str("</td></tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// Collapse whitespace and cut to at most `cap` characters at a word
/// boundary. A cut text ends in `…`, which counts toward the cap.
pub fn truncate_meta(text: &str, cap: usize) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() <= cap {
        return text;
    }
    if cap == 0 {
        return String::new();
    }

    let budget = cap - 1;
    let cut = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];
    let boundary = if text[cut..].starts_with(' ') {
        Some(cut)
    } else {
        head.rfind(' ')
    };

    // A single word longer than the cap is hard-cut.
    let kept = match boundary {
        Some(i) if i > 0 => &head[..i],
        _ => head,
    };
    let kept = kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'));
    format!("{kept}{ELLIPSIS}")
}

/// Minimal escaping for text placed in element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Naive sentence/clause split of plain description text.
fn split_clauses(text: &str) -> Vec<String> {
    static BREAK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[.!?;]+(?:\s+|$)|\s*[•·]\s*").expect("valid regex"));

    BREAK_RE
        .split(text)
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The samples' shared lead word when it is a known determiner, else "The".
fn opener(lead_word: Option<&str>) -> &'static str {
    lead_word
        .and_then(|lead| OPENERS.into_iter().find(|o| o.eq_ignore_ascii_case(lead)))
        .unwrap_or(OPENERS[0])
}

fn opening_sentence(record: &ProductRecord, opener: &str, first_sentence: Option<&str>) -> String {
    let name = record.display_name();
    let product_type = taxonomy::product_type(&record.category).to_lowercase();
    let power = if record.power_type.is_specified() {
        format!("{} ", record.power_type.as_str().to_lowercase())
    } else {
        String::new()
    };
    let article = if product_type.ends_with("equipment") { "" } else { "a " };

    let mut opening = format!(
        "{opener} {name} is {article}professional-grade {power}{product_type} available for hire."
    );
    if let Some(sentence) = first_sentence {
        opening.push(' ');
        opening.push_str(&as_sentence(sentence));
    }
    opening
}

/// Description clauses, then manufacturer bullets, then category benefits
/// when nothing else is available. Never empty.
fn feature_items(
    record: &ProductRecord,
    clauses: &[String],
    enrichment: &Enrichment,
    limit: usize,
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for clause in clauses {
        let words = clause.split_whitespace().count();
        if words >= MIN_FEATURE_WORDS && clause.chars().count() <= MAX_FEATURE_CHARS {
            push_unique(&mut items, capitalize(clause));
        }
    }

    if let Some(manufacturer) = &enrichment.manufacturer {
        for feature in manufacturer.features.iter().take(MAX_MANUFACTURER_FEATURES) {
            push_unique(&mut items, capitalize(feature.trim_end_matches('.')));
        }
    }

    if items.is_empty() {
        for benefit in taxonomy::benefits(&record.category) {
            push_unique(&mut items, (*benefit).to_string());
        }
    }

    items.truncate(limit.max(1));
    items
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
        items.push(item);
    }
}

fn feature_list(items: &[String]) -> String {
    let mut html = String::from("<ul class=\"product-features\">");
    for item in items {
        html.push_str("<li>");
        html.push_str(&escape_html(item));
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

fn practical_use(category: &str) -> String {
    let applications = taxonomy::applications(category);
    let listed = match applications {
        [] => String::from("a wide range of projects"),
        [only] => (*only).to_string(),
        [rest @ .., last] => format!("{} and {last}", rest.join(", ")),
    };
    format!(
        "Ideal for {listed}. Whether you're a professional contractor or undertaking a DIY \
         project, this equipment delivers the performance you need."
    )
}

fn enrichment_clause(enrichment: &Enrichment) -> Option<String> {
    let mut sentences = Vec::new();
    if let Some(company) = enrichment
        .manufacturer
        .as_ref()
        .and_then(|m| m.company_name.as_deref())
    {
        sentences.push(format!(
            "Manufactured by {company}, this equipment represents years of engineering \
             excellence and innovation in the industry."
        ));
    }
    if let Some(snippet) = enrichment.top_snippet() {
        sentences.push(as_sentence(snippet));
    }
    (!sentences.is_empty()).then(|| sentences.join(" "))
}

fn meta_description(title: &str, first_sentence: Option<&str>, category: &str) -> String {
    let lead = first_sentence
        .map(as_sentence)
        .or_else(|| taxonomy::benefits(category).first().map(|b| as_sentence(b)))
        .unwrap_or_default();
    format!("Hire the {} {lead}", terminated(title))
}

fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

/// Capitalized, whitespace-collapsed, ending in terminal punctuation.
fn as_sentence(text: &str) -> String {
    capitalize(&terminated(text))
}

fn terminated(text: &str) -> String {
    let mut sentence = collapse_whitespace(text);
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    sentence
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

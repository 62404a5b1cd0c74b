//! Core domain types for copydesk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Brand assigned when no known brand appears in the title.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// Category assigned when the code prefix is not in the taxonomy.
pub const UNCATEGORIZED: &str = "Uncategorized";

// ---------------------------------------------------------------------------
// GenerationId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for generation history identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(pub Uuid);

impl GenerationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GenerationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PowerType
// ---------------------------------------------------------------------------

/// How a piece of equipment is powered.
///
/// Variant order is the tie-break order used by keyword extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerType {
    Petrol,
    Electric,
    Diesel,
    Battery,
    Hydraulic,
    Pneumatic,
    #[default]
    Unspecified,
}

impl PowerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Electric => "Electric",
            Self::Diesel => "Diesel",
            Self::Battery => "Battery",
            Self::Hydraulic => "Hydraulic",
            Self::Pneumatic => "Pneumatic",
            Self::Unspecified => "Unspecified",
        }
    }

    pub fn is_specified(&self) -> bool {
        *self != Self::Unspecified
    }
}

impl std::fmt::Display for PowerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProductRecord
// ---------------------------------------------------------------------------

/// One catalog row after schema mapping.
///
/// `brand`, `model`, `category` and `power_type` are empty until field
/// extraction runs; afterwards they are always populated (`"Unknown"`, `""`,
/// `"Uncategorized"` and [`PowerType::Unspecified`] as fallbacks).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique catalog code, e.g. `03/185`.
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Raw technical specification text, possibly containing HTML.
    pub spec_text: String,
    pub brand: String,
    pub model: String,
    pub power_type: PowerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_output: Option<String>,
}

impl ProductRecord {
    /// Brand and model joined for display, falling back to the title.
    pub fn display_name(&self) -> String {
        if self.brand.is_empty() || self.brand == UNKNOWN_BRAND {
            return self.title.clone();
        }
        if self.model.is_empty() {
            self.brand.clone()
        } else {
            format!("{} {}", self.brand, self.model)
        }
    }
}

// ---------------------------------------------------------------------------
// StyleProfile
// ---------------------------------------------------------------------------

const BASE_CONFIDENCE: f64 = 0.3;
const PER_SAMPLE: f64 = 0.1;
const MAX_SAMPLE_BOOST: f64 = 0.4;
const PER_PATTERN_GROUP: f64 = 0.1;

/// Patterns found across same-category style samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleProfile {
    pub samples: usize,
    /// Lowercased title words seen more than once, most frequent first.
    pub common_title_words: Vec<String>,
    /// Opening word runs seen more than once, most frequent first.
    pub sentence_starters: Vec<String>,
    /// Spec keys seen more than once, most frequent first.
    pub common_spec_fields: Vec<String>,
    /// Mean description length in words.
    pub avg_description_words: usize,
    /// First word shared by more than one sample description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_word: Option<String>,
}

impl StyleProfile {
    /// 0.3 base, +0.1 per sample up to +0.4, +0.1 per non-empty pattern group.
    pub fn confidence(&self) -> f64 {
        let mut confidence = BASE_CONFIDENCE;
        if self.samples == 0 {
            return confidence;
        }
        confidence += (self.samples as f64 * PER_SAMPLE).min(MAX_SAMPLE_BOOST);
        for group in [
            &self.common_title_words,
            &self.sentence_starters,
            &self.common_spec_fields,
        ] {
            if !group.is_empty() {
                confidence += PER_PATTERN_GROUP;
            }
        }
        confidence.min(1.0)
    }
}

// ---------------------------------------------------------------------------
// GeneratedContent
// ---------------------------------------------------------------------------

/// The fragments produced for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub code: String,
    /// Plain title string.
    pub title: String,
    pub category: String,
    /// Description body (HTML).
    pub description_html: String,
    /// Technical specification table (HTML).
    pub spec_table_html: String,
    /// Plain-text SEO summary, never longer than the configured cap.
    pub meta_description: String,
    /// How well the same-category style samples support the output (0.0..=1.0).
    pub style_confidence: f64,
    /// Number of style samples consulted.
    pub samples_used: usize,
    /// Patterns the samples showed; shapes the opening sentence.
    #[serde(default)]
    pub style: StyleProfile,
    /// Enrichment sources that contributed (`manufacturer`, `search`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichment_sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

//! Content generation for catalog products.
//!
//! This crate ties the catalog, enrichment and storage crates into the
//! `generate` workflow: style analysis over same-category products, the
//! description template, and the output writer.

pub mod compose;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod taxonomy;

pub use compose::{compose, escape_html, product_title, spec_table, truncate_meta};
pub use pipeline::{GenerateRequest, GenerateResult, ProgressReporter, SilentProgress, generate};
pub use render::{OutputFormat, code_slug, write_outputs};
pub use style::analyze_style;

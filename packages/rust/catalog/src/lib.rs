//! Product catalog loading, schema mapping and field extraction.
//!
//! The entry points are [`load_catalog`] for a one-shot load and
//! [`CatalogHandle`] for a reloadable, shared catalog. Every record passes
//! through [`extract::extract`] at load time, so consumers always see brand,
//! model, category and power type populated.

mod catalog;
pub mod extract;
mod loader;
pub mod schema;
mod source;
pub mod specs;

pub use catalog::{Catalog, CatalogHandle, CatalogInfo, SourceFile, normalize_code};
pub use loader::{LoadReport, load_catalog, load_from_reader};
pub use source::{CatalogSource, latest_csv};
pub use specs::{SpecEntry, parse_spec_text, plain_text};

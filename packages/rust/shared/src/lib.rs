//! Shared types, error model, and configuration for copydesk.
//!
//! This crate is the foundation depended on by all other copydesk crates.
//! It provides:
//! - [`CopydeskError`]: the unified error type
//! - Domain types ([`ProductRecord`], [`PowerType`], [`GeneratedContent`], [`GenerationId`],
//!   [`StyleProfile`])
//! - Configuration ([`AppConfig`], [`ComposeOptions`], [`EnrichmentOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, ComposeConfig, ComposeOptions, DEFAULT_CALL_TO_ACTION,
    EnrichmentConfig, EnrichmentOptions, StorageConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, validate_config,
};
pub use error::{CopydeskError, Result};
pub use types::{
    GeneratedContent, GenerationId, PowerType, ProductRecord, StyleProfile, UNCATEGORIZED,
    UNKNOWN_BRAND,
};

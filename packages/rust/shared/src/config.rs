//! Application configuration for copydesk.
//!
//! User config lives at `~/.copydesk/copydesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CopydeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "copydesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".copydesk";

/// Closing line appended to every generated description.
pub const DEFAULT_CALL_TO_ACTION: &str = "Available for same-day hire with delivery across London. \
Contact our team today for availability and expert advice on your requirements.";

// ---------------------------------------------------------------------------
// Config structs (matching copydesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the catalog export lives.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Description composer settings.
    #[serde(default)]
    pub compose: ComposeConfig,

    /// Manufacturer scrape and web search.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Generation history database.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory searched for the most recently modified CSV export.
    #[serde(default = "default_catalog_dir")]
    pub dir: String,

    /// Explicit export file. Takes precedence over `dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: default_catalog_dir(),
            path: None,
        }
    }
}

fn default_catalog_dir() -> String {
    "data/product_data".into()
}

/// `[compose]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Maximum number of same-category records used as style samples.
    #[serde(default = "default_similar_limit")]
    pub similar_limit: usize,

    /// Hard cap on the meta description, in characters.
    #[serde(default = "default_meta_description_max")]
    pub meta_description_max: usize,

    /// Maximum bullet points in the feature list.
    #[serde(default = "default_feature_limit")]
    pub feature_limit: usize,

    /// Closing call-to-action sentence.
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            similar_limit: default_similar_limit(),
            meta_description_max: default_meta_description_max(),
            feature_limit: default_feature_limit(),
            call_to_action: default_call_to_action(),
        }
    }
}

fn default_similar_limit() -> usize {
    15
}
fn default_meta_description_max() -> usize {
    155
}
fn default_feature_limit() -> usize {
    8
}
fn default_call_to_action() -> String {
    DEFAULT_CALL_TO_ACTION.into()
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Master switch for all network enrichment.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after the first failure (no backoff).
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Whether to run a web search for each generation.
    #[serde(default)]
    pub search_enabled: bool,

    /// HTML search endpoint queried with `?q=`.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// How many search hits to keep.
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            search_enabled: false,
            search_url: default_search_url(),
            max_search_results: default_max_search_results(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_retries() -> u32 {
    1
}
fn default_search_url() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_max_search_results() -> usize {
    3
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// libSQL database file. `~` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Cache manufacturer scrapes between runs.
    #[serde(default = "default_true")]
    pub cache_enrichment: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_enrichment: true,
        }
    }
}

fn default_db_path() -> String {
    "~/.copydesk/copydesk.db".into()
}

impl StorageConfig {
    /// Resolve `db_path`, expanding a leading `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        expand_home(&self.db_path)
    }
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime composer options.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub similar_limit: usize,
    pub meta_description_max: usize,
    pub feature_limit: usize,
    pub call_to_action: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ComposeOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            similar_limit: config.compose.similar_limit,
            meta_description_max: config.compose.meta_description_max,
            feature_limit: config.compose.feature_limit,
            call_to_action: config.compose.call_to_action.clone(),
        }
    }
}

/// Runtime enrichment options.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    pub timeout_secs: u64,
    pub retries: u32,
    pub search_enabled: bool,
    pub search_url: String,
    pub max_search_results: usize,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EnrichmentOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.enrichment.timeout_secs,
            retries: config.enrichment.retries,
            search_enabled: config.enrichment.search_enabled,
            search_url: config.enrichment.search_url.clone(),
            max_search_results: config.enrichment.max_search_results,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.copydesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CopydeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.copydesk/copydesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CopydeskError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        CopydeskError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CopydeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CopydeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CopydeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make generation meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.compose.meta_description_max < 20 {
        return Err(CopydeskError::config(format!(
            "compose.meta_description_max must be at least 20 (got {})",
            config.compose.meta_description_max
        )));
    }
    if config.compose.feature_limit == 0 {
        return Err(CopydeskError::config(
            "compose.feature_limit must be greater than zero",
        ));
    }
    if config.enrichment.timeout_secs == 0 {
        return Err(CopydeskError::config(
            "enrichment.timeout_secs must be greater than zero",
        ));
    }
    Ok(())
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| CopydeskError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("similar_limit"));
        assert!(toml_str.contains("html.duckduckgo.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.compose.similar_limit, 15);
        assert_eq!(parsed.compose.meta_description_max, 155);
        assert_eq!(parsed.enrichment.retries, 1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[catalog]
path = "/srv/exports/products.csv"

[enrichment]
search_enabled = true
timeout_secs = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.catalog.path.as_deref(),
            Some("/srv/exports/products.csv")
        );
        assert_eq!(config.catalog.dir, "data/product_data");
        assert!(config.enrichment.search_enabled);
        assert_eq!(config.enrichment.timeout_secs, 3);
        assert!(config.enrichment.enabled);
        assert_eq!(config.compose.call_to_action, DEFAULT_CALL_TO_ACTION);
    }

    #[test]
    fn runtime_options_from_app_config() {
        let mut app = AppConfig::default();
        app.compose.similar_limit = 5;
        app.enrichment.timeout_secs = 2;

        let compose = ComposeOptions::from(&app);
        assert_eq!(compose.similar_limit, 5);
        assert_eq!(compose.feature_limit, 8);

        let enrich = EnrichmentOptions::from(&app);
        assert_eq!(enrich.timeout_secs, 2);
        assert_eq!(enrich.retries, 1);
    }

    #[test]
    fn validation_rejects_tiny_meta_cap() {
        let mut config = AppConfig::default();
        config.compose.meta_description_max = 5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("meta_description_max"));

        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(
            expand_home("/var/lib/copydesk.db").unwrap(),
            PathBuf::from("/var/lib/copydesk.db")
        );
        let expanded = expand_home("~/copydesk.db").unwrap();
        assert!(expanded.ends_with("copydesk.db"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}

//! Error types for copydesk.
//!
//! Library crates use [`CopydeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all copydesk operations.
#[derive(Debug, thiserror::Error)]
pub enum CopydeskError {
    /// No catalog source could be located. Fatal for the session.
    #[error("catalog source not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The requested product code is not in the catalog.
    #[error("product code '{code}' not found in catalog")]
    NotFound { code: String },

    /// An optional enrichment source was unavailable.
    #[error("enrichment from {source_name} unavailable: {reason}")]
    PartialEnrichment { source_name: String, reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during enrichment.
    #[error("network error: {0}")]
    Network(String),

    /// CSV, HTML or spec text parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad option, malformed record, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CopydeskError>;

impl CopydeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    /// Mark an enrichment source as unavailable.
    pub fn partial(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PartialEnrichment {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is scoped to a single request.
    ///
    /// `NotFound` and `PartialEnrichment` leave the session usable; everything
    /// else (a missing catalog, a broken config) should be surfaced to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::PartialEnrichment { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CopydeskError::config("bad timeout");
        assert_eq!(err.to_string(), "config error: bad timeout");

        let err = CopydeskError::not_found("99/999");
        assert_eq!(
            err.to_string(),
            "product code '99/999' not found in catalog"
        );

        let err = CopydeskError::partial("manufacturer", "timed out");
        assert!(err.to_string().contains("manufacturer"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn recoverable_kinds() {
        assert!(CopydeskError::not_found("01/001").is_recoverable());
        assert!(CopydeskError::partial("search", "HTTP 503").is_recoverable());
        assert!(!CopydeskError::file_not_found("/tmp/none").is_recoverable());
        assert!(!CopydeskError::Storage("locked".into()).is_recoverable());
    }
}

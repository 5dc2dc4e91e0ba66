//! Error types for filecache
//!
//! All modules use `CacheResult<T>` as their return type. Errors raised by
//! a memoized operation itself never pass through here; they are carried
//! untouched by [`crate::cache::MemoizeError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in filecache
#[derive(Error, Debug)]
pub enum CacheError {
    // Record errors
    #[error("Cache record not found: {0}")]
    NotFound(String),

    #[error("Invalid record name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Failed to serialize record {name}: {source}")]
    Codec {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported record format in {name}: {found}")]
    UnsupportedFormat { name: String, found: String },

    // Key derivation errors
    #[error("Arguments cannot be fingerprinted: {0}")]
    Derivation(String),

    // Housekeeping errors
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No cache directory configured")]
    NoCacheDir,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a codec error for the named record
    pub fn codec(name: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Codec {
            name: name.into(),
            source,
        }
    }

    /// Check if the error happened at the storage boundary (IO or record encoding)
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Codec { .. } | Self::UnsupportedFormat { .. } | Self::Json(_)
        )
    }

    /// Check if the error is a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(_) => Some("Run: filecache list"),
            Self::NoCacheDir => Some("Pass --dir, set FILECACHE_DIR, or set cache.dir in the config"),
            Self::UnsupportedFormat { .. } => {
                Some("The record was written by another tool or version. Run: filecache remove <name>")
            }
            Self::ConfigInvalid { .. } => Some("Run: filecache config init --force"),
            _ => None,
        }
    }
}

//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`LibraryError`] which covers every failure mode of the
//! library index. It uses `thiserror` for ergonomic error definitions and
//! includes named constructors for the common failure scenarios.
//!
//! # Public API
//! - [`LibraryError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, LibraryError>`
//!
//! # Error Categories
//! - **Filesystem**: Missing roots, unreadable folders, I/O errors
//! - **Archives**: Corrupt or unreadable zip files
//! - **Persisted state**: Ledger and index parse failures
//! - **Configuration**: Invalid disable rules, unknown system groups

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for the library index
#[derive(Error, Debug)]
pub enum LibraryError {
    // Scanner errors
    #[error("System root does not exist: {path}")]
    RootNotFound { path: PathBuf },

    #[error("System root is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("No usable roots for system {system_id}")]
    NoUsableRoots { system_id: String },

    #[error("Failed to read archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    // File operation errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    // Persisted state errors
    #[error("Failed to parse ledger '{path}': {source}")]
    LedgerParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    // Configuration errors
    #[error("Invalid disable rule: '{rule}'. Use exact, prefix*, *suffix or *substr*")]
    InvalidRule { rule: String },

    #[error("System group '{group}' has no member systems")]
    UnknownGroup { group: String },

    #[error("Unknown system: {system_id}")]
    UnknownSystem { system_id: String },

    #[error("Failed to parse config '{path}': {source}")]
    ConfigParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Could not find config directory")]
    ConfigDirectoryNotFound,

    // Build results
    #[error("No systems configured. Add systems to the config file first.")]
    NoSystemsConfigured,

    #[error("No games indexed")]
    NoGamesIndexed,

    #[error("No gamelists available. Run 'build' first.")]
    NoGamelists,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using LibraryError
pub type Result<T> = std::result::Result<T, LibraryError>;

impl LibraryError {
    /// Create a missing root error
    pub fn root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RootNotFound { path: path.into() }
    }

    /// Create a root-is-a-file error
    pub fn root_not_directory(path: impl Into<PathBuf>) -> Self {
        Self::RootNotDirectory { path: path.into() }
    }

    /// Create an error for a system whose roots all failed
    pub fn no_usable_roots(system_id: impl Into<String>) -> Self {
        Self::NoUsableRoots {
            system_id: system_id.into(),
        }
    }

    /// Create an archive error
    pub fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    pub fn directory_creation_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn ledger_parse_failed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::LedgerParseFailed {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid rule error
    pub fn invalid_rule(rule: impl Into<String>) -> Self {
        Self::InvalidRule { rule: rule.into() }
    }

    /// Create an unknown group error
    pub fn unknown_group(group: impl Into<String>) -> Self {
        Self::UnknownGroup {
            group: group.into(),
        }
    }

    pub fn unknown_system(system_id: impl Into<String>) -> Self {
        Self::UnknownSystem {
            system_id: system_id.into(),
        }
    }

    pub fn config_parse_failed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ConfigParseFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a configuration problem the caller must fix
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule { .. }
                | Self::UnknownGroup { .. }
                | Self::UnknownSystem { .. }
                | Self::ConfigParseFailed { .. }
                | Self::NoSystemsConfigured
        )
    }
}

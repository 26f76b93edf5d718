//! Error types for target loading, assembly and export.

use std::path::PathBuf;

use ecpsoc_core::SocError;

/// Errors that can occur while handling targets.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Assembly of the SoC failed.
    #[error(transparent)]
    Soc(#[from] SocError),

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON manifest error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendering an export failed.
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// I/O error reading/writing target files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Target file not found.
    #[error("target file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Neither a preset nor a target file has this name.
    #[error("unknown target '{name}'")]
    UnknownTarget {
        /// The requested target name.
        name: String,
    },

    /// Validation error in a target definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;

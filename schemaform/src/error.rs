//! Error types for the edges of the form engine.
//!
//! Expected form failures (validation messages, unsupported widgets, bad
//! dates) are modelled as data and never reach this type. [`FormError`] only
//! covers malformed input documents and I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = FormError> = std::result::Result<T, E>;

/// Errors raised while loading or parsing form definitions.
#[derive(Debug, Error)]
pub enum FormError {
    /// A schema keyword had the wrong JSON shape.
    #[error("invalid schema at `{path}`: expected {expected}, found {actual}")]
    Schema {
        path: String,
        expected: String,
        actual: String,
    },

    /// The presentation schema could not be decoded.
    #[error("invalid ui schema: {0}")]
    UiSchema(#[source] serde_json::Error),

    /// A JSON document failed to parse.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML document failed to parse.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is neither `json` nor `toml`.
    #[error("unsupported file extension {ext:?} for {}", path.display())]
    UnsupportedExtension { path: PathBuf, ext: String },

    /// A background file encoding task did not complete.
    #[error("file read task failed: {0}")]
    FileRead(#[from] tokio::task::JoinError),

    /// Reading a file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FormError {
    pub(crate) fn schema(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl std::fmt::Display,
    ) -> Self {
        FormError::Schema {
            path: path.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormError::Io {
            path: path.into(),
            source,
        }
    }
}

//! Error types for mdpack.
//!
//! Library crates use [`MdpackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Errors come in two tiers. [`MdpackError`] is what propagates to the top of
//! a run; [`ItemError`] is the per-file channel that the encoder returns and
//! the pipeline contains, so one bad file never aborts a pack.

use std::path::PathBuf;

/// Top-level error type for all mdpack operations.
#[derive(Debug, thiserror::Error)]
pub enum MdpackError {
    /// Invalid input root, missing settings, or unusable credentials.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The captioning service failed or returned an unusable payload.
    #[error("captioning error: {0}")]
    Collaborator(String),

    /// The manifest (or another output file) could not be written.
    #[error("output error at {path:?}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The manifest could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A tokenizer encoding could not be loaded.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Filesystem I/O error outside the per-file path (config, prompt files).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MdpackError>;

impl MdpackError {
    /// Create a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create a captioning error from any displayable message.
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Wrap a `std::io::Error` raised while writing output.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a tokenizer error from any displayable message.
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }
}

// ---------------------------------------------------------------------------
// Per-file errors
// ---------------------------------------------------------------------------

/// What went wrong while turning one file into a record.
#[derive(Debug, thiserror::Error)]
pub enum ItemErrorKind {
    /// Open, read, or UTF-8 decode failure.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Captioning call failed or returned nothing usable.
    #[error("captioning failed: {0}")]
    Collaborator(String),
}

/// A failure confined to a single file. The file is skipped; the run goes on.
#[derive(Debug, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct ItemError {
    /// Root-relative path of the offending file.
    pub path: String,
    pub kind: ItemErrorKind,
}

impl ItemError {
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            kind: ItemErrorKind::Read(source),
        }
    }

    pub fn collaborator(path: impl Into<String>, err: &MdpackError) -> Self {
        let message = match err {
            MdpackError::Collaborator(msg) => msg.clone(),
            other => other.to_string(),
        };
        Self {
            path: path.into(),
            kind: ItemErrorKind::Collaborator(message),
        }
    }
}

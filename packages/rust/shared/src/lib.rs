//! Shared types, error model, and configuration for mdpack.
//!
//! This crate is the foundation depended on by all other mdpack crates.
//! It provides:
//! - [`MdpackError`] and [`ItemError`] — the run-level and per-file error types
//! - Domain types ([`FileRecord`], [`Payload`])
//! - Configuration ([`AppConfig`], [`CaptioningConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CaptioningConfig, DEFAULT_INSTRUCTION, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key, validate_captioning,
};
pub use error::{ItemError, ItemErrorKind, MdpackError, Result};
pub use types::{FileRecord, MARKDOWN_MIME, Payload};

//! Shared types, error model, and configuration for readmegen.
//!
//! This crate is the foundation depended on by all other readmegen crates.
//! It provides:
//! - [`ReadmeGenError`] — the unified error type
//! - Domain types ([`RepositoryContext`], [`FileContext`], [`RepositoryMetadata`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, IngestionConfig, LlmConfig, MarkdownConfig, api_key_env, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{ReadmeGenError, Result};
pub use types::{FileContext, RepositoryContext, RepositoryMetadata};

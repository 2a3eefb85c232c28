//! Shared types, error model, and configuration for ArticleSync.
//!
//! This crate is the foundation depended on by all other ArticleSync crates.
//! It provides:
//! - [`ArticleSyncError`] — the unified error type
//! - Domain types ([`ArticleRef`], [`ArticleBatch`], [`ReferenceEntry`], [`Whitelist`])
//! - Configuration ([`AppConfig`], config loading and eager validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CozeConfig, PipelineConfig, ServerConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_token, validate_config,
};
pub use error::{ArticleSyncError, Result};
pub use types::{
    ArticleBatch, ArticleRef, ReferenceEntry, SN_QUERY_PARAM, Whitelist, article_sn,
    synthetic_id,
};

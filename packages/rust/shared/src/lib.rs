//! Shared types, error model, and configuration for docindex.
//!
//! This crate is the foundation depended on by all other docindex crates.
//! It provides:
//! - [`DocIndexError`], the unified error type
//! - Domain types ([`SearchIndex`], [`DocEntry`], [`Location`], [`Category`])
//! - Configuration ([`AppConfig`], [`SearchSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, SearchConfig, SearchSettings, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, validate_config,
};
pub use error::{DocIndexError, Result};
pub use types::{Category, DocEntry, Location, SearchIndex};

//! yp-harvest: a resumable business-directory harvester
//!
//! This crate walks the category tree of a yellow-pages directory, paginates
//! each subcategory listing, captures every company detail page once, and
//! persists progress in small batches so an interrupted run can pick up where
//! it stopped.

pub mod config;
pub mod crawler;
pub mod identity;
pub mod metadata;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] metadata::MetadataError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Extraction error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures to resolve a hierarchical navigation link by its label
///
/// These are fatal to a single category pair only.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Main category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Subcategory '{sub}' not found under '{main}'")]
    SubcategoryNotFound { main: String, sub: String },

    #[error("Could not load {url}: {reason}")]
    Unreachable { url: String, reason: String },
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use identity::{category_key, entity_key};
pub use metadata::CategoryTarget;
pub use state::{StopReason, TraversalPhase};
pub use storage::{EntityRecord, ProgressRecord};

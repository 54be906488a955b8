//! Marquee: a concurrent movie chart scraper
//!
//! This crate fetches a ranked listing page, follows every item's detail link
//! through a bounded pool of workers, extracts a fixed set of fields from each
//! detail page and appends the complete records to a CSV file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;

use thiserror::Error;

/// Main error type for Marquee operations
#[derive(Debug, Error)]
pub enum MarqueeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run cancelled before any item was dispatched")]
    Cancelled,
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

    #[error("Invalid selector for {name}: {message}")]
    InvalidSelector { name: String, message: String },
}

/// Errors raised while fetching a single page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Errors raised while appending to the record store
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Record store lock poisoned")]
    Poisoned,

    #[error("Write interrupted by runtime shutdown")]
    Interrupted,
}

/// Result type alias for Marquee operations
pub type Result<T> = std::result::Result<T, MarqueeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_scrape, Coordinator};
pub use output::RunSummary;
pub use record::{Field, ItemLink, PartialRecord, RawPage, ValidatedRecord};
pub use state::{ItemFailure, ItemOutcome, ItemState};

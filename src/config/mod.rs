//! Configuration module for Marquee
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so the scraper also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use marquee::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("marquee.toml")).unwrap();
//! println!("Scraper will use {} workers", config.scraper.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, ScraperConfig, SelectorConfig, UserAgentConfig, DEFAULT_LISTING_URL,
    DEFAULT_ORIGIN, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, read_config};
pub use validation::{compile_selector, validate};

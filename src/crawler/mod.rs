//! Crawler module for listing discovery and detail scraping
//!
//! This module contains the scrape pipeline:
//! - HTTP fetching with an explicit identity header
//! - Listing page parsing into item links
//! - Detail page field extraction
//! - A bounded pool of detail workers
//! - Overall run coordination

mod coordinator;
mod extractor;
mod fetcher;
mod listing;
mod pool;
mod worker;

pub use coordinator::{run_scrape, Coordinator};
pub use extractor::FieldExtractor;
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use listing::{fetch_listing, parse_listing, ListingSelectors};
pub use pool::WorkerPool;
pub use worker::DetailWorker;

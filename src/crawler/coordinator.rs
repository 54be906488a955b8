//! Scrape coordinator - main run orchestration logic
//!
//! This module contains the run loop that ties the pipeline together:
//! - Fetching the listing page and discovering item links
//! - Dispatching one detail worker task per link onto a bounded pool
//! - Joining every task and aggregating outcomes into a summary
//! - Halting the run when writes fail systematically
//! - Cooperative cancellation

use crate::config::Config;
use crate::crawler::extractor::FieldExtractor;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::listing::{fetch_listing, ListingSelectors};
use crate::crawler::pool::WorkerPool;
use crate::crawler::worker::DetailWorker;
use crate::output::{CsvSink, RecordSink, RunSummary};
use crate::state::{ItemFailure, ItemOutcome};
use crate::MarqueeError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Main scrape coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    listing: ListingSelectors,
    worker: Arc<DetailWorker>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator using HTTP for fetching and a CSV file for output
    ///
    /// # Arguments
    ///
    /// * `config` - The validated scraper configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MarqueeError)` - The HTTP client or a selector could not be built
    pub fn new(config: Config) -> Result<Self, MarqueeError> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config.scraper)?);
        let sink = Arc::new(CsvSink::new(&config.output.csv_path));
        Self::with_parts(config, fetcher, sink)
    }

    /// Creates a coordinator around caller-supplied fetcher and sink
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, MarqueeError> {
        let listing = ListingSelectors::new(&config.selectors)?;
        let extractor = Arc::new(FieldExtractor::new(&config.selectors)?);

        let worker = Arc::new(DetailWorker::new(
            Arc::clone(&fetcher),
            extractor,
            sink,
            config.user_agent.value.clone(),
            Duration::from_millis(config.scraper.max_jitter_ms),
        ));

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            listing,
            worker,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that cancels this coordinator's run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs one scrape of `listing_url`
    ///
    /// Listing-level failures abort before any worker is dispatched. Item-level
    /// failures are contained to their item and show up in the summary.
    pub async fn run(&self, listing_url: &str) -> Result<RunSummary, MarqueeError> {
        let start_time = Instant::now();
        tracing::info!("Starting scrape of {}", listing_url);

        let links = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            links = fetch_listing(
                self.fetcher.as_ref(),
                listing_url,
                &self.config.user_agent.value,
                &self.config.scraper.origin,
                &self.listing,
            ) => Some(links),
        };
        let links = match links {
            Some(links) => links?,
            None => return Err(MarqueeError::Cancelled),
        };

        let pool_size = (self.config.scraper.max_workers as usize).min(links.len());
        tracing::info!(
            "Found {} items, dispatching with {} workers",
            links.len(),
            pool_size
        );

        let mut summary = RunSummary::new(links.len(), pool_size);
        let mut pool = WorkerPool::new(pool_size);

        for link in links {
            let worker = Arc::clone(&self.worker);
            let cancel = self.cancel.clone();
            pool.spawn(async move { worker.process(link, &cancel).await });
        }

        let mut consecutive_sink_failures = 0u32;
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(outcome) => {
                    self.track_sink_health(&outcome, &mut consecutive_sink_failures);
                    summary.record(&outcome);
                }
                Err(e) => {
                    tracing::error!("Worker task terminated abnormally: {}", e);
                    summary.record_aborted();
                }
            }
        }

        summary.elapsed = start_time.elapsed();
        summary.log_summary();

        Ok(summary)
    }

    /// Cancels the run once writes have failed too many times in a row
    fn track_sink_health(&self, outcome: &ItemOutcome, consecutive: &mut u32) {
        match &outcome.failure {
            None => *consecutive = 0,
            Some(ItemFailure::Sink(_)) => {
                *consecutive += 1;
                let limit = self.config.scraper.max_sink_failures;
                if *consecutive >= limit && !self.cancel.is_cancelled() {
                    tracing::error!(
                        "{} consecutive write failures (last: {}), halting run",
                        consecutive,
                        outcome.link
                    );
                    self.cancel.cancel();
                }
            }
            Some(_) => {}
        }
    }
}

/// Runs a complete scrape of the configured listing page
///
/// # Example
///
/// ```no_run
/// use marquee::config::Config;
/// use marquee::crawler::run_scrape;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_scrape(Config::default()).await?;
/// println!("{} records saved", summary.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(config: Config) -> Result<RunSummary, MarqueeError> {
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config)?;
    coordinator.run(&listing_url).await
}

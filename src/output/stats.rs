//! Run summary statistics
//!
//! Aggregates worker outcomes so that partial failure is visible at the end of
//! a run instead of only in the per-item log lines.

use crate::state::{ItemFailure, ItemOutcome};
use std::time::Duration;

/// Counts of item outcomes for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Item links found on the listing page
    pub links_found: usize,

    /// Effective pool size, `min(max_workers, links_found)`
    pub pool_size: usize,

    /// Records written to the output store
    pub saved: usize,

    /// Items dropped because a required field was missing
    pub skipped_missing: usize,

    /// Items whose detail page could not be fetched
    pub fetch_failed: usize,

    /// Items whose record could not be written
    pub sink_failed: usize,

    /// Items abandoned because the run was cancelled
    pub cancelled: usize,

    /// Worker tasks that panicked
    pub aborted: usize,

    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(links_found: usize, pool_size: usize) -> Self {
        Self {
            links_found,
            pool_size,
            ..Self::default()
        }
    }

    /// Adds one worker outcome to the counts
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match &outcome.failure {
            None => self.saved += 1,
            Some(ItemFailure::MissingFields(_)) => self.skipped_missing += 1,
            Some(ItemFailure::Fetch(_)) => self.fetch_failed += 1,
            Some(ItemFailure::Sink(_)) => self.sink_failed += 1,
            Some(ItemFailure::Cancelled) => self.cancelled += 1,
        }
    }

    /// Counts a worker task that terminated without reporting an outcome
    pub fn record_aborted(&mut self) {
        self.aborted += 1;
    }

    /// Items that reached a terminal state
    pub fn completed(&self) -> usize {
        self.saved + self.failed()
    }

    /// Items that ended in `Failed`, for any reason
    pub fn failed(&self) -> usize {
        self.skipped_missing + self.fetch_failed + self.sink_failed + self.cancelled + self.aborted
    }

    /// Returns the success rate as a percentage of completed items
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        (self.saved as f64 / completed as f64) * 100.0
    }

    /// Writes the summary to the log stream
    pub fn log_summary(&self) {
        tracing::info!(
            "Run summary: {} links, {} saved, {} skipped (missing data), {} fetch errors, {} write errors, {} cancelled, {} aborted",
            self.links_found,
            self.saved,
            self.skipped_missing,
            self.fetch_failed,
            self.sink_failed,
            self.cancelled,
            self.aborted
        );
        tracing::info!("Total time taken: {:.2} seconds", self.elapsed.as_secs_f64());
    }

    /// Prints the summary to stdout in a formatted manner
    pub fn print_summary(&self) {
        println!("=== Scrape Summary ===\n");
        println!("  Links found: {}", self.links_found);
        println!("  Workers: {}", self.pool_size);
        println!("  Saved: {}", self.saved);
        println!("  Skipped (missing data): {}", self.skipped_missing);
        println!("  Fetch errors: {}", self.fetch_failed);
        println!("  Write errors: {}", self.sink_failed);
        if self.cancelled > 0 {
            println!("  Cancelled: {}", self.cancelled);
        }
        if self.aborted > 0 {
            println!("  Aborted: {}", self.aborted);
        }
        println!();
        println!(
            "Success Rate: {:.1}% ({} / {} items saved) in {:.2}s",
            self.success_rate(),
            self.saved,
            self.completed(),
            self.elapsed.as_secs_f64()
        );
    }
}

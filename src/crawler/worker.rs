//! Per-item detail worker
//!
//! Drives one [`ItemLink`] through fetch, extraction, validation and
//! persistence. Every failure is contained to the item: it is logged, the
//! item is dropped, and the outcome is reported back to the coordinator.

use crate::crawler::extractor::FieldExtractor;
use crate::crawler::fetcher::PageFetcher;
use crate::output::RecordSink;
use crate::record::{Field, ItemLink, RawPage, ValidatedRecord};
use crate::state::{ItemFailure, ItemOutcome, ItemState};
use crate::{FetchError, SinkError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Composes fetcher, extractor and sink for one item at a time
///
/// A single worker is shared by every task in the pool; it holds no
/// per-item state of its own.
pub struct DetailWorker {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<FieldExtractor>,
    sink: Arc<dyn RecordSink>,
    user_agent: String,
    max_jitter: Duration,
}

impl DetailWorker {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<FieldExtractor>,
        sink: Arc<dyn RecordSink>,
        user_agent: impl Into<String>,
        max_jitter: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            sink,
            user_agent: user_agent.into(),
            max_jitter,
        }
    }

    /// Processes one item to a terminal state
    ///
    /// Cancellation is honored until the page has been fetched; after that the
    /// item runs to completion so a started write is never abandoned.
    pub async fn process(&self, link: ItemLink, cancel: &CancellationToken) -> ItemOutcome {
        let mut state = ItemState::Pending;

        if cancel.is_cancelled() {
            return fail(link, &mut state, ItemFailure::Cancelled);
        }

        advance(&link, &mut state, ItemState::Fetching);
        tracing::info!("Fetching details for: {}", link);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.fetch_with_jitter(&link) => Some(result),
        };

        let page = match fetched {
            None => {
                tracing::debug!("Cancelled before fetching {}", link);
                return fail(link, &mut state, ItemFailure::Cancelled);
            }
            Some(Ok(page)) => page,
            Some(Err(e)) => {
                tracing::error!("Error fetching details for {}: {}", link, e);
                return fail(link, &mut state, ItemFailure::Fetch(e));
            }
        };

        advance(&link, &mut state, ItemState::Extracting);
        let partial = self.extractor.extract(&page);
        drop(page);

        advance(&link, &mut state, ItemState::Validating);
        let record = match partial.validate() {
            Ok(record) => record,
            Err(missing) => {
                tracing::warn!(
                    "No movie data found for: {} (missing {})",
                    link,
                    missing
                        .iter()
                        .map(Field::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                return fail(link, &mut state, ItemFailure::MissingFields(missing));
            }
        };

        advance(&link, &mut state, ItemState::Persisting);
        let title = record.title().to_string();
        match self.persist(record).await {
            Ok(()) => {
                advance(&link, &mut state, ItemState::Done);
                tracing::info!("Movie details saved for: {}", title);
                ItemOutcome::done(link)
            }
            Err(e) => {
                tracing::error!("Failed to save details for {}: {}", link, e);
                fail(link, &mut state, ItemFailure::Sink(e))
            }
        }
    }

    /// Appends the record on the blocking pool
    ///
    /// Sink writes are synchronous file I/O and must not stall the runtime's
    /// worker threads.
    async fn persist(&self, record: ValidatedRecord) -> Result<(), SinkError> {
        let sink = Arc::clone(&self.sink);
        match tokio::task::spawn_blocking(move || sink.append(&record)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(SinkError::Interrupted),
        }
    }

    /// Sleeps for a random politeness delay, then fetches the page
    async fn fetch_with_jitter(&self, link: &ItemLink) -> Result<RawPage, FetchError> {
        let jitter = random_jitter(self.max_jitter);
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }
        self.fetcher.fetch(link.as_str(), &self.user_agent).await
    }
}

/// Uniform delay in `0..=max`, millisecond granularity
fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(fastrand::u64(0..=max_ms))
}

fn advance(link: &ItemLink, state: &mut ItemState, next: ItemState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid item transition {} -> {}",
        state,
        next
    );
    tracing::trace!("{}: {} -> {}", link, state, next);
    *state = next;
}

fn fail(link: ItemLink, state: &mut ItemState, failure: ItemFailure) -> ItemOutcome {
    advance(&link, state, ItemState::Failed);
    ItemOutcome::failed(link, failure)
}

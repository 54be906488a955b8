//! State module for tracking item progress
//!
//! # Components
//!
//! - `ItemState`: Tracks one item through fetch, extraction, validation and persistence
//! - `ItemFailure`: Why an item ended in `Failed`
//! - `ItemOutcome`: What a worker reports back to the coordinator

mod item_state;

pub use item_state::ItemState;

use crate::record::{Field, ItemLink};
use crate::{FetchError, SinkError};
use std::fmt;

/// Reason an item was dropped
#[derive(Debug)]
pub enum ItemFailure {
    /// The detail page could not be fetched
    Fetch(FetchError),

    /// One or more required fields were absent after extraction
    MissingFields(Vec<Field>),

    /// The validated record could not be written
    Sink(SinkError),

    /// The run was cancelled before the item got past fetching
    Cancelled,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{}", e),
            Self::MissingFields(fields) => {
                let names: Vec<&str> = fields.iter().map(Field::as_str).collect();
                write!(f, "missing fields: {}", names.join(", "))
            }
            Self::Sink(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of one worker run
#[derive(Debug)]
pub struct ItemOutcome {
    pub link: ItemLink,
    pub state: ItemState,
    pub failure: Option<ItemFailure>,
}

impl ItemOutcome {
    pub fn done(link: ItemLink) -> Self {
        Self {
            link,
            state: ItemState::Done,
            failure: None,
        }
    }

    pub fn failed(link: ItemLink, failure: ItemFailure) -> Self {
        Self {
            link,
            state: ItemState::Failed,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }
}

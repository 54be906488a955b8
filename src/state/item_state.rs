/// Item state definitions for tracking a single detail page through a worker
///
/// Every item moves `Pending -> Fetching -> Extracting -> Validating -> Persisting -> Done`,
/// or drops to `Failed` from any non-terminal state.
use std::fmt;

/// Represents the current state of one item in the scrape pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Dispatched to the pool, waiting for a worker slot
    Pending,

    /// Detail page request in flight (including the jitter delay)
    Fetching,

    /// Locating fields in the fetched markup
    Extracting,

    /// Checking that every required field is present
    Validating,

    /// Handing the validated record to the sink
    Persisting,

    // ===== Terminal States =====
    /// Record was written to the output store
    Done,

    /// Item was dropped; see the accompanying failure
    Failed,
}

impl ItemState {
    /// Returns true if no further processing will happen for the item
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the item finished with a persisted record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` follows the worker lifecycle
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Fetching)
            | (Self::Fetching, Self::Extracting)
            | (Self::Extracting, Self::Validating)
            | (Self::Validating, Self::Persisting)
            | (Self::Persisting, Self::Done) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

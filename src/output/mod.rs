//! Output module for persisting records and reporting runs
//!
//! This module handles:
//! - Encoding records as CSV rows
//! - Appending rows to the shared output file without interleaving
//! - Summarizing per-item outcomes at the end of a run

pub mod csv;
mod sink;
pub mod stats;

pub use sink::{CsvSink, RecordSink};
pub use stats::RunSummary;

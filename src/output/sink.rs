//! Record sinks
//!
//! The output store is the only state shared between workers, so every
//! append goes through a [`RecordSink`] that serializes writers. A row is
//! either written whole or not at all.

use crate::output::csv::encode_row;
use crate::record::ValidatedRecord;
use crate::SinkError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only store for validated records
///
/// Implementations must be safe to call from many workers at once and must
/// never expose a partially written row.
pub trait RecordSink: Send + Sync {
    /// Appends one record
    fn append(&self, record: &ValidatedRecord) -> Result<(), SinkError>;
}

/// CSV file sink
///
/// The file is opened (created if absent, appended to if present) on the
/// first append, so a run that never produces a record leaves it untouched.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl RecordSink for CsvSink {
    fn append(&self, record: &ValidatedRecord) -> Result<(), SinkError> {
        let row = encode_row(&record.fields());

        let mut guard = self.file.lock().map_err(|_| SinkError::Poisoned)?;

        let file = match guard.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| self.io_error(e))?,
        };
        let file = guard.insert(file);

        let len_before = file.metadata().map_err(|e| self.io_error(e))?.len();

        write_whole_row(file, row.as_bytes(), len_before).map_err(|e| self.io_error(e))
    }
}

/// Output that can be cut back to an earlier length
trait Truncate {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;
}

impl Truncate for File {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

/// Writes `row` in full, or cuts `out` back to `len_before` on failure
fn write_whole_row<W: Write + Truncate>(
    out: &mut W,
    row: &[u8],
    len_before: u64,
) -> std::io::Result<()> {
    if let Err(e) = out.write_all(row).and_then(|_| out.flush()) {
        // Drop whatever part of the row made it to disk
        if let Err(truncate_err) = out.truncate_to(len_before) {
            tracing::error!("Failed to roll back partial row: {}", truncate_err);
        }
        return Err(e);
    }
    Ok(())
}

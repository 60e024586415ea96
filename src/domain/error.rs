use thiserror::Error;

// ─── Per-entry errors (recovered locally) ────────────────────────────────────

/// One malformed record among many. The record is dropped and the batch
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryParseError {
    #[error("entry has an empty name")]
    EmptyName,
    #[error("entry {name:?} has an empty price")]
    EmptyPrice { name: String },
    #[error("entry {name:?} has an unparseable price {raw:?}")]
    InvalidPrice { name: String, raw: String },
    #[error("entry {name:?} has a negative price {raw:?}")]
    NegativePrice { name: String, raw: String },
    #[error("feed entry {title:?} has no variants")]
    NoVariants { title: String },
    #[error("feed entry has an unexpected shape: {0}")]
    MalformedEntry(String),
}

// ─── Per-batch errors (terminal for the run) ─────────────────────────────────

/// Upstream unreachable, or the payload as a whole cannot be trusted.
///
/// Any of these short-circuits the run before the sink is touched or the
/// snapshot is replaced.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    #[error("payload is not valid {expected}: {detail}")]
    MalformedPayload {
        expected: &'static str,
        detail: String,
    },
    #[error("page structure check failed: marker {marker:?} not found")]
    StructureCheckFailed { marker: String },
    #[error("all {rejected} entries in the payload were rejected")]
    AllEntriesRejected { rejected: usize },
}

// ─── Snapshot store errors ───────────────────────────────────────────────────

/// Prior snapshot could not be read. Recovered by treating the snapshot as
/// empty, which classifies every product as new.
#[derive(Debug, Error)]
pub enum SnapshotReadError {
    #[error("no snapshot stored yet")]
    Missing,
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),
    #[error("snapshot fingerprint mismatch (stored {stored}, computed {computed})")]
    FingerprintMismatch { stored: String, computed: String },
    #[error("snapshot read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("snapshot write failed: {0}")]
pub struct SnapshotWriteError(pub String);

// ─── Sink errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("tabular sink write failed: {0}")]
pub struct SinkWriteError(pub String);

// ─── Run-level error ─────────────────────────────────────────────────────────

/// Terminal outcome of a failed run for one source.
///
/// Only `SnapshotWrite` can happen after the sink accepted the sheet; every
/// other variant guarantees the stored snapshot is untouched.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Sink(#[from] SinkWriteError),
    #[error(transparent)]
    SnapshotWrite(#[from] SnapshotWriteError),
    /// The task running this source panicked or was cancelled.
    #[error("run aborted: {0}")]
    Aborted(String),
}

impl RunError {
    /// Short machine-friendly label for summaries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::Batch(_) => "batch",
            RunError::Sink(_) => "sink",
            RunError::SnapshotWrite(_) => "snapshot_write",
            RunError::Aborted(_) => "aborted",
        }
    }
}

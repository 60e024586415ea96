use crate::domain::{
    annotation::DiffOutcome,
    error::{BatchError, SinkWriteError, SnapshotReadError, SnapshotWriteError},
    product::{ParseOutcome, Product},
    sheet::SheetDocument,
    snapshot::Snapshot,
    value_objects::SourceName,
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: raw page/feed retrieval (implemented by FilePageFetcher).
///
/// Retry, backoff and anti-bot handling belong to implementations, never to
/// the pipeline.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceName, location: &str) -> Result<Vec<u8>, BatchError>;
}

/// Port: raw payload → raw listings (implemented by OptionListParser, ProductFeedParser)
pub trait SourceParser: Send + Sync {
    /// Malformed entries end up in `ParseOutcome::rejected`; only a payload
    /// that cannot be trusted as a whole is an `Err`.
    fn parse(&self, raw: &[u8]) -> Result<ParseOutcome, BatchError>;
    /// Short name used in logs ("option_list", "product_feed").
    fn kind(&self) -> &'static str;
}

/// Port: snapshot diff algorithm (implemented by SnapshotDiffer)
pub trait Differ: Send + Sync {
    fn diff(&self, current: Vec<Product>, prior: &Snapshot) -> DiffOutcome;
}

/// Port: persisted prior snapshot, one per source (implemented by
/// JsonSnapshotStore and MapSnapshotStore)
pub trait SnapshotStore: Send + Sync {
    /// All-or-nothing read.
    fn load(&self, source: &SourceName) -> Result<Snapshot, SnapshotReadError>;
    /// Wholesale replacement.
    fn commit(&self, source: &SourceName, snapshot: &Snapshot) -> Result<(), SnapshotWriteError>;
}

/// Port: the external spreadsheet backend (implemented by FileSheetSink)
#[async_trait]
pub trait TabularSink: Send + Sync {
    async fn write(&self, source: &SourceName, sheet: &SheetDocument) -> Result<(), SinkWriteError>;
}

/// Port: sheet serialisation (implemented by JsonWriter, HtmlWriter)
pub trait SheetWriter: Send + Sync {
    /// Serializes the sheet to a string (JSON, HTML, etc.)
    fn format(&self, source: &SourceName, sheet: &SheetDocument) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "html")
    fn extension(&self) -> &'static str;
}

use anyhow::{anyhow, Result};
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
mod test_support;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of pricewatch's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                                |
/// |---------|-----------------|--------------------------------------------|
/// | `Error` | `error`         | `--quiet` / cron jobs                      |
/// | `Info`  | `info`          | Default: per-stage timings and run results |
/// | `Debug` | `debug`         | `--verbose`: every skipped entry too       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for pricewatch.
///
/// It respects `RUST_LOG` when set, falling back to `level` otherwise.
/// Library consumers who manage their own subscriber should skip this.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "pricewatch=error",
        LogLevel::Info => "pricewatch=info",
        LogLevel::Debug => "pricewatch=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::monitoring::PerfReport;
pub use application::pipeline::{process, run_all, PipelineService, RunReport, SourceJob};
pub use domain::annotation::{AnnotatedRow, ChangeKind, ChangeSummary, DiffOutcome, RowAnnotation};
pub use domain::error::{BatchError, EntryParseError, RunError, SnapshotReadError};
pub use domain::fingerprint::fingerprint;
pub use domain::product::{Availability, Product};
pub use domain::sheet::{CellValue, SheetDocument};
pub use domain::snapshot::{MapSnapshotStore, Snapshot};
pub use domain::value_objects::{Fingerprint, IdentityKey, SourceName};
pub use infrastructure::config::{AppConfig, OutputConfig, SourceConfig, SourceKind, StateConfig};

use crate::application::diff::SnapshotDiffer;
use crate::application::monitoring::{MonitoringDiffer, MonitoringFetcher};
use crate::domain::ports::{PageFetcher, SnapshotStore, TabularSink};
use crate::infrastructure::{
    fetch::FilePageFetcher, sink::FileSheetSink, snapshot_store::JsonSnapshotStore,
};
use crate::presentation::writers::writers_for_format;

// ─── Public entry points ───

/// What to run and how.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
    /// Only this source (by configured name).
    pub source: Option<String>,
    /// `"all"`, `"json"` or `"html"`.
    pub format: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            source: None,
            format: "all".to_string(),
        }
    }
}

/// Run every selected source concurrently.
///
/// The outer `Result` only fails on setup problems (unknown source, unknown
/// format). Per-source failures come back in the vector, in config order.
pub async fn run(
    cfg: &AppConfig,
    opts: &RunOptions,
) -> Result<Vec<(SourceName, std::result::Result<RunReport, RunError>)>> {
    let selected: Vec<&SourceConfig> = match &opts.source {
        Some(name) => vec![cfg
            .source(name)
            .ok_or_else(|| anyhow!("Unknown source: {}", name))?],
        None => cfg.sources.iter().collect(),
    };

    let store: Arc<dyn SnapshotStore> = Arc::new(JsonSnapshotStore::new(cfg.state_dir()));
    let sink: Arc<dyn TabularSink> = Arc::new(FileSheetSink::new(
        cfg.output_dir(),
        writers_for_format(&opts.format)?,
    ));
    let fetcher: Arc<dyn PageFetcher> = Arc::new(FilePageFetcher::new());

    let mut runs = Vec::with_capacity(selected.len());
    for source in selected {
        let job = source.job(&cfg.base_dir)?;
        let service = build_service(
            source,
            Arc::clone(&fetcher),
            Arc::clone(&store),
            Arc::clone(&sink),
        )?;
        runs.push((Arc::new(service), job));
    }

    Ok(run_all(runs, opts.dry_run).await)
}

/// Run a single configured source.
pub async fn run_source(
    cfg: &AppConfig,
    name: &str,
    dry_run: bool,
) -> Result<std::result::Result<RunReport, RunError>> {
    let opts = RunOptions {
        dry_run,
        source: Some(name.to_string()),
        ..Default::default()
    };
    run(cfg, &opts)
        .await?
        .pop()
        .map(|(_, result)| result)
        .ok_or_else(|| anyhow!("Unknown source: {}", name))
}

// ─── Private helpers ───────────────────────────────────────────────────────────

/// Wire one source's parser with shared I/O adapters, wrapped in the
/// monitoring decorators.
///
/// Each source gets its own `PerfReport`, so its run report only carries its
/// own timings.
fn build_service(
    source: &SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn SnapshotStore>,
    sink: Arc<dyn TabularSink>,
) -> Result<PipelineService> {
    let report = PerfReport::new();
    let fetcher = Arc::new(MonitoringFetcher::new(fetcher, Arc::clone(&report)));
    let differ = Arc::new(MonitoringDiffer::new(
        Arc::new(SnapshotDiffer::new()),
        source.source_name(),
        Arc::clone(&report),
    ));
    Ok(PipelineService::new(
        fetcher,
        source.parser()?,
        differ,
        store,
        sink,
        report,
    ))
}

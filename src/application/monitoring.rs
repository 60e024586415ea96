use crate::domain::annotation::DiffOutcome;
use crate::domain::error::BatchError;
use crate::domain::ports::{Differ, PageFetcher};
use crate::domain::product::Product;
use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::SourceName;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed stage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Stage name: "fetch", "parse", "diff", "compile" or "sink_write".
    pub operation: &'static str,
    /// Source this stage ran for.
    pub source: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Items involved: bytes for "fetch", products or rows otherwise.
    pub items: usize,
}

/// Accumulated performance timings for a pricewatch run.
///
/// Shared between the decorators and the pipeline via `Arc<Mutex<_>>`.
/// After the run, pass to [`crate::presentation::cli_summary::print_perf_summary`]
/// to render a human-readable table.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_bytes_fetched: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    pub(crate) fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.operation == "fetch" {
                r.total_bytes_fetched += timing.items;
            }
            r.timings.push(timing);
        }
    }

    /// Copy of the timings gathered so far. A poisoned lock yields an empty
    /// report rather than failing the run.
    pub fn collect(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Merge another report in (used when aggregating several sources).
    pub fn absorb(&mut self, other: PerfReport) {
        self.total_ms += other.total_ms;
        self.total_bytes_fetched += other.total_bytes_fetched;
        self.timings.extend(other.timings);
    }
}

/// Times `f` and records it under `operation` for `source`.
pub(crate) fn timed<T>(
    report: &Arc<Mutex<PerfReport>>,
    operation: &'static str,
    source: &SourceName,
    f: impl FnOnce() -> T,
    items: impl FnOnce(&T) -> usize,
) -> T {
    let start = Instant::now();
    let out = f();
    let duration_ms = start.elapsed().as_millis();
    PerfReport::record(
        report,
        OpTiming {
            operation,
            source: source.0.clone(),
            duration_ms,
            items: items(&out),
        },
    );
    out
}

// ─── MonitoringFetcher ───────────────────────────────────────────────────────

/// Decorator: wraps any `PageFetcher`, measures wall time per `fetch` call,
/// and appends the result to the shared `PerfReport`.
pub struct MonitoringFetcher {
    inner: Arc<dyn PageFetcher>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl PageFetcher for MonitoringFetcher {
    #[instrument(
        name = "fetch",
        skip(self, source, location),
        fields(catalog.source = %source, catalog.location = %location),
        level = "info"
    )]
    async fn fetch(&self, source: &SourceName, location: &str) -> Result<Vec<u8>, BatchError> {
        let start = Instant::now();
        let body = self.inner.fetch(source, location).await?;
        let duration_ms = start.elapsed().as_millis();

        info!(source = %source, bytes = body.len(), duration_ms, "fetch completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "fetch",
                source: source.0.clone(),
                duration_ms,
                items: body.len(),
            },
        );

        Ok(body)
    }
}

// ─── MonitoringDiffer ────────────────────────────────────────────────────────

/// Decorator: wraps any `Differ`, measures wall time per `diff` call, and
/// appends the result to the shared `PerfReport`.
///
/// Built per source, since the port itself carries no source name.
pub struct MonitoringDiffer {
    inner: Arc<dyn Differ>,
    source: SourceName,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringDiffer {
    pub fn new(inner: Arc<dyn Differ>, source: SourceName, report: Arc<Mutex<PerfReport>>) -> Self {
        Self {
            inner,
            source,
            report,
        }
    }
}

impl Differ for MonitoringDiffer {
    #[instrument(
        name = "diff",
        skip(self, current, prior),
        fields(
            catalog.source = %self.source,
            current.products = current.len(),
            prior.products = prior.len(),
        ),
        level = "info"
    )]
    fn diff(&self, current: Vec<Product>, prior: &Snapshot) -> DiffOutcome {
        let start = Instant::now();
        let products = current.len();
        let prior_len = prior.len();
        let result = self.inner.diff(current, prior);
        let duration_ms = start.elapsed().as_millis();

        let changes = result.summary.total_changes();
        info!(source = %self.source, products, prior = prior_len, changes, duration_ms, "diff completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "diff",
                source: self.source.0.clone(),
                duration_ms,
                items: products,
            },
        );

        result
    }
}

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::canonical::canonicalize_all;
use crate::application::dedup::dedup_and_sort;
use crate::application::monitoring::{timed, OpTiming, PerfReport};
use crate::domain::{
    annotation::{ChangeSummary, DiffOutcome},
    error::{BatchError, EntryParseError, RunError, SnapshotReadError},
    layout::{ColumnSchema, Palette},
    ports::{Differ, PageFetcher, SnapshotStore, SourceParser, TabularSink},
    product::Product,
    sheet::SheetDocument,
    snapshot::Snapshot,
    value_objects::SourceName,
};
use crate::presentation::compiler::compile;

// ─── Source job ──────────────────────────────────────────────────────────────

/// Everything one source's run needs besides the ports: where to fetch from
/// and how to lay the sheet out.
#[derive(Debug, Clone)]
pub struct SourceJob {
    pub name: SourceName,
    /// Passed verbatim to the fetcher (a path or URL).
    pub location: String,
    pub schema: ColumnSchema,
    pub palette: Palette,
    pub currency_symbol: String,
}

// ─── Run report ──────────────────────────────────────────────────────────────

/// Outcome of one successful run for one source.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: SourceName,
    pub finished_at: DateTime<Utc>,
    pub product_count: usize,
    /// Entries dropped while parsing or canonicalizing.
    pub rejected_entries: usize,
    pub summary: ChangeSummary,
    /// Sink write and snapshot commit were skipped.
    pub dry_run: bool,
    pub perf: PerfReport,
}

// ─── Pure core ───────────────────────────────────────────────────────────────

/// Parsed, canonical, deduplicated and sorted products of one payload.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub products: Vec<Product>,
    pub rejected: Vec<EntryParseError>,
}

/// Output of [`process`].
#[derive(Debug, Clone)]
pub struct Processed {
    pub sheet: SheetDocument,
    pub outcome: DiffOutcome,
    pub rejected: Vec<EntryParseError>,
}

/// Parse → canonicalize → dedup/sort. No I/O.
pub fn prepare(parser: &dyn SourceParser, raw: &[u8]) -> Result<Prepared, BatchError> {
    let parsed = parser.parse(raw)?;
    let mut rejected = parsed.rejected;
    let (products, dropped) = canonicalize_all(parsed.listings);
    rejected.extend(dropped);
    Ok(Prepared {
        products: dedup_and_sort(products),
        rejected,
    })
}

/// The whole pipeline minus fetch, sink and snapshot persistence.
///
/// Deterministic for a given payload, prior snapshot and timestamp.
pub fn process(
    parser: &dyn SourceParser,
    differ: &dyn Differ,
    raw: &[u8],
    prior: &Snapshot,
    job: &SourceJob,
    updated_at: NaiveDateTime,
) -> Result<Processed, BatchError> {
    let prepared = prepare(parser, raw)?;
    let outcome = differ.diff(prepared.products, prior);
    let sheet = compile(
        &outcome.rows,
        &job.schema,
        &job.palette,
        &job.currency_symbol,
        updated_at,
    );
    Ok(Processed {
        sheet,
        outcome,
        rejected: prepared.rejected,
    })
}

// ─── Pipeline Service ────────────────────────────────────────────────────────

pub struct PipelineService {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn SourceParser>,
    differ: Arc<dyn Differ>,
    store: Arc<dyn SnapshotStore>,
    sink: Arc<dyn TabularSink>,
    report: Arc<Mutex<PerfReport>>,
}

impl PipelineService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn SourceParser>,
        differ: Arc<dyn Differ>,
        store: Arc<dyn SnapshotStore>,
        sink: Arc<dyn TabularSink>,
        report: Arc<Mutex<PerfReport>>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            differ,
            store,
            sink,
            report,
        }
    }

    /// One full run for `job`.
    ///
    /// The snapshot is committed only after the sink accepted the sheet, so
    /// any failure before that leaves the last-known-good snapshot in place.
    pub async fn run(&self, job: &SourceJob, dry_run: bool) -> Result<RunReport, RunError> {
        let source = &job.name;
        let run_id = Uuid::new_v4().to_string();
        info!(%source, %run_id, parser = self.parser.kind(), dry_run, "run started");

        let raw = self.fetcher.fetch(source, &job.location).await.map_err(|e| {
            warn!(%source, error = %e, "fetch failed");
            e
        })?;

        let prepared = timed(
            &self.report,
            "parse",
            source,
            || prepare(self.parser.as_ref(), &raw),
            |r| r.as_ref().map_or(0, |p| p.products.len()),
        )
        .map_err(|e| {
            warn!(%source, error = %e, "payload rejected");
            e
        })?;
        let rejected_entries = prepared.rejected.len();
        if rejected_entries > 0 {
            warn!(%source, dropped = rejected_entries, "malformed entries dropped");
        }

        let prior = self.load_prior(source);
        let outcome = self.differ.diff(prepared.products, &prior);

        let sheet = timed(
            &self.report,
            "compile",
            source,
            || {
                compile(
                    &outcome.rows,
                    &job.schema,
                    &job.palette,
                    &job.currency_symbol,
                    Local::now().naive_local(),
                )
            },
            |s| s.rows.len(),
        );

        if dry_run {
            info!(%source, rows = sheet.rows.len(), "dry run: sink and snapshot untouched");
        } else {
            let start = Instant::now();
            self.sink.write(source, &sheet).await.map_err(|e| {
                warn!(%source, error = %e, "sink write failed; snapshot kept");
                e
            })?;
            PerfReport::record(
                &self.report,
                OpTiming {
                    operation: "sink_write",
                    source: source.0.clone(),
                    duration_ms: start.elapsed().as_millis(),
                    items: sheet.rows.len(),
                },
            );

            self.store
                .commit(source, &outcome.next_snapshot)
                .map_err(|e| {
                    error!(%source, error = %e, "sheet written but snapshot commit failed");
                    e
                })?;
        }

        let summary = outcome.summary;
        info!(
            %source,
            products = outcome.rows.len(),
            new = summary.new,
            increased = summary.increased,
            decreased = summary.decreased,
            removed = summary.removed.len(),
            "run completed"
        );

        Ok(RunReport {
            run_id,
            source: source.clone(),
            finished_at: Utc::now(),
            product_count: outcome.rows.len(),
            rejected_entries,
            summary,
            dry_run,
            perf: PerfReport::collect(&self.report),
        })
    }

    /// Missing or unreadable snapshots degrade to empty: every product is new.
    fn load_prior(&self, source: &SourceName) -> Snapshot {
        match self.store.load(source) {
            Ok(snapshot) => snapshot,
            Err(SnapshotReadError::Missing) => {
                info!(%source, "no prior snapshot; every product is new");
                Snapshot::new()
            }
            Err(e) => {
                warn!(%source, error = %e, "prior snapshot unreadable; treating as empty");
                Snapshot::new()
            }
        }
    }
}

/// Runs every `(service, job)` pair on its own tokio task.
///
/// Sources are independent: one failure never blocks or cancels another.
/// Results come back in input order.
pub async fn run_all(
    runs: Vec<(Arc<PipelineService>, SourceJob)>,
    dry_run: bool,
) -> Vec<(SourceName, Result<RunReport, RunError>)> {
    let mut handles = Vec::with_capacity(runs.len());
    for (service, job) in runs {
        let name = job.name.clone();
        let handle = tokio::spawn(async move { service.run(&job, dry_run).await });
        handles.push((name, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(source = %name, error = %e, "run task aborted");
                Err(RunError::Aborted(e.to_string()))
            }
        };
        results.push((name, result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diff::SnapshotDiffer;
    use crate::application::parsers::OptionListParser;
    use crate::domain::error::{SinkWriteError, SnapshotWriteError};
    use crate::domain::sheet::CellValue;
    use crate::domain::snapshot::MapSnapshotStore;
    use crate::domain::value_objects::IdentityKey;
    use crate::test_support::dec;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StaticFetcher(String);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _: &SourceName, _: &str) -> Result<Vec<u8>, BatchError> {
            Ok(self.0.clone().into_bytes())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sheets: Mutex<Vec<SheetDocument>>,
        fail: bool,
    }

    #[async_trait]
    impl TabularSink for RecordingSink {
        async fn write(&self, _: &SourceName, sheet: &SheetDocument) -> Result<(), SinkWriteError> {
            if self.fail {
                return Err(SinkWriteError("quota exceeded".into()));
            }
            self.sheets.lock().unwrap().push(sheet.clone());
            Ok(())
        }
    }

    fn page(values: &[&str]) -> String {
        let options: String = values
            .iter()
            .map(|v| format!(r#"<option value="{v}">{v}</option>"#))
            .collect();
        format!("<html><body><select>{options}</select></body></html>")
    }

    fn job() -> SourceJob {
        SourceJob {
            name: SourceName("Mamedica".into()),
            location: "page.html".into(),
            schema: ColumnSchema::from_columns(&ColumnSchema::option_list_columns()).unwrap(),
            palette: Palette::default(),
            currency_symbol: "£".into(),
        }
    }

    /// In-memory store that can be told to fail on either side.
    #[derive(Default)]
    struct UnreliableStore {
        inner: MapSnapshotStore,
        load_error: Option<fn() -> SnapshotReadError>,
        fail_commit: bool,
    }

    impl SnapshotStore for UnreliableStore {
        fn load(&self, source: &SourceName) -> Result<Snapshot, SnapshotReadError> {
            match self.load_error {
                Some(error) => Err(error()),
                None => self.inner.load(source),
            }
        }

        fn commit(&self, source: &SourceName, snapshot: &Snapshot) -> Result<(), SnapshotWriteError> {
            if self.fail_commit {
                return Err(SnapshotWriteError("disk full".into()));
            }
            self.inner.commit(source, snapshot)
        }
    }

    fn service(
        body: String,
        store: Arc<dyn SnapshotStore>,
        sink: Arc<RecordingSink>,
    ) -> PipelineService {
        PipelineService::new(
            Arc::new(StaticFetcher(body)),
            Arc::new(OptionListParser::new()),
            Arc::new(SnapshotDiffer::new()),
            store,
            sink,
            PerfReport::new(),
        )
    }

    fn key(name: &str) -> IdentityKey {
        IdentityKey::from_name(name).unwrap()
    }

    #[test]
    fn process_is_pure_and_sorted() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let raw = page(&["B|2.004", "A|1.005", "C|bad"]);
        let out = process(
            &OptionListParser::new(),
            &SnapshotDiffer::new(),
            raw.as_bytes(),
            &Snapshot::new(),
            &job(),
            at,
        )
        .unwrap();
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.sheet.rows[0][0], CellValue::text("A"));
        assert_eq!(out.sheet.rows[0][1], CellValue::Number(dec("1.00")));
        assert_eq!(out.sheet.rows[1][1], CellValue::Number(dec("2.00")));
        assert_eq!(out.sheet.footer, "Updated: 00:00 01/01/2026");
    }

    #[tokio::test]
    async fn successful_run_writes_then_commits() {
        let store = Arc::new(MapSnapshotStore::default());
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["Widget A|12.50"]), store.clone(), Arc::clone(&sink));

        let report = svc.run(&job(), false).await.unwrap();
        assert_eq!(report.product_count, 1);
        assert_eq!(report.summary.new, 1);
        assert_eq!(sink.sheets.lock().unwrap().len(), 1);
        assert_eq!(
            store.get(&job().name).unwrap().price_of(&key("Widget A")),
            Some(dec("12.50"))
        );
        let ops: Vec<_> = report.perf.timings.iter().map(|t| t.operation).collect();
        assert_eq!(ops, vec!["parse", "compile", "sink_write"]);
    }

    #[tokio::test]
    async fn second_run_sees_price_drop() {
        let store = Arc::new(MapSnapshotStore::default());
        store
            .commit(&job().name, &[(key("Widget A"), dec("12.50"))].into_iter().collect())
            .unwrap();
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["Widget A|10.00"]), store.clone(), Arc::clone(&sink));

        let report = svc.run(&job(), false).await.unwrap();
        assert_eq!(report.summary.decreased, 1);
        let sheets = sink.sheets.lock().unwrap();
        assert_eq!(sheets[0].rows[0][1], CellValue::text("£12.50 → £10.00"));
        assert_eq!(
            store.get(&job().name).unwrap().price_of(&key("Widget A")),
            Some(dec("10.00"))
        );
    }

    #[tokio::test]
    async fn sink_failure_keeps_prior_snapshot() {
        let store = Arc::new(MapSnapshotStore::default());
        let prior: Snapshot = [(key("Widget A"), dec("12.50"))].into_iter().collect();
        store.commit(&job().name, &prior).unwrap();
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let svc = service(page(&["Widget A|10.00"]), store.clone(), sink);

        let err = svc.run(&job(), false).await.unwrap_err();
        assert_eq!(err.kind(), "sink");
        assert_eq!(store.get(&job().name), Some(prior));
    }

    #[tokio::test]
    async fn batch_failure_touches_nothing() {
        let store = Arc::new(MapSnapshotStore::default());
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["x|bad", "y|bad"]), store.clone(), Arc::clone(&sink));

        let err = svc.run(&job(), false).await.unwrap_err();
        assert!(matches!(
            err,
            RunError::Batch(BatchError::AllEntriesRejected { rejected: 2 })
        ));
        assert!(sink.sheets.lock().unwrap().is_empty());
        assert_eq!(store.get(&job().name), None);
    }

    #[tokio::test]
    async fn dry_run_skips_sink_and_commit() {
        let store = Arc::new(MapSnapshotStore::default());
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["A|1.00"]), store.clone(), Arc::clone(&sink));

        let report = svc.run(&job(), true).await.unwrap();
        assert!(report.dry_run);
        assert!(sink.sheets.lock().unwrap().is_empty());
        assert_eq!(store.get(&job().name), None);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let store = Arc::new(MapSnapshotStore::default());
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["A|1.00", "B|2.00"]), store.clone(), Arc::clone(&sink));

        svc.run(&job(), false).await.unwrap();
        let first = store.get(&job().name);
        let report = svc.run(&job(), false).await.unwrap();
        assert_eq!(report.summary.unchanged, 2);
        assert_eq!(store.get(&job().name), first);

        let sheets = sink.sheets.lock().unwrap();
        assert_eq!(sheets[1].rows[0][1], CellValue::Number(dec("1.00")));
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_treated_as_empty() {
        let corrupt = || SnapshotReadError::Corrupt("expected value at line 1".into());
        let mismatch = || SnapshotReadError::FingerprintMismatch {
            stored: "abc".into(),
            computed: "def".into(),
        };
        for load_error in [corrupt as fn() -> SnapshotReadError, mismatch] {
            let store = Arc::new(UnreliableStore {
                load_error: Some(load_error),
                ..Default::default()
            });
            store
                .inner
                .commit(&job().name, &[(key("Widget A"), dec("12.50"))].into_iter().collect())
                .unwrap();
            let sink = Arc::new(RecordingSink::default());
            let svc = service(page(&["Widget A|10.00"]), store.clone(), Arc::clone(&sink));

            let report = svc.run(&job(), false).await.unwrap();
            assert_eq!(report.summary.new, 1);
            assert_eq!(report.summary.decreased, 0);
            assert_eq!(sink.sheets.lock().unwrap()[0].rows[0][1], CellValue::Number(dec("10.00")));
            assert_eq!(
                store.inner.get(&job().name).unwrap().price_of(&key("Widget A")),
                Some(dec("10.00"))
            );
        }
    }

    #[tokio::test]
    async fn commit_failure_after_write_is_reported() {
        let store = Arc::new(UnreliableStore {
            fail_commit: true,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["A|1.00"]), store.clone(), Arc::clone(&sink));

        let err = svc.run(&job(), false).await.unwrap_err();
        assert!(matches!(err, RunError::SnapshotWrite(_)));
        assert_eq!(err.kind(), "snapshot_write");
        assert_eq!(sink.sheets.lock().unwrap().len(), 1);
        assert_eq!(store.inner.get(&job().name), None);
    }

    #[tokio::test]
    async fn dropped_entries_are_counted_not_fatal() {
        let store = Arc::new(MapSnapshotStore::default());
        let sink = Arc::new(RecordingSink::default());
        let svc = service(page(&["A|1.00", "B|bad", "|2.00"]), store, sink);

        let report = svc.run(&job(), false).await.unwrap();
        assert_eq!(report.product_count, 1);
        assert_eq!(report.rejected_entries, 2);
    }

    #[tokio::test]
    async fn run_all_isolates_failures() {
        let good = Arc::new(service(
            page(&["A|1.00"]),
            Arc::new(MapSnapshotStore::default()),
            Arc::new(RecordingSink::default()),
        ));
        let bad = Arc::new(service(
            "<html></html>".into(),
            Arc::new(MapSnapshotStore::default()),
            Arc::new(RecordingSink {
                fail: true,
                ..Default::default()
            }),
        ));
        let mut other = job();
        other.name = SourceName("Montu".into());

        let results = run_all(vec![(bad, other), (good, job())], false).await;
        assert_eq!(results[0].0, SourceName("Montu".into()));
        assert!(results[0].1.is_err());
        let ok = results[1].1.as_ref().unwrap();
        assert_eq!(ok.source, job().name);
        assert_eq!(ok.summary.new, 1);
    }
}

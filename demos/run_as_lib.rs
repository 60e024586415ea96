//! # Pricewatch: library usage example
//!
//! Shows three common patterns for consuming pricewatch as a Rust library:
//!
//! 1. **From a config file**: simplest, mirrors the CLI
//! 2. **Bring your own ports**: in-memory snapshot store, custom sink
//! 3. **Pure core**: parse, diff and compile a payload with no I/O at all
//!
//! Run with a config file:
//!   cargo run --example run_as_lib -- pricewatch.toml
//!
//! Run the in-memory patterns:
//!   cargo run --example run_as_lib

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use pricewatch::{
    application::{diff::SnapshotDiffer, parsers::OptionListParser},
    domain::{
        error::{BatchError, SinkWriteError},
        layout::{ColumnSchema, Palette},
        ports::{PageFetcher, TabularSink},
    },
    process, AppConfig, MapSnapshotStore, PerfReport, PipelineService, RunOptions, SheetDocument,
    Snapshot, SourceJob, SourceName,
};

const PAGE: &str = r#"<html><body><select>
  <option value="">Choose an option</option>
  <option value="Widget A|12.50">Widget A</option>
  <option value="Widget B|4.00">Widget B</option>
</select></body></html>"#;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some(path) => from_config_file(path).await,
        None => {
            own_ports().await?;
            pure_core()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 1: load config from a TOML file (same as the CLI does internally)
// ─────────────────────────────────────────────────────────────────────────────
async fn from_config_file(path: &str) -> Result<()> {
    println!("=== Pattern 1: from config file ({path}) ===\n");

    let cfg = AppConfig::load(path)?;
    for (source, result) in pricewatch::run(&cfg, &RunOptions::default()).await? {
        match result {
            Ok(report) => println!(
                "{source}: {} product(s), {} new, {} up, {} down",
                report.product_count,
                report.summary.new,
                report.summary.increased,
                report.summary.decreased
            ),
            Err(e) => println!("{source}: failed ({e})"),
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 2: plug your own fetcher, store and sink into the pipeline.
// Useful when snapshots live in a database or the sheet goes to an API.
// ─────────────────────────────────────────────────────────────────────────────
struct InlinePage;

#[async_trait]
impl PageFetcher for InlinePage {
    async fn fetch(&self, _: &SourceName, _: &str) -> Result<Vec<u8>, BatchError> {
        Ok(PAGE.as_bytes().to_vec())
    }
}

struct StdoutSink;

#[async_trait]
impl TabularSink for StdoutSink {
    async fn write(&self, source: &SourceName, sheet: &SheetDocument) -> Result<(), SinkWriteError> {
        println!("--- {source} ---");
        for row in sheet.values() {
            let cells: Vec<String> = row.iter().map(|c| c.display()).collect();
            println!("{}", cells.join(" | "));
        }
        println!("({} directive(s))\n", sheet.directives.len());
        Ok(())
    }
}

async fn own_ports() -> Result<()> {
    println!("=== Pattern 2: custom ports ===\n");

    let store = Arc::new(MapSnapshotStore::default());
    let service = PipelineService::new(
        Arc::new(InlinePage),
        Arc::new(OptionListParser::new()),
        Arc::new(SnapshotDiffer::new()),
        store.clone(),
        Arc::new(StdoutSink),
        PerfReport::new(),
    );

    let job = demo_job()?;
    let report = service.run(&job, false).await?;
    println!("run {}: {} new product(s)", report.run_id, report.summary.new);
    println!(
        "snapshot now holds {} price(s)\n",
        store.get(&job.name).map(|s| s.len()).unwrap_or_default()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 3: the pure core: payload + prior snapshot in, sheet out.
// ─────────────────────────────────────────────────────────────────────────────
fn pure_core() -> Result<()> {
    println!("=== Pattern 3: pure core ===\n");

    let job = demo_job()?;
    let first = process(
        &OptionListParser::new(),
        &SnapshotDiffer::new(),
        PAGE.as_bytes(),
        &Snapshot::new(),
        &job,
        Local::now().naive_local(),
    )?;

    // Feed the committed snapshot back in with a cheaper Widget A.
    let cheaper = PAGE.replace("Widget A|12.50", "Widget A|9.99");
    let second = process(
        &OptionListParser::new(),
        &SnapshotDiffer::new(),
        cheaper.as_bytes(),
        &first.outcome.next_snapshot,
        &job,
        Local::now().naive_local(),
    )?;

    for row in &second.sheet.rows {
        let cells: Vec<String> = row.iter().map(|c| c.display()).collect();
        println!("{}", cells.join(" | "));
    }
    println!("\n{}", second.sheet.footer);
    Ok(())
}

fn demo_job() -> Result<SourceJob> {
    Ok(SourceJob {
        name: SourceName("Demo".into()),
        location: "inline".into(),
        schema: ColumnSchema::from_columns(&ColumnSchema::option_list_columns())?,
        palette: Palette::default(),
        currency_symbol: "£".into(),
    })
}

use crate::application::monitoring::PerfReport;
use crate::application::pipeline::RunReport;
use crate::domain::error::RunError;
use crate::domain::value_objects::SourceName;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SourceRow {
    source: String,
    status: String,
    products: String,
    new: String,
    #[tabled(rename = "price ↑")]
    increased: String,
    #[tabled(rename = "price ↓")]
    decreased: String,
    removed: String,
    rejected: String,
}

/// Print one row per source. Returns `true` if any source failed (so the
/// caller can exit non-zero).
pub fn print_run_summary(results: &[(SourceName, Result<RunReport, RunError>)]) -> bool {
    println!();
    println!("{}", "PRICEWATCH RUN SUMMARY".bold().cyan());
    println!();

    if results.is_empty() {
        println!("{}", "No sources selected.".italic());
        return false;
    }

    let rows: Vec<SourceRow> = results.iter().map(|(name, result)| source_row(name, result)).collect();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=7)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let mut failed = false;
    for (name, result) in results {
        match result {
            Ok(report) if !report.summary.removed.is_empty() => {
                let removed: Vec<&str> = report.summary.removed.iter().map(|k| k.as_str()).collect();
                println!(
                    "  {} no longer listed by {}: {}",
                    "removed".dimmed(),
                    name.0.bold(),
                    removed.join(", ")
                );
            }
            Ok(report) if report.dry_run => {
                println!("  {} {}: sheet and snapshot untouched", "dry run".yellow(), name.0.bold());
            }
            Ok(_) => {}
            Err(e) => {
                failed = true;
                println!("  {} {}: {}", "✗".red().bold(), name.0.bold(), e.to_string().red());
            }
        }
    }
    println!();
    failed
}

fn source_row(name: &SourceName, result: &Result<RunReport, RunError>) -> SourceRow {
    match result {
        Ok(r) => {
            let s = &r.summary;
            SourceRow {
                source: name.0.bold().to_string(),
                status: if r.dry_run {
                    "dry run".yellow().to_string()
                } else {
                    "ok".green().to_string()
                },
                products: r.product_count.to_string(),
                new: s.new.to_string().cyan().to_string(),
                increased: s.increased.to_string().yellow().to_string(),
                decreased: s.decreased.to_string().green().to_string(),
                removed: s.removed.len().to_string().red().to_string(),
                rejected: r.rejected_entries.to_string().dimmed().to_string(),
            }
        }
        Err(e) => SourceRow {
            source: name.0.bold().to_string(),
            status: format!("failed ({})", e.kind()).red().to_string(),
            products: "-".into(),
            new: "-".into(),
            increased: "-".into(),
            decreased: "-".into(),
            removed: "-".into(),
            rejected: "-".into(),
        },
    }
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    source: String,
    #[tabled(rename = "items")]
    items: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            source: t.source.bold().to_string(),
            items: t.items.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} byte(s) fetched  ·  {} ms elapsed",
        report.total_bytes_fetched.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}

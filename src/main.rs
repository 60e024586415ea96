use anyhow::{bail, Result};
use clap::Parser;
use pricewatch::presentation::cli_summary::{print_perf_summary, print_run_summary};
use pricewatch::{init_tracing, AppConfig, LogLevel, PerfReport, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "pricewatch",
    about = "Pricewatch: track catalog prices across runs and publish them as a formatted sheet."
)]
struct Cli {
    #[arg(short, long, default_value = "pricewatch.toml")]
    config: String,

    /// Compute and report, but leave sheets and snapshots untouched.
    #[arg(long)]
    dry_run: bool,

    /// Sheet writer: all, json or html.
    #[arg(short, long, default_value = "all")]
    format: String,

    /// Only run this source.
    #[arg(short, long)]
    source: Option<String>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    });

    let cfg = AppConfig::load(&cli.config)?;
    let opts = RunOptions {
        dry_run: cli.dry_run,
        source: cli.source,
        format: cli.format,
    };
    let results = pricewatch::run(&cfg, &opts).await?;

    let failed = print_run_summary(&results);

    let mut perf = PerfReport::default();
    for report in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        perf.absorb(report.perf.clone());
    }
    print_perf_summary(&perf);

    if failed {
        let count = results.iter().filter(|(_, r)| r.is_err()).count();
        bail!("{count} source(s) failed");
    }
    if !cli.dry_run {
        println!("Sheets written to {}", cfg.output_dir().display());
    }

    Ok(())
}

use std::{path::PathBuf, process};

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use tracing::{info, warn};
use workload_demos::defaults;
use workload_framework_core::{
    config::BenchmarkConfig,
    scenario::runtime::{RoundReport, RoundRunner},
};

#[derive(Parser, Debug)]
#[command(about = "Run the rounds of a benchmark file against an in-memory ledger")]
struct Args {
    /// Benchmark YAML; falls back to `WORKLOAD_ROUND_CONFIG`.
    config: Option<PathBuf>,
    /// Seed for read selection; overrides the file and `WORKLOAD_SEED`.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    defaults::init_tracing();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        warn!("round runner failed: {err:#}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let path = args
        .config
        .or_else(workload_framework_env::workload_round_config)
        .ok_or_else(|| anyhow!("no benchmark file given and WORKLOAD_ROUND_CONFIG is unset"))?;

    let benchmark = BenchmarkConfig::load_from_file(&path)
        .with_context(|| format!("failed to load benchmark from {}", path.display()))?;
    let seed = args
        .seed
        .or(benchmark.seed)
        .or_else(workload_framework_env::workload_seed);

    info!(
        path = %path.display(),
        rounds = benchmark.rounds.len(),
        seed,
        "loaded benchmark"
    );

    let mut factory = defaults::ledger_per_round_factory(seed);
    let reports = RoundRunner::run_benchmark(&benchmark, &mut factory)
        .await
        .context("running benchmark failed")?;
    for report in &reports {
        print_summary(report);
    }

    Ok(())
}

fn print_summary(report: &RoundReport) {
    let steps = report.steps();
    println!(
        "{:<20} ok={:<8} failed={:<6} aborted={:<4} avg={:?} tps={:.1}",
        report.label,
        steps.succeeded,
        steps.failed,
        report.aborted_workers(),
        steps.average_latency().unwrap_or_default(),
        report.throughput(),
    );
}

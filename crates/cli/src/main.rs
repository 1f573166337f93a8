//! Prime+Probe trace scanner CLI.
//!
//! This binary analyzes one binary trace per invocation. It performs:
//! 1. **Setup:** Parses arguments, installs logging, sizes the worker pool, and resolves the cache geometry.
//! 2. **Analysis:** Loads the trace and runs the per-set pipeline for every requested pass.
//! 3. **Report:** Appends the result to `<input>_result.txt` and prints the verdict.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ppscan_core::analysis::Verdict;
use ppscan_core::config::{Config, Mode, Scope};
use ppscan_core::report::{Report, report_path};
use ppscan_core::trace;
use ppscan_core::{Pipeline, Result};

#[derive(Parser, Debug)]
#[command(
    name = "ppscan",
    author,
    version,
    about = "Detect Prime+Probe cache attack patterns in offline access traces",
    long_about = "Detect Prime+Probe cache attack patterns in offline access traces.\n\nInstruction traces (L1I) hold one native-endian u64 program counter per record.\nData traces (L1D, LLC) hold two u64 words per record: 0 = write / 1 = read, then the physical address.\n\nResults are appended to <INPUT>_result.txt.\n\nExamples:\n  ppscan L1I traces/victim.itrace\n  ppscan --mode READ LLC traces/victim.dtrace --verbose\n  ppscan L1D traces/victim.dtrace --config skylake.json --jobs 8"
)]
struct Cli {
    /// Data accesses to analyze (READ, WRITE or BOTH); ignored for L1I.
    #[arg(long, default_value_t = Mode::Both)]
    mode: Mode,

    /// Cache level and access stream (L1I, L1D or LLC).
    scope: Scope,

    /// Binary trace file.
    input: PathBuf,

    /// List every emitted cluster per detected set.
    #[arg(long)]
    verbose: bool,

    /// JSON configuration overriding the built-in cache parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (defaults to the number of logical CPUs).
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Override the minimum number of recurring clusters a set must exceed.
    #[arg(long)]
    min_recurrence: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(verdict) => println!("[*] {verdict}"),
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the `info` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs one analysis and appends its report.
fn run(cli: &Cli) -> Result<Verdict> {
    if let Some(jobs) = cli.jobs
        && let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global()
    {
        warn!(jobs, error = %e, "could not size the worker pool; using the default");
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(min_recurrence) = cli.min_recurrence {
        config.min_recurrence = min_recurrence;
    }

    let pipeline = Pipeline::from_config(&config, cli.scope)?;
    let trace = trace::load_trace(&cli.input, cli.scope.layout())?;
    info!(
        input = %cli.input.display(),
        scope = %cli.scope,
        mode = %cli.mode,
        records = trace.records,
        "trace loaded"
    );

    let passes = pipeline.analyze(&trace, cli.scope, cli.mode);
    let report = Report {
        scope: cli.scope,
        mode: cli.mode,
        geometry: pipeline.geometry(),
        passes: &passes,
        verbose: cli.verbose,
    };
    let path = report_path(&cli.input);
    report.append_to(&path)?;
    println!("[*] Report appended to {}", path.display());
    Ok(report.verdict())
}

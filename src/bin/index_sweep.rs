//! Sweeps the index benchmark over bulk-load ratios and insertion methods,
//! then prints the query-performance and cache-miss tables.
//!
//! Usage:
//!   index_sweep -i <dataset> -o <output_folder> [--config sweep.json] [--analyze-only]

use anyhow::{Context, Result};
use clap::Parser;
use index_sweep_rs::benchmark_utils::set_affinity;
use index_sweep_rs::command::SystemRunner;
use index_sweep_rs::grid_runner::ParameterGridRunner;
use index_sweep_rs::summary::SummaryReporter;
use index_sweep_rs::sweep_config::{CounterLayout, SweepConfig, SweepVariant};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "index_sweep")]
#[command(about = "Bulk-load / insertion-method sweep of the index benchmark", long_about = None)]
struct Args {
    /// Dataset stored in INFILE
    #[arg(short = 'i', long = "input_file", value_name = "INFILE")]
    input_file: PathBuf,

    /// Output stored in OUTFOLDER
    #[arg(short = 'o', long = "output_folder", value_name = "OUTFOLDER")]
    output_folder: PathBuf,

    /// JSON sweep definition (ratios, methods, executables, symbol marker)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Benchmark executable to run for every cell
    #[arg(long)]
    benchmark: Option<PathBuf>,

    /// Counter report tool
    #[arg(long)]
    report_tool: Option<String>,

    /// Only summarize files left by an earlier sweep
    #[arg(long, alias = "skip-sweep")]
    analyze_only: bool,

    /// Run the benchmark without counter sampling
    #[arg(long)]
    plain: bool,

    /// Read one counter per event section, two lines below each symbol line.
    /// Real multi-event `perf report` output needs this; the default expects
    /// all seven counters stacked below a single symbol line
    #[arg(long)]
    per_event_sections: bool,

    /// Pin the sweep (and the benchmark) to this core
    #[arg(long)]
    core_id: Option<usize>,

    /// Also render the tables with borders
    #[arg(long)]
    pretty: bool,

    /// Write all summary rows as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<SweepConfig> {
    let mut config = match &args.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("failed to load sweep config {}", path.display()))?,
        None => SweepConfig::default(),
    };

    config.input_file = args.input_file.clone();
    config.output_dir = args.output_folder.clone();
    if let Some(benchmark) = &args.benchmark {
        config.benchmark_executable = benchmark.clone();
    }
    if let Some(tool) = &args.report_tool {
        config.report_tool = tool.clone();
    }
    if args.plain {
        config.variant = SweepVariant::PlainSweep;
    }
    if args.per_event_sections {
        config.counter_layout = CounterLayout::PerEvent;
    }
    if args.core_id.is_some() {
        config.core_id = args.core_id;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    if !args.analyze_only {
        if !config.input_file.is_file() {
            anyhow::bail!("input file '{}' does not exist", config.input_file.display());
        }
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("failed to create output folder {}", config.output_dir.display())
        })?;

        if let Some(core_id) = config.core_id {
            set_affinity(core_id)?;
        }

        let mut runner = ParameterGridRunner::new(&config, SystemRunner);
        let cells = runner.run().context("sweep aborted")?;
        log::info!("sweep finished: {} cells", cells);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = SummaryReporter::new(&config)
        .write_to(&mut out)
        .context("summary aborted")?;
    out.flush()?;
    drop(out);

    if args.pretty {
        report.print_tables();
    }
    if let Some(path) = &args.summary_json {
        report.save_json(path)?;
        log::info!("summary rows written to {}", path.display());
    }

    Ok(())
}

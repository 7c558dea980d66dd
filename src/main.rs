//! `hh_bench`: drive a heavy-hitter estimator across a parameter grid and
//! prepare the traces it consumes.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hh_bench::bench::sweep::{progress_bar, sweep, SweepResult};
use hh_bench::data::export::{load_sweep, save_sweep_json};
use hh_bench::data::sqlite::save_sweep_sqlite;
use hh_bench::plot::{histogram, html, table, tradeoff};
use hh_bench::trace::generate::{GeneratorConfig, TraceGenerator, MAX_DOMAIN};
use hh_bench::trace::postprocess::postprocess;
use hh_bench::trace::record::write_records;
use hh_bench::trace::summary::summarize;
use hh_bench::{ProcessRunner, RowMapping, SweepConfig};

#[derive(Parser, Debug)]
#[command(name = "hh_bench", about = "Benchmark harness for heavy-hitter estimators")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the estimator over a parameter grid and average the trials
    Sweep(SweepArgs),
    /// Write a synthetic trace with heavy-tailed packet sizes
    Generate(GenerateArgs),
    /// Reduce a raw capture dump to `<sender> <length>` lines
    Postprocess(PostprocessArgs),
    /// Print statistics of a trace file, optionally with a length histogram
    Summarize(SummarizeArgs),
    /// Render trade-off plots from saved sweep results
    Plot(PlotArgs),
    /// Print saved sweep results as a table
    Show {
        /// Results file (.db or .json)
        results: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// JSON sweep configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Parameter values in sweep order, e.g. 0.8,1,2
    #[arg(long, value_delimiter = ',')]
    grid: Option<Vec<f64>>,
    /// Algorithm rows, e.g. IMSUM=1,DIMSUM=3
    #[arg(long, value_delimiter = ',')]
    mapping: Option<Vec<String>>,
    #[arg(long)]
    trials: Option<usize>,
    #[arg(long)]
    timeout_secs: Option<f64>,
    /// Estimator executable
    #[arg(long)]
    estimator: Option<PathBuf>,
    /// Extra estimator argument, repeatable (e.g. --estimator-arg=-phi --estimator-arg=0.001)
    #[arg(long = "estimator-arg", allow_hyphen_values = true)]
    estimator_args: Vec<String>,
    /// SQLite file to store results in
    #[arg(long, default_value = "sweep.db")]
    out: PathBuf,
    /// Also export results as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write trade-off plots into this directory
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value_t = 10_000_000)]
    count: u64,
    /// Number of distinct sender ids
    #[arg(long, default_value_t = 10)]
    domain: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 0.0)]
    mu: f64,
    #[arg(long, default_value_t = 2.0)]
    sigma: f64,
    #[arg(long, default_value_t = MAX_DOMAIN)]
    max_length: u64,
    #[arg(long, default_value = "trace/generated_data")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct PostprocessArgs {
    input: PathBuf,
    output: PathBuf,
    #[arg(long, default_value_t = MAX_DOMAIN)]
    modulus: u64,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    trace: PathBuf,
    /// Write a packet-length histogram page here
    #[arg(long)]
    histogram: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Results file (.db or .json)
    results: PathBuf,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Axis label for the swept parameter
    #[arg(long, default_value = "gamma")]
    parameter_name: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hh_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Sweep(args) => run_sweep(args),
        Command::Generate(args) => run_generate(args),
        Command::Postprocess(args) => run_postprocess(args),
        Command::Summarize(args) => run_summarize(args),
        Command::Plot(args) => {
            let result = load_sweep(&args.results)
                .with_context(|| format!("loading {}", args.results.display()))?;
            write_plots(&result, &args.out_dir, &args.parameter_name)
        }
        Command::Show { results } => {
            let result = load_sweep(&results)
                .with_context(|| format!("loading {}", results.display()))?;
            println!("{}", table::sweep_table(&result));
            Ok(())
        }
    }
}

fn sweep_config(args: &SweepArgs) -> Result<SweepConfig> {
    let mut cfg = match &args.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SweepConfig::default(),
    };
    if let Some(trace) = &args.trace {
        cfg.trace_path = trace.clone();
    }
    if let Some(grid) = &args.grid {
        cfg.parameter_grid = grid.clone();
    }
    if let Some(pairs) = &args.mapping {
        cfg.algorithm_row_mapping = RowMapping::from_pairs(pairs)?.as_map().clone();
    }
    if let Some(trials) = args.trials {
        cfg.trials_per_point = trials;
    }
    if args.timeout_secs.is_some() {
        cfg.trial_timeout_secs = args.timeout_secs;
    }
    if let Some(program) = &args.estimator {
        cfg.estimator.program = program.clone();
    }
    if !args.estimator_args.is_empty() {
        cfg.estimator.extra_args = args.estimator_args.clone();
    }
    Ok(cfg)
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    let cfg = sweep_config(&args)?;
    // Mapping, grid and timeout are all checked before the first launch.
    let plan = cfg.plan()?;
    let mut runner = ProcessRunner::new(cfg.estimator.clone(), cfg.timeout()?);

    info!(
        trace = %plan.trace_path().display(),
        points = plan.grid().len(),
        trials = plan.trials_per_point(),
        mapping = %plan.mapping(),
        "starting sweep"
    );
    let visible = !args.no_progress && std::io::stderr().is_terminal();
    let progress = progress_bar(plan.total_trials(), visible);
    let result = sweep(&mut runner, &plan, &progress)?;

    println!("{}", table::sweep_table(&result));
    save_sweep_sqlite(&result, &args.out)
        .with_context(|| format!("saving results to {}", args.out.display()))?;
    if let Some(json) = &args.json {
        save_sweep_json(&result, json).with_context(|| format!("exporting {}", json.display()))?;
    }
    if let Some(dir) = &args.plot_dir {
        write_plots(&result, dir, "gamma")?;
    }
    Ok(())
}

fn write_plots(result: &SweepResult, dir: &Path, parameter_name: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    html::write_page(
        &tradeoff::space_plot(result),
        "Space vs Runtime",
        &dir.join("space_vs_updates.html"),
    )?;
    html::write_page(
        &tradeoff::parameter_plot(result, parameter_name),
        &format!("{parameter_name} vs Runtime"),
        &dir.join(format!("{parameter_name}_vs_updates.html")),
    )?;
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let cfg = GeneratorConfig {
        count: args.count,
        id_domain_size: args.domain,
        mu: args.mu,
        sigma: args.sigma,
        max_packet_length: args.max_length,
        seed: args.seed,
    };
    let generator = TraceGenerator::new(&cfg)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut sink = BufWriter::new(
        File::create(&args.out).with_context(|| format!("creating {}", args.out.display()))?,
    );
    let written = write_records(&mut sink, generator)?;
    info!(records = written, out = %args.out.display(), "generated trace");
    Ok(())
}

fn run_postprocess(args: PostprocessArgs) -> Result<()> {
    let input = BufReader::new(
        File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?,
    );
    let mut output = BufWriter::new(
        File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?,
    );
    let stats = postprocess(input, &mut output, args.modulus)?;
    info!(emitted = stats.emitted, skipped = stats.skipped, "postprocessed capture");
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<()> {
    let input = BufReader::new(
        File::open(&args.trace).with_context(|| format!("opening {}", args.trace.display()))?,
    );
    let (summary, lengths) = summarize(input, args.histogram.is_some())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(path) = &args.histogram {
        html::write_page(&histogram::length_histogram(lengths, &summary), "Packet lengths", path)?;
    }
    Ok(())
}

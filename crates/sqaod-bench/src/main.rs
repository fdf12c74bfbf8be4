use std::path::PathBuf;

use clap::Parser;

use sqaod_bench::config::{BenchmarkConfig, ResolvedOutputs};
use sqaod_bench::logging::init_logging;
use sqaod_bench::runner::BenchmarkRunner;

/// Benchmark harness for the QUBO solvers.
#[derive(Debug, Parser)]
#[command(
    name = "sqaod-bench",
    author,
    version,
    about = "Deterministic solver benchmark over random QUBO instances"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of problem instances.
    #[arg(long, value_name = "COUNT")]
    instances: Option<usize>,

    /// Override the number of trials per instance.
    #[arg(long, value_name = "COUNT")]
    trials: Option<usize>,

    /// Override the RNG seed for problem generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no benchmark is run).
    #[arg(long)]
    validate_only: bool,

    /// Keep per-solve solver events in the telemetry log regardless of config.
    #[arg(long)]
    log_solver_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(instances) = cli.instances {
        config.problem.instances = instances;
    }

    if let Some(trials) = cli.trials {
        config.problem.trials = trials;
    }

    if let Some(seed) = cli.seed {
        config.problem.seed = Some(seed);
    }

    if cli.log_solver_details {
        config.logging.solver_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let solver_count = config.solvers.len();
    let run_id = config.run_id.clone();
    let problem = config.problem.clone();

    println!(
        "Loaded configuration '{run_id}' with {solver_count} solver{} ({} {} instances of {} variables, {} trials, {})",
        if solver_count == 1 { "" } else { "s" },
        problem.instances,
        problem.graph,
        problem.variables(),
        problem.trials,
        problem.optimize,
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = BenchmarkRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: benchmark execution skipped.");
        return Ok(());
    }

    let mut summary = runner.run()?;
    if let Some(guard) = logging_guard {
        guard.finish();
    }
    summary.summarise_telemetry()?;
    println!(
        "Benchmark complete for '{run_id}': {} instances × {} trials × {} solvers → {} rows at {}",
        summary.instances,
        summary.trials,
        summary.solvers,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Energy delta plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        if let Some(avg_ms) = outputs.summary.trials.avg_elapsed_ms {
            println!(
                "  Trials: {} events, avg {:.2} ms per solve",
                outputs.summary.trials.count, avg_ms
            );
        }
        if outputs.summary.anneal.count + outputs.summary.search.count > 0 {
            println!(
                "  Solver events: {} anneal, {} exhaustive",
                outputs.summary.anneal.count, outputs.summary.search.count
            );
        }
    }

    Ok(())
}

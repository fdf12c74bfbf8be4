mod seeds;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use sqaod_core::solver::ENERGY_EPSILON;
use sqaod_core::{
    AnnealSchedule, GraphType, OptimizeMethod, Problem, SolverError, SolverType, create_solver,
};
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs, SolverConfig};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

pub use seeds::TrialSeeds;

/// Primary entry point for benchmark runs.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    solvers: Vec<SolverBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub instances: usize,
    pub trials: usize,
    pub solvers: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
    /// Filled by [`RunSummary::summarise_telemetry`].
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl RunSummary {
    /// Summarises the telemetry log into JSON and Markdown and appends highlights
    /// to the summary table. Call once the logging guard has flushed the log.
    pub fn summarise_telemetry(&mut self) -> Result<Option<&TelemetryOutputs>, RunnerError> {
        let Some(path) = self.telemetry_path.as_ref() else {
            return Ok(None);
        };
        let output_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        self.telemetry_outputs = write_summary_outputs(path, &output_dir)?;
        if let Some(outputs) = self.telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.summary_path, outputs)?;
        }
        Ok(self.telemetry_outputs.as_ref())
    }
}

impl BenchmarkRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let solvers = SolverBlueprint::from_configs(&config.solvers)?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            solvers,
        })
    }

    /// Execute the benchmark, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let problem_cfg = &self.config.problem;
        let mut rng = StdRng::seed_from_u64(problem_cfg.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for instance_index in 0..problem_cfg.instances {
            let problem = match problem_cfg.graph {
                GraphType::Rbm => Problem::random_bipartite(problem_cfg.n0, problem_cfg.n1, &mut rng),
                _ => Problem::random_dense(problem_cfg.n0, &mut rng),
            };
            let instance_seed = rng.next_u64();
            let trial_seeds = TrialSeeds::new(instance_seed, problem_cfg.trials);

            for (trial_index, &solver_seed) in trial_seeds.as_slice().iter().enumerate() {
                let outcome = self.run_trial(&problem, solver_seed)?;
                analytics.record_trial(instance_index, trial_index, &outcome)?;
                rows_written += write_trial_rows(
                    &mut writer,
                    &self.config,
                    instance_index,
                    trial_index,
                    instance_seed,
                    solver_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_dir = self
            .outputs
            .summary_md
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let telemetry_path = if self.logging_enabled {
            Some(telemetry_dir.join("telemetry.jsonl"))
        } else {
            None
        };

        Ok(RunSummary {
            instances: problem_cfg.instances,
            trials: problem_cfg.trials,
            solvers: self.solvers.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
            telemetry_outputs: None,
        })
    }

    fn run_trial(&self, problem: &Problem, solver_seed: u64) -> Result<TrialOutcome, RunnerError> {
        let problem_cfg = &self.config.problem;
        let method = problem_cfg.optimize;
        let mut results = Vec::with_capacity(self.solvers.len());

        for blueprint in &self.solvers {
            let mut solver = create_solver(problem_cfg.graph, blueprint.kind, problem, method)?;
            solver.seed(solver_seed);
            let start = Instant::now();
            let outcome = solver.solve(&blueprint.schedule)?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            results.push(SolverResult {
                solver: blueprint.name.clone(),
                kind: blueprint.kind,
                energy: outcome.best_energy,
                assignment: outcome.best.to_string(),
                candidates: outcome.energies.len(),
                steps: outcome.steps,
                elapsed_ms,
            });
        }

        let energies: Vec<f64> = results.iter().map(|r| r.energy).collect();
        let best_known = method.best(&energies).map_err(SolverError::from)?;

        Ok(TrialOutcome {
            best_known,
            results,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_trial_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    instance_index: usize,
    trial_index: usize,
    instance_seed: u64,
    solver_seed: u64,
    outcome: &TrialOutcome,
) -> Result<usize, RunnerError> {
    let trial_id = format!("I{instance_index:05}_T{trial_index:02}");
    let method = config.problem.optimize;

    let mut rows_written = 0usize;
    for result in &outcome.results {
        let gap = outcome.gap(method, result.energy);
        let row = TrialLogRow {
            run_id: config.run_id.clone(),
            trial_id: trial_id.clone(),
            instance_index,
            trial_index,
            instance_seed,
            solver_seed,
            graph: config.problem.graph.to_string(),
            optimize: method.to_string(),
            solver: result.solver.clone(),
            kind: result.kind.to_string(),
            energy: result.energy,
            gap,
            hit: gap <= ENERGY_EPSILON,
            assignment: result.assignment.clone(),
            candidates: result.candidates,
            steps: result.steps,
            elapsed_ms: result.elapsed_ms,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;

        if config.logging.enable_structured && tracing::enabled!(Level::INFO) {
            event!(
                target: "sqaod_bench::trial",
                Level::INFO,
                run_id = %config.run_id,
                trial_id = %trial_id,
                solver = %result.solver,
                kind = %result.kind,
                energy = result.energy,
                gap,
                steps = result.steps as u64,
                elapsed_ms = result.elapsed_ms,
            );
        }
    }

    Ok(rows_written)
}

/// Every solver's result on one (instance, trial) pair.
pub struct TrialOutcome {
    /// Best energy any solver reached, in the configured direction.
    pub best_known: f64,
    pub results: Vec<SolverResult>,
}

impl TrialOutcome {
    /// Distance from the best known energy; zero or positive in either direction.
    pub fn gap(&self, method: OptimizeMethod, energy: f64) -> f64 {
        method.sign(energy - self.best_known).max(0.0)
    }
}

pub struct SolverResult {
    pub solver: String,
    pub kind: SolverType,
    pub energy: f64,
    pub assignment: String,
    pub candidates: usize,
    pub steps: usize,
    pub elapsed_ms: f64,
}

#[derive(Serialize)]
struct TrialLogRow {
    run_id: String,
    trial_id: String,
    instance_index: usize,
    trial_index: usize,
    instance_seed: u64,
    solver_seed: u64,
    graph: String,
    optimize: String,
    solver: String,
    kind: String,
    energy: f64,
    gap: f64,
    hit: bool,
    assignment: String,
    candidates: usize,
    steps: usize,
    elapsed_ms: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Params(#[from] ParamsError),
    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("invalid anneal parameters for solver '{name}': {message}")]
    InvalidSchedule { name: String, message: String },
    #[error("brute force solver '{name}' takes no parameters")]
    UnexpectedParams { name: String },
}

struct SolverBlueprint {
    name: String,
    kind: SolverType,
    schedule: AnnealSchedule,
}

impl SolverBlueprint {
    fn from_configs(configs: &[SolverConfig]) -> Result<Vec<Self>, ParamsError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &SolverConfig) -> Result<Self, ParamsError> {
        let schedule = match config.kind {
            SolverType::Anneal => schedule_from_params(&config.name, &config.params)?,
            SolverType::BruteForce => {
                let has_params = config
                    .params
                    .as_mapping()
                    .is_some_and(|mapping| !mapping.is_empty());
                if has_params {
                    return Err(ParamsError::UnexpectedParams {
                        name: config.name.clone(),
                    });
                }
                AnnealSchedule::default()
            }
        };

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            schedule,
        })
    }
}

fn schedule_from_params(
    name: &str,
    params: &serde_yaml::Value,
) -> Result<AnnealSchedule, ParamsError> {
    if params.is_null() {
        return Ok(AnnealSchedule::default());
    }

    let schedule: AnnealSchedule =
        serde_yaml::from_value(params.clone()).map_err(|err| ParamsError::InvalidSchedule {
            name: name.to_string(),
            message: err.to_string(),
        })?;
    schedule
        .validate()
        .map_err(|err| ParamsError::InvalidSchedule {
            name: name.to_string(),
            message: err.to_string(),
        })?;
    Ok(schedule)
}

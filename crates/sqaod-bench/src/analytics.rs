use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use sqaod_core::solver::ENERGY_EPSILON;
use sqaod_core::{OptimizeMethod, SolverType};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{BenchmarkConfig, SolverConfig};
use crate::runner::TrialOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline solver '{0}' not present in benchmark results")]
    MissingBaseline(String),
    #[error("solver '{0}' defined in results but missing from configuration")]
    UnknownSolver(String),
    #[error("baseline '{0}' missing for trial {1}")]
    MissingBaselineTrial(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    method: OptimizeMethod,
    solvers: HashMap<String, SolverAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    solver_order: Vec<String>,
    time_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut solvers = HashMap::new();
        let mut order = Vec::new();
        for solver in &config.solvers {
            solvers.insert(
                solver.name.clone(),
                SolverAccumulator::new(solver.clone(), config.metrics.time_budget_ms),
            );
            order.push(solver.name.clone());
        }

        Ok(Self {
            baseline,
            method: config.problem.optimize,
            solvers,
            comparisons: HashMap::new(),
            solver_order: order,
            time_budget_ms: config.metrics.time_budget_ms,
        })
    }

    pub fn record_trial(
        &mut self,
        instance_index: usize,
        trial_index: usize,
        outcome: &TrialOutcome,
    ) -> Result<(), AnalyticsError> {
        let trial_id = format!("I{instance_index:05}_T{trial_index:02}");

        let baseline_energy = outcome
            .results
            .iter()
            .find(|result| result.solver == self.baseline)
            .map(|result| result.energy)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineTrial(self.baseline.clone(), trial_id.clone())
            })?;

        for result in &outcome.results {
            let acc = self
                .solvers
                .get_mut(&result.solver)
                .ok_or_else(|| AnalyticsError::UnknownSolver(result.solver.clone()))?;

            acc.record_trial(
                result.energy,
                outcome.gap(self.method, result.energy),
                result.steps,
                result.elapsed_ms,
            );
        }

        for result in &outcome.results {
            if result.solver == self.baseline {
                continue;
            }
            // Positive means worse than the baseline in either direction.
            let diff = self.method.sign(result.energy - baseline_energy);
            self.comparisons
                .entry(result.solver.clone())
                .or_insert_with(ComparisonAccumulator::new)
                .record(diff);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.solver_order {
            if let Some(acc) = self.solvers.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    solver: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.trials,
                });
                continue;
            }
            if let Some(comp) = self.comparisons.remove(&report.name) {
                let (p_value, sample_size) = comp.wilcoxon_signed_rank();
                comparisons.push(ComparisonReport {
                    solver: report.name.clone(),
                    p_value,
                    sample_size,
                });
            } else {
                comparisons.push(ComparisonReport {
                    solver: report.name.clone(),
                    p_value: 1.0,
                    sample_size: 0,
                });
            }
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            optimize: self.method,
            solvers: reports,
            comparisons,
            time_budget_ms: self.time_budget_ms,
        }
        .enrich())
    }
}

struct SolverAccumulator {
    config: SolverConfig,
    energies: Vec<f64>,
    total_gap: f64,
    hits: u32,
    total_ms: f64,
    total_steps: u64,
    time_budget_ms: u64,
}

impl SolverAccumulator {
    fn new(config: SolverConfig, time_budget_ms: u64) -> Self {
        Self {
            config,
            energies: Vec::new(),
            total_gap: 0.0,
            hits: 0,
            total_ms: 0.0,
            total_steps: 0,
            time_budget_ms,
        }
    }

    fn record_trial(&mut self, energy: f64, gap: f64, steps: usize, elapsed_ms: f64) {
        self.energies.push(energy);
        self.total_gap += gap;
        if gap <= ENERGY_EPSILON {
            self.hits += 1;
        }
        self.total_ms += elapsed_ms;
        self.total_steps += steps as u64;
    }

    fn into_report(self) -> SolverReport {
        let trials = self.energies.len();
        let per_trial = |total: f64| {
            if trials == 0 {
                0.0
            } else {
                total / trials as f64
            }
        };

        let mean_energy = per_trial(self.energies.iter().sum());
        let avg_ms = per_trial(self.total_ms);

        SolverReport {
            name: self.config.name.clone(),
            kind: self.config.kind,
            params: self.config.params.clone(),
            trials,
            mean_energy,
            ci95: confidence_interval(&self.energies),
            hits: self.hits as usize,
            mean_gap: per_trial(self.total_gap),
            average_ms_per_solve: avg_ms,
            average_steps: per_trial(self.total_steps as f64),
            delta_vs_baseline: 0.0, // Filled later once we know baseline report
            over_budget: avg_ms > self.time_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > ENERGY_EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Tied magnitudes share their average rank
        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for entry in &paired[i..=j] {
                ranks.push((rank, entry.1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub optimize: OptimizeMethod,
    pub solvers: Vec<SolverReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub time_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_mean = self
            .solvers
            .iter()
            .find(|solver| solver.name == self.baseline)
            .map(|solver| solver.mean_energy)
            .unwrap_or(0.0);

        for solver in &mut self.solvers {
            solver.delta_vs_baseline = self.optimize.sign(solver.mean_energy - baseline_mean);
        }

        self
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Benchmark Summary\n\n");
        rows.push_str(&format!(
            "Direction: {}. Time budget: {} ms average per solve\n\n",
            self.optimize, self.time_budget_ms
        ));
        rows.push_str("| Solver | Kind | Trials | Mean energy | Δ vs baseline | 95% CI | Hit % | Mean gap | Avg steps | Avg ms/solve | Over Budget | p-value |\n");
        rows.push_str("|--------|------|--------|-------------|----------------|--------|-------|----------|-----------|--------------|-------------|---------|\n");

        for solver in &self.solvers {
            let comparison = self
                .comparisons
                .iter()
                .find(|c| c.solver == solver.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);
            let hit_rate = if solver.trials == 0 {
                0.0
            } else {
                solver.hits as f64 / solver.trials as f64
            };

            rows.push_str(&format!(
                "| {name} | {kind} | {trials} | {mean:.4} | {delta:+.4} | [{ci_low:.4}, {ci_high:.4}] | {hit:.1}% | {gap:.4} | {steps:.0} | {latency:.2} | {over_budget} | {pval:.3} |\n",
                name = solver.name,
                kind = solver.kind,
                trials = solver.trials,
                mean = solver.mean_energy,
                delta = solver.delta_vs_baseline,
                ci_low = solver.ci95.0,
                ci_high = solver.ci95.1,
                hit = hit_rate * 100.0,
                gap = solver.mean_gap,
                steps = solver.average_steps,
                latency = solver.average_ms_per_solve,
                over_budget = if solver.over_budget { "Yes" } else { "No" },
                pval = comparison,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("energy_delta.png");
        let baseline = self.baseline.clone();
        let solvers_snapshot = self.solvers.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut solvers = solvers_snapshot;
            solvers.sort_by(|a, b| a.delta_vs_baseline.total_cmp(&b.delta_vs_baseline));

            let y_range_min = solvers
                .iter()
                .map(|s| s.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.min(v));
            let y_range_max = solvers
                .iter()
                .map(|s| s.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.max(v));
            let margin = ((y_range_max - y_range_min).abs() * 0.1).max(0.05);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(
                    "Mean energy delta vs baseline (lower is better)",
                    ("sans-serif", 22),
                )
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(
                    0..solvers.len(),
                    (y_range_min - margin)..(y_range_max + margin),
                )
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Δ energy vs baseline")
                .x_desc("Solver")
                .x_label_formatter(&|idx| {
                    solvers
                        .get(*idx)
                        .map(|solver| solver.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(solvers.iter().enumerate().map(|(idx, solver)| {
                    let color = if solver.name == baseline {
                        &BLUE
                    } else if solver.delta_vs_baseline <= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new(
                        [(idx, 0.0), (idx + 1, solver.delta_vs_baseline)],
                        color.filled(),
                    )
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverReport {
    pub name: String,
    pub kind: SolverType,
    pub params: serde_yaml::Value,
    pub trials: usize,
    pub mean_energy: f64,
    pub ci95: (f64, f64),
    pub hits: usize,
    pub mean_gap: f64,
    pub average_ms_per_solve: f64,
    pub average_steps: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub solver: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::SolverResult;

    const YAML: &str = r#"
run_id: "analytics"
problem:
  graph: "dense"
  n0: 4
  instances: 1
  optimize: "maximize"
solvers:
  - name: "exact"
    kind: "brute_force"
  - name: "sqa"
    kind: "anneal"
outputs:
  jsonl: "out/trials.jsonl"
  summary_md: "out/summary.md"
  plots_dir: "out/plots"
metrics:
  baseline: "exact"
"#;

    fn result(solver: &str, kind: SolverType, energy: f64) -> SolverResult {
        SolverResult {
            solver: solver.to_string(),
            kind,
            energy,
            assignment: "0101".to_string(),
            candidates: 1,
            steps: 10,
            elapsed_ms: 2.0,
        }
    }

    fn outcome(exact: f64, sqa: f64) -> TrialOutcome {
        TrialOutcome {
            best_known: exact.max(sqa),
            results: vec![
                result("exact", SolverType::BruteForce, exact),
                result("sqa", SolverType::Anneal, sqa),
            ],
        }
    }

    #[test]
    fn reports_hits_and_direction_aware_deltas() {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(YAML).expect("parse");
        cfg.validate().expect("validate");
        let mut collector = AnalyticsCollector::new(&cfg).expect("collector");
        collector.record_trial(0, 0, &outcome(3.0, 3.0)).unwrap();
        collector.record_trial(0, 1, &outcome(3.0, 2.0)).unwrap();

        let summary = collector.finalize().expect("finalize");
        let sqa = &summary.solvers[1];
        assert_eq!(sqa.trials, 2);
        assert_eq!(sqa.hits, 1);
        assert!((sqa.mean_gap - 0.5).abs() < 1e-12);
        // Maximizing: a lower mean energy is a positive (worse) delta.
        assert!((sqa.delta_vs_baseline - 0.5).abs() < 1e-12);
        assert_eq!(summary.solvers[0].delta_vs_baseline, 0.0);

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("summary.md");
        summary.write_markdown(&path).expect("write markdown");
        let markdown = fs::read_to_string(&path).expect("read markdown");
        assert!(markdown.contains("Direction: maximize"));
        assert!(markdown.contains("| sqa | anneal | 2 |"));
    }

    #[test]
    fn missing_baseline_result_is_an_error() {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(YAML).expect("parse");
        cfg.validate().expect("validate");
        let mut collector = AnalyticsCollector::new(&cfg).expect("collector");
        let partial = TrialOutcome {
            best_known: 1.0,
            results: vec![result("sqa", SolverType::Anneal, 1.0)],
        };
        assert!(matches!(
            collector.record_trial(0, 0, &partial),
            Err(AnalyticsError::MissingBaselineTrial(..))
        ));
    }

    #[test]
    fn wilcoxon_separates_consistent_shifts_from_noise() {
        let mut shifted = ComparisonAccumulator::new();
        for i in 0..20 {
            shifted.record(1.0 + i as f64 * 0.1);
        }
        let (p_shifted, n) = shifted.wilcoxon_signed_rank();
        assert_eq!(n, 20);
        assert!(p_shifted < 0.01, "p = {p_shifted}");

        let mut balanced = ComparisonAccumulator::new();
        for i in 0..20 {
            let magnitude = 1.0 + (i / 2) as f64;
            balanced.record(if i % 2 == 0 { magnitude } else { -magnitude });
        }
        let (p_balanced, _) = balanced.wilcoxon_signed_rank();
        assert!(p_balanced > 0.5, "p = {p_balanced}");

        assert_eq!(ComparisonAccumulator::new().wilcoxon_signed_rank(), (1.0, 0));
    }

    #[test]
    fn confidence_interval_brackets_the_mean() {
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
        assert_eq!(confidence_interval(&[2.0]), (2.0, 2.0));
        let (low, high) = confidence_interval(&[1.0, 2.0, 3.0]);
        assert!(low < 2.0 && high > 2.0);
        assert!(((low + high) / 2.0 - 2.0).abs() < 1e-12);
    }
}

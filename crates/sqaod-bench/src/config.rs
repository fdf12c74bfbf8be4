use serde::Deserialize;
use sqaod_core::{GraphType, OptimizeMethod, SolverType};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_TRIALS: usize = 1;
const DEFAULT_TIME_BUDGET_MS: u64 = 1_000;
/// Exhaustive search over more variables than this takes too long for a benchmark.
const MAX_BRUTE_FORCE_VARIABLES: usize = 24;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub problem: ProblemConfig,
    pub solvers: Vec<SolverConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        validate_solvers(&mut self.solvers)?;
        self.problem.validate(&self.solvers)?;
        self.outputs.validate(&self.run_id)?;
        self.metrics.validate(&self.solvers)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

/// Random problem instances every solver is run against.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProblemConfig {
    pub graph: GraphType,
    /// Variables of a dense graph, or of layer 0 of a bipartite one.
    pub n0: usize,
    /// Variables of layer 1; only read for bipartite graphs.
    #[serde(default)]
    pub n1: usize,
    pub seed: Option<u64>,
    pub instances: usize,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_optimize")]
    pub optimize: OptimizeMethod,
}

impl ProblemConfig {
    /// Number of binary variables in one instance.
    pub fn variables(&self) -> usize {
        match self.graph {
            GraphType::Rbm => self.n0 + self.n1,
            _ => self.n0,
        }
    }

    fn validate(&self, solvers: &[SolverConfig]) -> Result<(), ValidationError> {
        if self.graph == GraphType::Sparse {
            return Err(ValidationError::InvalidField {
                field: "problem.graph".to_string(),
                message: "sparse graphs have no solver; use 'dense' or 'rbm'".to_string(),
            });
        }

        if self.n0 == 0 {
            return Err(ValidationError::InvalidField {
                field: "problem.n0".to_string(),
                message: "problem size must be greater than zero".to_string(),
            });
        }

        if self.graph == GraphType::Rbm && self.n1 == 0 {
            return Err(ValidationError::InvalidField {
                field: "problem.n1".to_string(),
                message: "bipartite problems need at least one variable in layer 1".to_string(),
            });
        }

        if self.instances == 0 {
            return Err(ValidationError::InvalidField {
                field: "problem.instances".to_string(),
                message: "number of instances must be greater than zero".to_string(),
            });
        }

        if self.trials == 0 {
            return Err(ValidationError::InvalidField {
                field: "problem.trials".to_string(),
                message: "trials must be at least 1".to_string(),
            });
        }

        let brute_force = solvers.iter().any(|s| s.kind == SolverType::BruteForce);
        if brute_force && self.variables() > MAX_BRUTE_FORCE_VARIABLES {
            return Err(ValidationError::InvalidField {
                field: "problem.n0".to_string(),
                message: format!(
                    "brute force solvers accept at most {MAX_BRUTE_FORCE_VARIABLES} variables, problem has {}",
                    self.variables()
                ),
            });
        }

        Ok(())
    }
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_optimize() -> OptimizeMethod {
    OptimizeMethod::Minimize
}

/// Definition of a benchmarked solver.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SolverConfig {
    pub name: String,
    pub kind: SolverType,
    /// Anneal schedule overrides; exhaustive solvers take none.
    #[serde(default)]
    pub params: serde_yaml::Value,
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Metrics configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, solvers: &[SolverConfig]) -> Result<(), ValidationError> {
        let Some(baseline) = self.baseline.as_ref() else {
            return Err(ValidationError::InvalidField {
                field: "metrics.baseline".to_string(),
                message: "baseline solver must be specified".to_string(),
            });
        };

        if !solvers.iter().any(|s| &s.name == baseline) {
            return Err(ValidationError::InvalidField {
                field: "metrics.baseline".to_string(),
                message: format!("baseline solver '{baseline}' is not defined in solvers list"),
            });
        }

        if self.time_budget_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "metrics.time_budget_ms".to_string(),
                message: "time budget must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn default_time_budget_ms() -> u64 {
    DEFAULT_TIME_BUDGET_MS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Keep the per-solve events emitted by the solvers themselves.
    #[serde(default)]
    pub solver_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            solver_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_solvers(solvers: &mut [SolverConfig]) -> Result<(), ValidationError> {
    if solvers.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "solvers".to_string(),
            message: "at least one solver must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for solver in solvers.iter_mut() {
        if solver.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "solvers.name".to_string(),
                message: "solver name must not be empty".to_string(),
            });
        }

        if !solver.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("solvers[{}].name", solver.name),
                message: "solver name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(solver.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "solvers".to_string(),
                message: format!("solver name '{}' defined more than once", solver.name),
            });
        }

        if solver.params.is_null() {
            solver.params = serde_yaml::Value::Mapping(Default::default());
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

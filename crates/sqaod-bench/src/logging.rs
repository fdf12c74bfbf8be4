use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Targets the solvers in `sqaod-core` log under.
const SOLVER_TARGETS: [&str; 3] = ["sqaod::anneal", "sqaod::search", "sqaod::factory"];

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

impl LoggingGuard {
    /// Stops the writer thread once every queued event is on disk.
    pub fn finish(self) -> PathBuf {
        let LoggingGuard {
            _guard: guard,
            telemetry_path,
        } = self;
        drop(guard);
        telemetry_path
    }
}

pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_dir = outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&telemetry_dir).with_context(|| {
        format!(
            "creating telemetry directory at {}",
            telemetry_dir.display()
        )
    })?;

    let telemetry_path = telemetry_dir.join("telemetry.jsonl");
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level, logging.solver_details)))
        .context("building tracing filter")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Ignore error if a global subscriber is already set (e.g., when running in tests)
    let _ = tracing::subscriber::set_global_default(subscriber);

    event!(
        target: "sqaod_bench::run",
        Level::INFO,
        run_id,
        solver_details = logging.solver_details,
    );

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

/// Directives for `level`, silencing per-solve solver events unless requested.
fn filter_directives(level: Level, solver_details: bool) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    if !solver_details {
        directives.extend(SOLVER_TARGETS.iter().map(|target| format!("{target}=off")));
    }
    directives.join(",")
}

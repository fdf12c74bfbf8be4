use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub anneal: AnnealTelemetrySummary,
    pub search: SearchTelemetrySummary,
    pub trials: TrialTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct AnnealTelemetrySummary {
    pub count: usize,
    pub avg_trotters: Option<f64>,
    pub avg_best_energy: Option<f64>,
    pub graph_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchTelemetrySummary {
    pub count: usize,
    pub avg_optima: Option<f64>,
    pub avg_best_energy: Option<f64>,
    pub graph_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct TrialTelemetrySummary {
    pub count: usize,
    pub avg_elapsed_ms: Option<f64>,
    pub avg_gap: Option<f64>,
    pub solver_counts: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn add_field(&mut self, fields: &Map<String, Value>, name: &str) {
        if let Some(value) = fields.get(name).and_then(Value::as_f64) {
            self.add(value);
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate solver and trial events from a JSON tracing log.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut summary = TelemetrySummary::default();
    let mut trotters_avg = Average::new();
    let mut anneal_energy_avg = Average::new();
    let mut optima_avg = Average::new();
    let mut search_energy_avg = Average::new();
    let mut elapsed_avg = Average::new();
    let mut gap_avg = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "sqaod::anneal" => {
                summary.anneal.count += 1;
                trotters_avg.add_field(&fields, "trotters");
                anneal_energy_avg.add_field(&fields, "best_energy");
                bump(&mut summary.anneal.graph_counts, &fields, "graph");
            }
            "sqaod::search" => {
                summary.search.count += 1;
                optima_avg.add_field(&fields, "optima");
                search_energy_avg.add_field(&fields, "best_energy");
                bump(&mut summary.search.graph_counts, &fields, "graph");
            }
            "sqaod_bench::trial" => {
                summary.trials.count += 1;
                elapsed_avg.add_field(&fields, "elapsed_ms");
                gap_avg.add_field(&fields, "gap");
                bump(&mut summary.trials.solver_counts, &fields, "solver");
            }
            _ => {}
        }
    }

    summary.anneal.avg_trotters = trotters_avg.mean();
    summary.anneal.avg_best_energy = anneal_energy_avg.mean();
    summary.search.avg_optima = optima_avg.mean();
    summary.search.avg_best_energy = search_energy_avg.mean();
    summary.trials.avg_elapsed_ms = elapsed_avg.mean();
    summary.trials.avg_gap = gap_avg.mean();

    Ok(summary)
}

fn bump(counts: &mut BTreeMap<String, usize>, fields: &Map<String, Value>, name: &str) {
    let label = fields
        .get(name)
        .and_then(Value::as_str)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>");
    *counts.entry(label.to_string()).or_insert(0) += 1;
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&summary).map_err(TelemetryError::from)?,
    )
    .map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary json",
        source,
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    let trials = &outputs.summary.trials;
    section.push_str(&format!("- Trial events captured: {}\n", trials.count));
    if let Some(value) = trials.avg_elapsed_ms {
        section.push_str(&format!("- Avg ms per solve: {:.2}\n", value));
    }
    if let Some(value) = trials.avg_gap {
        section.push_str(&format!("- Avg gap to best known: {:.4}\n", value));
    }
    let anneal = &outputs.summary.anneal;
    section.push_str(&format!("- Anneal runs logged: {}\n", anneal.count));
    if let Some(value) = anneal.avg_trotters {
        section.push_str(&format!("- Avg trotters: {:.1}\n", value));
    }
    let search = &outputs.summary.search;
    section.push_str(&format!("- Exhaustive searches logged: {}\n", search.count));
    if let Some(value) = search.avg_optima {
        section.push_str(&format!("- Avg tied optima: {:.2}\n", value));
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    output.push_str("## Trials\n");
    output.push_str(&format!("- Events: {}\n", summary.trials.count));
    if let Some(value) = summary.trials.avg_elapsed_ms {
        output.push_str(&format!("- Avg ms per solve: {:.2}\n", value));
    }
    if let Some(value) = summary.trials.avg_gap {
        output.push_str(&format!("- Avg gap to best known: {:.4}\n", value));
    }
    push_counts(&mut output, "Solvers", &summary.trials.solver_counts);
    output.push('\n');

    output.push_str("## Annealing\n");
    output.push_str(&format!("- Events: {}\n", summary.anneal.count));
    if let Some(value) = summary.anneal.avg_trotters {
        output.push_str(&format!("- Avg trotters: {:.1}\n", value));
    }
    if let Some(value) = summary.anneal.avg_best_energy {
        output.push_str(&format!("- Avg best energy: {:.4}\n", value));
    }
    push_counts(&mut output, "Graphs", &summary.anneal.graph_counts);
    output.push('\n');

    output.push_str("## Exhaustive Search\n");
    output.push_str(&format!("- Events: {}\n", summary.search.count));
    if let Some(value) = summary.search.avg_optima {
        output.push_str(&format!("- Avg tied optima: {:.2}\n", value));
    }
    if let Some(value) = summary.search.avg_best_energy {
        output.push_str(&format!("- Avg best energy: {:.4}\n", value));
    }
    push_counts(&mut output, "Graphs", &summary.search.graph_counts);
    output
}

fn push_counts(output: &mut String, heading: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    output.push_str(&format!("- {heading}:\n"));
    for (label, count) in counts {
        output.push_str(&format!("  - {}: {}\n", label, count));
    }
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    #[test]
    fn summarises_solver_and_trial_events() {
        let lines = vec![
            r#"{"target":"sqaod::anneal","fields":{"graph":"dense","method":"minimize","n":8,"trotters":2,"best_energy":-3.0}}"#,
            r#"{"target":"sqaod::anneal","fields":{"graph":"rbm","method":"minimize","n0":4,"n1":4,"trotters":4,"best_energy":-1.0}}"#,
            r#"{"target":"sqaod::search","fields":{"graph":"dense","optima":3,"best_energy":-3.5}}"#,
            r#"{"target":"sqaod_bench::trial","fields":{"solver":"sqa","elapsed_ms":4.0,"gap":0.5}}"#,
            r#"{"target":"sqaod_bench::trial","fields":{"solver":"exact","elapsed_ms":2.0,"gap":0.0}}"#,
            r#"{"target":"sqaod::factory","fields":{"graph":"dense"}}"#,
        ];
        let file = write_temp_file(&lines);
        let summary = summarise_telemetry(file.path()).expect("summarise");
        assert_eq!(summary.anneal.count, 2);
        assert_eq!(summary.anneal.avg_trotters, Some(3.0));
        assert_eq!(summary.anneal.avg_best_energy, Some(-2.0));
        assert_eq!(summary.anneal.graph_counts.get("rbm"), Some(&1));
        assert_eq!(summary.search.count, 1);
        assert_eq!(summary.search.avg_optima, Some(3.0));
        assert_eq!(summary.trials.count, 2);
        assert_eq!(summary.trials.avg_elapsed_ms, Some(3.0));
        assert_eq!(summary.trials.avg_gap, Some(0.25));
        assert_eq!(summary.trials.solver_counts.get("exact"), Some(&1));
    }

    #[test]
    fn handles_missing_file() {
        let path = Path::new("tests/does/not/exist.jsonl");
        let summary = summarise_telemetry(path).expect("summarise missing file");
        assert_eq!(summary.anneal.count, 0);
        assert!(summary.anneal.avg_trotters.is_none());
        assert!(summary.trials.solver_counts.is_empty());
    }

    #[test]
    fn writes_outputs_and_appends_highlights() {
        let dir = tempfile::tempdir().expect("temp dir");
        let telemetry = dir.path().join("telemetry.jsonl");
        std::fs::write(
            &telemetry,
            "{\"target\":\"sqaod_bench::trial\",\"fields\":{\"solver\":\"sqa\",\"elapsed_ms\":1.5,\"gap\":0.0}}\n",
        )
        .expect("seed telemetry");
        let summary_md = dir.path().join("summary.md");
        std::fs::write(&summary_md, "# Benchmark Summary\n").expect("seed summary");

        let outputs = write_summary_outputs(&telemetry, dir.path())
            .expect("summarise")
            .expect("outputs written");
        assert!(outputs.json_path.exists());
        assert!(outputs.markdown_path.exists());

        append_highlights_to_markdown(&summary_md, &outputs).expect("append highlights");
        let contents = std::fs::read_to_string(&summary_md).expect("read summary file");
        assert!(contents.starts_with("# Benchmark Summary"));
        assert!(contents.contains("## Telemetry Highlights"));
        assert!(contents.contains("Trial events captured: 1"));
        assert!(contents.contains("Avg ms per solve: 1.50"));
    }
}

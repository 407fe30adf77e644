use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wifi_sweep_abstract::{ExperimentPlan, ParamValue};

/// Why a combination produced no aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The simulator could not be started, or exited unsuccessfully.
    Launch { message: String },
    /// The simulator exited cleanly but left no output file.
    MissingOutput,
    /// The output file could not be read.
    Unreadable { message: String },
    /// Every row was rejected against the schema.
    NoValidRows,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Launch { message } => write!(f, "launch failed: {message}"),
            SkipReason::MissingOutput => write!(f, "no output file after invocation"),
            SkipReason::Unreadable { message } => write!(f, "output file unreadable: {message}"),
            SkipReason::NoValidRows => write!(f, "no valid rows in output file"),
        }
    }
}

/// Aggregates for one finished combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationOutcome {
    pub label: String,
    /// Swept axis values in axis order.
    pub swept: Vec<(String, ParamValue)>,
    /// Relocated data file name, relative to the results directory.
    pub data_file: String,
    pub valid_rows: usize,
    pub skipped_rows: usize,
    /// Mean per metric name over all valid rows.
    pub means: BTreeMap<String, f64>,
}

impl CombinationOutcome {
    pub fn swept_value(&self, axis: &str) -> Option<&ParamValue> {
        self.swept
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCombination {
    pub label: String,
    pub swept: Vec<(String, ParamValue)>,
    pub reason: SkipReason,
}

/// Everything one sweep did, persisted as `sweep-report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub plan_name: String,
    pub started_at: String,
    pub finished_at: String,
    pub cancelled: bool,
    /// Combinations visited before the sweep ended.
    pub attempted: usize,
    pub completed: Vec<CombinationOutcome>,
    pub skipped: Vec<SkippedCombination>,
}

impl SweepReport {
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("sweep-report.json");
        let data = serde_json::to_vec_pretty(self).context("failed to serialize sweep report")?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn load(dir: &Path) -> Result<SweepReport> {
        let path = dir.join("sweep-report.json");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let report = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(report)
    }

    /// Flat `summary.csv` with one row per completed combination, for
    /// spreadsheet work that does not want the JSON report.
    pub fn write_summary_csv(&self, dir: &Path, plan: &ExperimentPlan) -> Result<PathBuf> {
        let path = dir.join("summary.csv");
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        let mut header = vec!["combination".to_string()];
        header.extend(plan.axes.iter().map(|axis| axis.name.clone()));
        header.extend(plan.metrics.iter().map(|metric| metric.name.clone()));
        header.push("valid_rows".to_string());
        writer.write_record(&header)?;

        for outcome in &self.completed {
            let mut record = vec![outcome.label.clone()];
            for axis in &plan.axes {
                let value = outcome
                    .swept_value(&axis.name)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                record.push(value);
            }
            for metric in &plan.metrics {
                let value = outcome
                    .means
                    .get(&metric.name)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                record.push(value);
            }
            record.push(outcome.valid_rows.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> SweepReport {
        SweepReport {
            plan_name: "offered-load".into(),
            started_at: "2025-01-01T10:00:00+00:00".into(),
            finished_at: "2025-01-01T10:30:00+00:00".into(),
            cancelled: false,
            attempted: 2,
            completed: vec![CombinationOutcome {
                label: "lambda-0.001".into(),
                swept: vec![("lambda".into(), ParamValue::Float(0.001))],
                data_file: "wifi-dcf_lambda-0.001.dat".into(),
                valid_rows: 3,
                skipped_rows: 0,
                means: BTreeMap::from([("thpt".to_string(), 15.0)]),
            }],
            skipped: vec![SkippedCombination {
                label: "lambda-0.01".into(),
                swept: vec![("lambda".into(), ParamValue::Float(0.01))],
                reason: SkipReason::Launch {
                    message: "simulator exited with exit status: 1".into(),
                },
            }],
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        report.save(dir.path()).unwrap();

        let loaded = SweepReport::load(dir.path()).unwrap();
        assert_eq!(loaded.plan_name, "offered-load");
        assert_eq!(loaded.completed.len(), 1);
        assert_eq!(loaded.completed[0].means["thpt"], 15.0);
        assert!(matches!(
            loaded.skipped[0].reason,
            SkipReason::Launch { .. }
        ));
    }

    #[test]
    fn skip_reasons_render_for_logs() {
        assert_eq!(
            SkipReason::MissingOutput.to_string(),
            "no output file after invocation"
        );
        assert_eq!(
            SkipReason::NoValidRows.to_string(),
            "no valid rows in output file"
        );
    }

    #[test]
    fn swept_value_finds_axis_by_name() {
        let report = sample_report();
        let outcome = &report.completed[0];
        assert_eq!(
            outcome.swept_value("lambda"),
            Some(&ParamValue::Float(0.001))
        );
        assert_eq!(outcome.swept_value("nope"), None);
    }
}

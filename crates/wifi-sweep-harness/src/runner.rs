use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

use wifi_sweep_abstract::{Combination, ExperimentPlan, FieldKind, ResultSchema};

use crate::aggregate::metric_means;
use crate::cancel::CancelToken;
use crate::extract::extract_columns;
use crate::launcher::Launcher;
use crate::report::{CombinationOutcome, SkipReason, SkippedCombination, SweepReport};
use crate::results::ResultsWorkspace;

/// Drives one plan end to end: enumerate combinations, launch the simulator,
/// relocate its output, aggregate the tracked metrics, write the report.
///
/// One failing combination never stops the sweep; it is recorded as skipped
/// and the sweep moves on. Failures that poison everything after them, such
/// as an unwritable results directory, abort instead.
pub struct SweepRunner {
    launcher: Box<dyn Launcher>,
    plan: ExperimentPlan,
    schema: ResultSchema,
    tracked: Vec<(usize, FieldKind)>,
    output_stem: String,
    workspace: ResultsWorkspace,
    cancel: CancelToken,
}

impl SweepRunner {
    /// Validates the plan and resolves its schema before anything runs.
    pub fn new(
        launcher: Box<dyn Launcher>,
        plan: ExperimentPlan,
        workspace: ResultsWorkspace,
        cancel: CancelToken,
    ) -> Result<Self> {
        plan.validate().context("invalid experiment plan")?;
        let schema = plan.schema.resolve()?;
        let tracked = plan
            .metrics
            .iter()
            .filter_map(|metric| schema.field(&metric.field))
            .map(|(index, spec)| (index, spec.kind))
            .collect();
        let output_stem = Path::new(&plan.output_file)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| plan.output_file.clone());
        Ok(SweepRunner {
            launcher,
            plan,
            schema,
            tracked,
            output_stem,
            workspace,
            cancel,
        })
    }

    pub fn plan(&self) -> &ExperimentPlan {
        &self.plan
    }

    pub fn results_dir(&self) -> &Path {
        self.workspace.dir()
    }

    pub fn run(&self) -> Result<SweepReport> {
        self.launcher.check()?;
        let combos = self.plan.combinations();
        let total = combos.len();
        info!(
            "sweep '{}': {} combinations x {} repetitions of {}",
            self.plan.name, total, self.plan.repetitions, self.plan.program
        );

        let mut report = SweepReport {
            plan_name: self.plan.name.clone(),
            started_at: Local::now().to_rfc3339(),
            finished_at: String::new(),
            cancelled: false,
            attempted: 0,
            completed: Vec::new(),
            skipped: Vec::new(),
        };

        for (index, combo) in combos.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("cancelled after {index} of {total} combinations");
                report.cancelled = true;
                break;
            }
            info!("[{}/{}] {}", index + 1, total, combo.label());
            report.attempted += 1;
            self.run_combination(combo, &mut report)?;
        }

        report.finished_at = Local::now().to_rfc3339();
        self.finalize(&report)?;
        info!(
            "sweep '{}' done: {} completed, {} skipped",
            self.plan.name,
            report.completed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Run every repetition of one combination and aggregate its rows.
    ///
    /// `Err` here is fatal for the whole sweep; per-combination failures are
    /// recorded on the report instead.
    fn run_combination(&self, combo: &Combination, report: &mut SweepReport) -> Result<()> {
        let output_path = self.launcher.output_dir().join(&self.plan.output_file);
        let base_args = combo.args();

        for repetition in 0..self.plan.repetitions {
            let seed = self.plan.base_seed + u64::from(repetition);
            let mut args = base_args.clone();
            args.push(format!("--{}={}", self.plan.seed_flag, seed));
            if let Err(err) = self.launcher.invoke(&self.plan.program, &args) {
                // rows from earlier repetitions must not leak into the
                // next combination
                self.discard_output(&output_path)?;
                let reason = SkipReason::Launch {
                    message: format!("{err:#}"),
                };
                self.skip(report, combo, reason);
                return Ok(());
            }
        }

        if !output_path.exists() {
            self.skip(report, combo, SkipReason::MissingOutput);
            return Ok(());
        }
        let data_file = self
            .workspace
            .relocate(&output_path, &self.output_stem, &combo.label())?;

        let extraction = match extract_columns(&data_file, &self.schema, &self.tracked) {
            Ok(extraction) => extraction,
            Err(err) => {
                let reason = SkipReason::Unreadable {
                    message: format!("{err:#}"),
                };
                self.skip(report, combo, reason);
                return Ok(());
            }
        };
        let Some(means) = metric_means(&self.plan.metrics, &extraction) else {
            self.skip(report, combo, SkipReason::NoValidRows);
            return Ok(());
        };
        debug!("{}: means {:?}", combo.label(), means);

        report.completed.push(CombinationOutcome {
            label: combo.label(),
            swept: combo.swept().to_vec(),
            data_file: data_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            valid_rows: extraction.valid_rows,
            skipped_rows: extraction.skipped_rows,
            means,
        });
        Ok(())
    }

    fn skip(&self, report: &mut SweepReport, combo: &Combination, reason: SkipReason) {
        warn!("skipping {}: {}", combo.label(), reason);
        report.skipped.push(SkippedCombination {
            label: combo.label(),
            swept: combo.swept().to_vec(),
            reason,
        });
    }

    fn discard_output(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to discard partial output {}", path.display()))?;
        }
        Ok(())
    }

    fn finalize(&self, report: &SweepReport) -> Result<()> {
        report.save(self.workspace.dir())?;
        report.write_summary_csv(self.workspace.dir(), &self.plan)?;
        self.workspace.write_plan(&self.plan)?;
        self.workspace.snapshot_git_state(self.launcher.output_dir());
        Ok(())
    }
}

/// Commands the sweep would run, one line per invocation, without running
/// anything.
pub fn dry_run(launcher: &dyn Launcher, plan: &ExperimentPlan) -> Result<Vec<String>> {
    plan.validate().context("invalid experiment plan")?;
    let mut lines = Vec::new();
    for combo in plan.combinations() {
        let base_args = combo.args();
        for repetition in 0..plan.repetitions {
            let seed = plan.base_seed + u64::from(repetition);
            let mut args = base_args.clone();
            args.push(format!("--{}={}", plan.seed_flag, seed));
            lines.push(launcher.describe(&plan.program, &args));
        }
    }
    Ok(lines)
}

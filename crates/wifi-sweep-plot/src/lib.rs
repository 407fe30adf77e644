mod bar;
mod heatmap;
mod line;

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use wifi_sweep_abstract::{ChartKind, ExperimentPlan};
use wifi_sweep_harness::SweepReport;

pub(crate) type ChartResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) const PALETTE: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

/// Render every chart the plan declares into the results directory.
///
/// A failing chart is logged and skipped: once rendering starts, the sweep
/// data is already safe on disk, and a bad figure must not take the rest
/// down with it. Returns the files actually written.
pub fn render_all(plan: &ExperimentPlan, report: &SweepReport, dir: &Path) -> Vec<PathBuf> {
    if report.completed.is_empty() {
        warn!("no completed combinations; skipping chart rendering");
        return Vec::new();
    }
    let mut written = Vec::new();
    for chart in &plan.charts {
        let path = dir.join(&chart.file);
        let result = match &chart.kind {
            ChartKind::Line { x_axis, log_x } => {
                line::render(chart, x_axis, *log_x, report, &path)
            }
            ChartKind::Bar => bar::render(chart, report, &path),
            ChartKind::Heatmap { x_axis, y_axis } => {
                heatmap::render(chart, x_axis, y_axis, plan, report, &path)
            }
        };
        match result {
            Ok(()) => {
                info!("rendered {}", path.display());
                written.push(path);
            }
            Err(err) => warn!("chart '{}' failed: {err}", chart.title),
        }
    }
    written
}

#[cfg(test)]
pub(crate) mod testdata {
    use std::collections::BTreeMap;

    use wifi_sweep_abstract::{
        ChartSpec, ExperimentPlan, MetricSpec, ParamValue, SchemaRef, SweepAxis,
    };
    use wifi_sweep_harness::{CombinationOutcome, SweepReport};

    /// Two-axis plan with one completed outcome per combination except one,
    /// which stays missing the way a skipped combination would.
    pub fn plan_and_report() -> (ExperimentPlan, SweepReport) {
        let plan = ExperimentPlan {
            name: "grid".into(),
            description: String::new(),
            program: "prog".into(),
            output_file: "out.dat".into(),
            schema: SchemaRef::Builtin("wifi-dcf".into()),
            fixed: BTreeMap::new(),
            axes: vec![
                SweepAxis::ints("cw", "acBECwmin", [16, 32]),
                SweepAxis::floats("lambda", "perSldLambda", [0.001, 0.01]),
            ],
            repetitions: 1,
            base_seed: 1,
            seed_flag: "rngRun".into(),
            metrics: vec![
                MetricSpec::new("thpt", "thpt_mbps"),
                MetricSpec::new("delay", "e2e_delay_ms"),
            ],
            charts: vec![ChartSpec::line(
                "Throughput",
                "thpt.png",
                "lambda",
                "Mbps",
                &["thpt"],
                true,
            )],
        };

        let mut completed = Vec::new();
        for (cw, lambda, thpt, delay) in [
            (16, 0.001, 10.0, 1.5),
            (16, 0.01, 20.0, 2.5),
            (32, 0.001, 30.0, 3.5),
        ] {
            completed.push(CombinationOutcome {
                label: format!("cw-{cw}_lambda-{lambda}"),
                swept: vec![
                    ("cw".into(), ParamValue::Int(cw)),
                    ("lambda".into(), ParamValue::Float(lambda)),
                ],
                data_file: format!("out_cw-{cw}_lambda-{lambda}.dat"),
                valid_rows: 1,
                skipped_rows: 0,
                means: BTreeMap::from([
                    ("thpt".to_string(), thpt),
                    ("delay".to_string(), delay),
                ]),
            });
        }
        let report = SweepReport {
            plan_name: plan.name.clone(),
            started_at: String::new(),
            finished_at: String::new(),
            cancelled: false,
            attempted: 4,
            completed,
            skipped: Vec::new(),
        };
        (plan, report)
    }

    /// Rendering needs system fonts for captions; headless build machines
    /// may not have any. Only a font problem is tolerated.
    pub fn assert_rendered(result: crate::ChartResult, path: &std::path::Path) {
        match result {
            Ok(()) => assert!(path.is_file(), "missing {}", path.display()),
            Err(err) => {
                let message = err.to_string().to_lowercase();
                assert!(message.contains("font"), "unexpected error: {message}");
            }
        }
    }
}

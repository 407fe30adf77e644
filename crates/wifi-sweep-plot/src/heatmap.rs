use std::path::Path;

use plotters::prelude::*;

use wifi_sweep_abstract::{ChartSpec, ExperimentPlan};
use wifi_sweep_harness::SweepReport;

use crate::ChartResult;

/// Cell grid over two swept axes, coloured blue-to-red by the chart's single
/// metric. Cells without data stay white; the caption carries the value
/// range the colours span.
pub(crate) fn render(
    spec: &ChartSpec,
    x_axis: &str,
    y_axis: &str,
    plan: &ExperimentPlan,
    report: &SweepReport,
    path: &Path,
) -> ChartResult {
    let metric = spec.metrics.first().ok_or("heatmap has no metric")?;
    let grid = CellGrid::collect(metric, x_axis, y_axis, plan, report)
        .ok_or("axes missing from plan")?;
    let Some((lo, hi)) = grid.value_range() else {
        return Err("no data points".into());
    };
    let span = (hi - lo).max(f64::EPSILON);

    let caption = format!("{} ({}: {} .. {})", spec.title, metric, fmt_value(lo), fmt_value(hi));
    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(18)
        .x_label_area_size(44)
        .y_label_area_size(58)
        .build_cartesian_2d(0f64..grid.xs.len() as f64, 0f64..grid.ys.len() as f64)?;

    let x_desc = spec
        .x_label
        .clone()
        .unwrap_or_else(|| x_axis.to_string());
    let y_desc = if spec.y_label.is_empty() {
        y_axis.to_string()
    } else {
        spec.y_label.clone()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(grid.xs.len() + 1)
        .y_labels(grid.ys.len() + 1)
        .x_label_formatter(&|v| cell_label(&grid.xs, *v))
        .y_label_formatter(&|v| cell_label(&grid.ys, *v))
        .x_desc(x_desc.as_str())
        .y_desc(y_desc.as_str())
        .draw()?;

    chart.draw_series(grid.cells.iter().enumerate().flat_map(|(xi, column)| {
        column.iter().enumerate().filter_map(move |(yi, cell)| {
            cell.map(|value| {
                let t = (value - lo) / span;
                let color = HSLColor((240.0 - 240.0 * t) / 360.0, 0.90, 0.45);
                Rectangle::new(
                    [
                        (xi as f64 + 0.02, yi as f64 + 0.02),
                        (xi as f64 + 0.98, yi as f64 + 0.98),
                    ],
                    color.filled(),
                )
            })
        })
    }))?;
    root.present()?;
    Ok(())
}

/// Cell values addressed by axis value position; duplicates (a third swept
/// axis, say) average together.
struct CellGrid {
    xs: Vec<String>,
    ys: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl CellGrid {
    fn collect(
        metric: &str,
        x_axis: &str,
        y_axis: &str,
        plan: &ExperimentPlan,
        report: &SweepReport,
    ) -> Option<CellGrid> {
        let xs: Vec<String> = plan
            .axis(x_axis)?
            .values
            .iter()
            .map(ToString::to_string)
            .collect();
        let ys: Vec<String> = plan
            .axis(y_axis)?
            .values
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut buckets: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); ys.len()]; xs.len()];
        for outcome in &report.completed {
            let Some(xv) = outcome.swept_value(x_axis) else {
                continue;
            };
            let Some(yv) = outcome.swept_value(y_axis) else {
                continue;
            };
            let Some(xi) = xs.iter().position(|s| *s == xv.to_string()) else {
                continue;
            };
            let Some(yi) = ys.iter().position(|s| *s == yv.to_string()) else {
                continue;
            };
            if let Some(value) = outcome.means.get(metric) {
                buckets[xi][yi].push(*value);
            }
        }

        let cells = buckets
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .map(|bucket| {
                        if bucket.is_empty() {
                            None
                        } else {
                            Some(bucket.iter().sum::<f64>() / bucket.len() as f64)
                        }
                    })
                    .collect()
            })
            .collect();
        Some(CellGrid { xs, ys, cells })
    }

    fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for column in &self.cells {
            for value in column.iter().flatten() {
                range = Some(match range {
                    None => (*value, *value),
                    Some((lo, hi)) => (lo.min(*value), hi.max(*value)),
                });
            }
        }
        range
    }
}

/// Label at the left edge of each cell; fractional ticks stay blank.
fn cell_label(labels: &[String], position: f64) -> String {
    let index = position.floor();
    if index < 0.0 || (position - index).abs() > 1e-6 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

fn fmt_value(value: f64) -> String {
    if value != 0.0 && value.abs() < 0.01 {
        format!("{value:.2e}")
    } else {
        format!("{value:.3}")
    }
}

use std::path::Path;

use plotters::prelude::*;

use wifi_sweep_abstract::ChartSpec;
use wifi_sweep_harness::SweepReport;

use crate::{ChartResult, PALETTE};

/// One point per completed combination, x from the swept axis, one series
/// per metric. Skipped combinations simply leave gaps.
pub(crate) fn render(
    spec: &ChartSpec,
    x_axis: &str,
    log_x: bool,
    report: &SweepReport,
    path: &Path,
) -> ChartResult {
    let series = collect_series(&spec.metrics, x_axis, report);
    if series.is_empty() {
        return Err("no data points".into());
    }

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y_max = f64::NEG_INFINITY;
    for (_, points) in &series {
        for (x, y) in points {
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            y_max = y_max.max(*y);
        }
    }
    if x_min == x_max {
        // a single swept value still deserves a visible point
        x_min -= 0.5;
        x_max += 0.5;
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }
    let y_range = 0.0..y_max * 1.1;
    let x_desc = spec
        .x_label
        .clone()
        .unwrap_or_else(|| x_axis.to_string());

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut builder = ChartBuilder::on(&root);
    builder
        .caption(&spec.title, ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(44)
        .y_label_area_size(58);

    if log_x {
        let mut chart = builder.build_cartesian_2d((x_min..x_max).log_scale(), y_range)?;
        chart
            .configure_mesh()
            .x_desc(x_desc.as_str())
            .y_desc(spec.y_label.as_str())
            .draw()?;
        for (index, (name, points)) in series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, color.filled())),
            )?;
        }
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()?;
    } else {
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_range)?;
        chart
            .configure_mesh()
            .x_desc(x_desc.as_str())
            .y_desc(spec.y_label.as_str())
            .draw()?;
        for (index, (name, points)) in series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, color.filled())),
            )?;
        }
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()?;
    }
    root.present()?;
    Ok(())
}

/// Per-metric point lists in sweep order. Outcomes without the axis value
/// or the metric are left out rather than faked.
fn collect_series(
    metrics: &[String],
    x_axis: &str,
    report: &SweepReport,
) -> Vec<(String, Vec<(f64, f64)>)> {
    let mut series = Vec::new();
    for metric in metrics {
        let mut points = Vec::new();
        for outcome in &report.completed {
            let Some(x) = outcome.swept_value(x_axis).and_then(|v| v.as_f64()) else {
                continue;
            };
            let Some(y) = outcome.means.get(metric) else {
                continue;
            };
            points.push((x, *y));
        }
        if !points.is_empty() {
            series.push((metric.clone(), points));
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use crate::testdata::{assert_rendered, plan_and_report};

    use super::*;

    #[test]
    fn series_follow_sweep_order_and_skip_missing_outcomes() {
        let (_, report) = plan_and_report();
        let series = collect_series(
            &["thpt".to_string(), "delay".to_string()],
            "lambda",
            &report,
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "thpt");
        // cw-32/lambda-0.01 was never completed, so only three points
        assert_eq!(series[0].1, vec![(0.001, 10.0), (0.01, 20.0), (0.001, 30.0)]);
        assert_eq!(series[1].1, vec![(0.001, 1.5), (0.01, 2.5), (0.001, 3.5)]);
    }

    #[test]
    fn unknown_metric_produces_no_series() {
        let (_, report) = plan_and_report();
        let series = collect_series(&["nope".to_string()], "lambda", &report);
        assert!(series.is_empty());
    }

    #[test]
    fn renders_a_png_on_both_scales() {
        let (plan, report) = plan_and_report();
        let dir = tempfile::tempdir().unwrap();

        let spec = &plan.charts[0];
        let log_path = dir.path().join("log.png");
        assert_rendered(render(spec, "lambda", true, &report, &log_path), &log_path);

        let lin_path = dir.path().join("lin.png");
        assert_rendered(render(spec, "lambda", false, &report, &lin_path), &lin_path);
    }
}

use std::path::Path;

use plotters::prelude::*;

use wifi_sweep_abstract::ChartSpec;
use wifi_sweep_harness::SweepReport;

use crate::{ChartResult, PALETTE};

/// One bar group per completed combination, one bar per metric, labelled by
/// the combination label.
pub(crate) fn render(spec: &ChartSpec, report: &SweepReport, path: &Path) -> ChartResult {
    let labels: Vec<String> = report
        .completed
        .iter()
        .map(|outcome| outcome.label.clone())
        .collect();
    if labels.is_empty() {
        return Err("no completed combinations".into());
    }

    let mut y_max = f64::NEG_INFINITY;
    for outcome in &report.completed {
        for metric in &spec.metrics {
            if let Some(value) = outcome.means.get(metric) {
                y_max = y_max.max(*value);
            }
        }
    }
    if !y_max.is_finite() {
        return Err("no data points".into());
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }

    let n = labels.len();
    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(80)
        .y_label_area_size(58)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0..y_max * 1.1)?;

    let x_desc = spec
        .x_label
        .clone()
        .unwrap_or_else(|| "combination".to_string());
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&|x| group_label(&labels, *x))
        .x_desc(x_desc.as_str())
        .y_desc(spec.y_label.as_str())
        .draw()?;

    let group_width = 0.8f64;
    let bar_width = group_width / spec.metrics.len() as f64;
    for (mi, metric) in spec.metrics.iter().enumerate() {
        let color = PALETTE[mi % PALETTE.len()];
        let offset = bar_width * mi as f64 - group_width / 2.0;
        chart
            .draw_series(report.completed.iter().enumerate().filter_map(
                |(i, outcome)| {
                    outcome.means.get(metric).map(|value| {
                        let x0 = i as f64 + offset;
                        Rectangle::new([(x0, 0.0), (x0 + bar_width, *value)], color.filled())
                    })
                },
            ))?
            .label(metric.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            });
    }
    if spec.metrics.len() > 1 {
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()?;
    }
    root.present()?;
    Ok(())
}

/// Label for the group whose center sits at an integer tick; in-between
/// ticks stay blank.
fn group_label(labels: &[String], position: f64) -> String {
    let nearest = position.round();
    if nearest < 0.0 || (position - nearest).abs() > 0.3 {
        return String::new();
    }
    labels
        .get(nearest as usize)
        .cloned()
        .unwrap_or_default()
}

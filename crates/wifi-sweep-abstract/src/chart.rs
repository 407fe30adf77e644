use serde::{Deserialize, Serialize};

/// What a chart draws and where its coordinates come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    /// One point per combination, x taken from a swept axis, one series per
    /// metric.
    Line {
        x_axis: String,
        #[serde(default)]
        log_x: bool,
    },
    /// One bar group per combination, one bar per metric.
    Bar,
    /// Cell grid over two swept axes, coloured by the chart's single metric.
    Heatmap { x_axis: String, y_axis: String },
}

/// A figure rendered from the aggregated sweep results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// PNG file name, relative to the results directory.
    pub file: String,
    /// Overrides the axis-derived x label when set.
    #[serde(default)]
    pub x_label: Option<String>,
    pub y_label: String,
    /// Metric names drawn by this chart.
    pub metrics: Vec<String>,
    pub kind: ChartKind,
}

impl ChartSpec {
    pub fn line(
        title: &str,
        file: &str,
        x_axis: &str,
        y_label: &str,
        metrics: &[&str],
        log_x: bool,
    ) -> Self {
        ChartSpec {
            title: title.to_string(),
            file: file.to_string(),
            x_label: None,
            y_label: y_label.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            kind: ChartKind::Line {
                x_axis: x_axis.to_string(),
                log_x,
            },
        }
    }

    pub fn bar(title: &str, file: &str, y_label: &str, metrics: &[&str]) -> Self {
        ChartSpec {
            title: title.to_string(),
            file: file.to_string(),
            x_label: None,
            y_label: y_label.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            kind: ChartKind::Bar,
        }
    }

    pub fn heatmap(title: &str, file: &str, x_axis: &str, y_axis: &str, metric: &str) -> Self {
        ChartSpec {
            title: title.to_string(),
            file: file.to_string(),
            x_label: None,
            y_label: String::new(),
            metrics: vec![metric.to_string()],
            kind: ChartKind::Heatmap {
                x_axis: x_axis.to_string(),
                y_axis: y_axis.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_kind_deserializes_from_tagged_table() {
        let spec: ChartSpec = toml::from_str(
            r#"
            title = "Throughput vs. offered load"
            file = "throughput.png"
            y_label = "Throughput (Mbps)"
            metrics = ["thpt_total"]

            [kind]
            type = "line"
            x_axis = "lambda"
            log_x = true
            "#,
        )
        .unwrap();
        match spec.kind {
            ChartKind::Line { x_axis, log_x } => {
                assert_eq!(x_axis, "lambda");
                assert!(log_x);
            }
            other => panic!("expected line kind, got {other:?}"),
        }
    }

    #[test]
    fn log_x_defaults_off() {
        let spec: ChartSpec = toml::from_str(
            r#"
            title = "t"
            file = "f.png"
            y_label = "y"
            metrics = ["m"]

            [kind]
            type = "line"
            x_axis = "n_sta"
            "#,
        )
        .unwrap();
        assert!(matches!(spec.kind, ChartKind::Line { log_x: false, .. }));
    }
}

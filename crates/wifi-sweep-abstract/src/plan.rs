use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::{ChartKind, ChartSpec};
use crate::param::{ParamValue, SweepAxis};
use crate::schema::ResultSchema;

fn default_repetitions() -> u32 {
    1
}

fn default_base_seed() -> u64 {
    1
}

fn default_seed_flag() -> String {
    "rngRun".to_string()
}

/// Reference to a result schema: the name of a builtin, or an inline table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Builtin(String),
    Inline(ResultSchema),
}

impl SchemaRef {
    pub fn resolve(&self) -> Result<ResultSchema, PlanError> {
        match self {
            SchemaRef::Builtin(name) => ResultSchema::builtin(name)
                .ok_or_else(|| PlanError::UnknownSchema { name: name.clone() }),
            SchemaRef::Inline(schema) => Ok(schema.clone()),
        }
    }
}

/// A tracked output column, addressed by schema field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Name used in reports and chart legends.
    pub name: String,
    /// Schema field the metric reads.
    pub field: String,
}

impl MetricSpec {
    pub fn new(name: &str, field: &str) -> Self {
        MetricSpec {
            name: name.to_string(),
            field: field.to_string(),
        }
    }
}

/// A full sweep description: which simulator program to run, the parameter
/// space to enumerate, and what to make of the rows it writes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentPlan {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Simulator program name, as the launcher expects it.
    pub program: String,
    /// Fixed-name file the program appends its row to, relative to the
    /// launcher's output directory.
    pub output_file: String,
    pub schema: SchemaRef,
    /// Flags applied to every combination.
    #[serde(default)]
    pub fixed: BTreeMap<String, ParamValue>,
    /// Swept dimensions, slowest-varying first.
    pub axes: Vec<SweepAxis>,
    /// Invocations per combination; their rows are averaged together.
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Seed of the first repetition; repetition `i` runs with `base_seed + i`.
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,
    /// Flag that receives the per-repetition seed.
    #[serde(default = "default_seed_flag")]
    pub seed_flag: String,
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan has no sweep axes")]
    NoAxes,
    #[error("axis '{axis}' has no values")]
    EmptyAxis { axis: String },
    #[error("axis name '{axis}' is used twice")]
    DuplicateAxis { axis: String },
    #[error("flag '{flag}' is assigned more than once")]
    DuplicateFlag { flag: String },
    #[error("flag '{flag}' is reserved for the repetition seed")]
    ReservedFlag { flag: String },
    #[error("unknown result schema '{name}'")]
    UnknownSchema { name: String },
    #[error("plan declares no metrics")]
    NoMetrics,
    #[error("metric '{metric}' reads unknown schema field '{field}'")]
    UnknownField { metric: String, field: String },
    #[error("metric name '{metric}' is declared twice")]
    DuplicateMetric { metric: String },
    #[error("repetitions must be at least 1")]
    ZeroRepetitions,
    #[error("chart '{chart}' references unknown metric '{metric}'")]
    UnknownChartMetric { chart: String, metric: String },
    #[error("chart '{chart}' references unknown axis '{axis}'")]
    UnknownChartAxis { chart: String, axis: String },
    #[error("chart '{chart}' needs numeric x values, but axis '{axis}' holds text")]
    TextAxis { chart: String, axis: String },
    #[error("chart '{chart}' uses a log x scale, but axis '{axis}' has a value <= 0")]
    LogAxisRange { chart: String, axis: String },
    #[error("heatmap chart '{chart}' must track exactly one metric")]
    HeatmapMetric { chart: String },
}

impl ExperimentPlan {
    /// Check the plan for contradictions before anything is launched.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.axes.is_empty() {
            return Err(PlanError::NoAxes);
        }
        if self.repetitions == 0 {
            return Err(PlanError::ZeroRepetitions);
        }

        let mut axis_names = BTreeSet::new();
        for axis in &self.axes {
            if axis.values.is_empty() {
                return Err(PlanError::EmptyAxis {
                    axis: axis.name.clone(),
                });
            }
            if !axis_names.insert(axis.name.as_str()) {
                return Err(PlanError::DuplicateAxis {
                    axis: axis.name.clone(),
                });
            }
        }

        let mut flags: BTreeSet<&str> = BTreeSet::new();
        let assigned = self
            .fixed
            .keys()
            .map(String::as_str)
            .chain(self.axes.iter().flat_map(|axis| axis.flag_names()));
        for flag in assigned {
            if flag == self.seed_flag {
                return Err(PlanError::ReservedFlag {
                    flag: flag.to_string(),
                });
            }
            if !flags.insert(flag) {
                return Err(PlanError::DuplicateFlag {
                    flag: flag.to_string(),
                });
            }
        }

        let schema = self.schema.resolve()?;
        if self.metrics.is_empty() {
            return Err(PlanError::NoMetrics);
        }
        let mut metric_names = BTreeSet::new();
        for metric in &self.metrics {
            if schema.field(&metric.field).is_none() {
                return Err(PlanError::UnknownField {
                    metric: metric.name.clone(),
                    field: metric.field.clone(),
                });
            }
            if !metric_names.insert(metric.name.as_str()) {
                return Err(PlanError::DuplicateMetric {
                    metric: metric.name.clone(),
                });
            }
        }

        for chart in &self.charts {
            self.validate_chart(chart, &metric_names)?;
        }
        Ok(())
    }

    fn validate_chart(
        &self,
        chart: &ChartSpec,
        metric_names: &BTreeSet<&str>,
    ) -> Result<(), PlanError> {
        for metric in &chart.metrics {
            if !metric_names.contains(metric.as_str()) {
                return Err(PlanError::UnknownChartMetric {
                    chart: chart.title.clone(),
                    metric: metric.clone(),
                });
            }
        }
        match &chart.kind {
            ChartKind::Line { x_axis, log_x } => {
                let axis = self.axis(x_axis).ok_or_else(|| PlanError::UnknownChartAxis {
                    chart: chart.title.clone(),
                    axis: x_axis.clone(),
                })?;
                for value in &axis.values {
                    let Some(v) = value.as_f64() else {
                        return Err(PlanError::TextAxis {
                            chart: chart.title.clone(),
                            axis: x_axis.clone(),
                        });
                    };
                    if *log_x && v <= 0.0 {
                        return Err(PlanError::LogAxisRange {
                            chart: chart.title.clone(),
                            axis: x_axis.clone(),
                        });
                    }
                }
            }
            ChartKind::Bar => {}
            ChartKind::Heatmap { x_axis, y_axis } => {
                for name in [x_axis, y_axis] {
                    if self.axis(name).is_none() {
                        return Err(PlanError::UnknownChartAxis {
                            chart: chart.title.clone(),
                            axis: name.clone(),
                        });
                    }
                }
                if chart.metrics.len() != 1 {
                    return Err(PlanError::HeatmapMetric {
                        chart: chart.title.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn axis(&self, name: &str) -> Option<&SweepAxis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    /// Total number of combinations the sweep will visit.
    pub fn combination_count(&self) -> usize {
        self.axes.iter().map(|axis| axis.values.len()).product()
    }

    /// Every point of the parameter space, first axis varying slowest.
    pub fn combinations(&self) -> Vec<Combination> {
        self.axes
            .iter()
            .map(|axis| axis.values.iter().map(move |value| (axis, value)))
            .multi_cartesian_product()
            .map(|picks| Combination::assemble(&self.fixed, &picks))
            .collect()
    }
}

/// One fully resolved point of the sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    swept: Vec<(String, ParamValue)>,
    flags: Vec<(String, ParamValue)>,
}

impl Combination {
    fn assemble(fixed: &BTreeMap<String, ParamValue>, picks: &[(&SweepAxis, &ParamValue)]) -> Self {
        let swept = picks
            .iter()
            .map(|(axis, value)| (axis.name.clone(), (*value).clone()))
            .collect();
        let mut flags: Vec<(String, ParamValue)> = fixed
            .iter()
            .map(|(flag, value)| (flag.clone(), value.clone()))
            .collect();
        for (axis, value) in picks {
            for flag in axis.flag_names() {
                flags.push((flag.to_string(), (*value).clone()));
            }
        }
        Combination { swept, flags }
    }

    /// Swept axis values in axis order.
    pub fn swept(&self) -> &[(String, ParamValue)] {
        &self.swept
    }

    pub fn value_of(&self, axis: &str) -> Option<&ParamValue> {
        self.swept
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value)
    }

    /// `axisname-value` pairs joined with underscores; safe as a file label.
    pub fn label(&self) -> String {
        self.swept
            .iter()
            .map(|(name, value)| format!("{name}-{value}"))
            .join("_")
    }

    /// `--flag=value` arguments for one simulator invocation, seed excluded.
    pub fn args(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|(flag, value)| format!("--{flag}={value}"))
            .collect()
    }
}

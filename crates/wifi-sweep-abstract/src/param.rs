use std::fmt;

use serde::{Deserialize, Serialize};

/// A single simulator parameter value.
///
/// TOML integers and floats map onto `Int` and `Float`; quoted values become
/// `Text`. The split matters when a value is rendered back out: integers must
/// not grow a trailing `.0` in flags or file labels, because the simulator
/// rejects `--nMldSta=10.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view used for chart coordinates. `Text` has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// One swept dimension of an experiment.
///
/// `flags` lists the simulator flags that receive the axis value on each
/// invocation. Most axes drive a single flag; a linked axis fans one value out
/// to several flags, such as a channel width applied to both links of an MLD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepAxis {
    /// Short name used in labels, charts and reports.
    pub name: String,
    /// Simulator flags fed by this axis. Empty means the axis name itself.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Values in sweep order.
    pub values: Vec<ParamValue>,
}

impl SweepAxis {
    pub fn new(
        name: impl Into<String>,
        flag: impl Into<String>,
        values: Vec<ParamValue>,
    ) -> Self {
        SweepAxis {
            name: name.into(),
            flags: vec![flag.into()],
            values,
        }
    }

    /// Axis whose value is applied to several flags at once.
    pub fn linked(
        name: impl Into<String>,
        flags: impl IntoIterator<Item = impl Into<String>>,
        values: Vec<ParamValue>,
    ) -> Self {
        SweepAxis {
            name: name.into(),
            flags: flags.into_iter().map(Into::into).collect(),
            values,
        }
    }

    pub fn ints(
        name: impl Into<String>,
        flag: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self::new(name, flag, values.into_iter().map(ParamValue::Int).collect())
    }

    pub fn floats(
        name: impl Into<String>,
        flag: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self::new(
            name,
            flag,
            values.into_iter().map(ParamValue::Float).collect(),
        )
    }

    /// One value per decade, `10^lo` up to and including `10^hi`.
    ///
    /// Offered-load sweeps span many orders of magnitude; this is the shape
    /// they all use.
    pub fn log_decades(name: impl Into<String>, flag: impl Into<String>, lo: i32, hi: i32) -> Self {
        Self::floats(name, flag, (lo..=hi).map(|e| 10f64.powi(e)))
    }

    /// Flags this axis assigns, falling back to the axis name.
    pub fn flag_names(&self) -> impl Iterator<Item = &str> {
        let fallback = if self.flags.is_empty() {
            Some(self.name.as_str())
        } else {
            None
        };
        self.flags.iter().map(String::as_str).chain(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_values_render_without_decimal_point() {
        assert_eq!(ParamValue::Int(40).to_string(), "40");
        assert_eq!(ParamValue::Float(0.001).to_string(), "0.001");
        assert_eq!(ParamValue::Text("ht".into()).to_string(), "ht");
    }

    #[test]
    fn tiny_floats_render_in_plain_notation() {
        let v = ParamValue::Float(1e-10);
        assert_eq!(v.to_string(), "0.0000000001");
    }

    #[test]
    fn as_f64_covers_numeric_variants_only() {
        assert_eq!(ParamValue::Int(5).as_f64(), Some(5.0));
        assert_eq!(ParamValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(ParamValue::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn log_decades_spans_inclusive_range() {
        let axis = SweepAxis::log_decades("lambda", "mldPerNodeLambda", -3, -1);
        let values: Vec<f64> = axis.values.iter().filter_map(|v| v.as_f64()).collect();
        assert_eq!(values, vec![0.001, 0.01, 0.1]);
    }

    #[test]
    fn empty_flag_list_falls_back_to_axis_name() {
        let axis = SweepAxis {
            name: "gi".into(),
            flags: Vec::new(),
            values: vec![ParamValue::Int(800)],
        };
        let flags: Vec<&str> = axis.flag_names().collect();
        assert_eq!(flags, vec!["gi"]);
    }

    #[test]
    fn linked_axis_lists_every_flag() {
        let axis = SweepAxis::linked(
            "width",
            ["channelWidth", "channelWidth2"],
            vec![ParamValue::Int(20)],
        );
        let flags: Vec<&str> = axis.flag_names().collect();
        assert_eq!(flags, vec!["channelWidth", "channelWidth2"]);
    }

    #[test]
    fn untagged_values_deserialize_by_shape() {
        #[derive(serde::Deserialize)]
        struct Holder {
            values: Vec<ParamValue>,
        }
        let holder: Holder = toml::from_str(r#"values = [20, 0.5, "vht"]"#).unwrap();
        assert_eq!(
            holder.values,
            vec![
                ParamValue::Int(20),
                ParamValue::Float(0.5),
                ParamValue::Text("vht".into()),
            ]
        );
    }
}

use serde::{Deserialize, Serialize};

/// How one column of a simulator output row is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Float,
    Int,
}

impl FieldKind {
    /// Parse a raw CSV token into canonical numeric form.
    ///
    /// Integer columns also accept a float rendering of a whole number; the
    /// simulator echoes some counters through double formatting.
    pub fn parse(self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        match self {
            FieldKind::Float => raw.parse::<f64>().ok().filter(|v| v.is_finite()),
            FieldKind::Int => {
                if let Ok(v) = raw.parse::<i64>() {
                    return Some(v as f64);
                }
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && v.fract() == 0.0)
            }
        }
    }
}

/// One named column of a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn float(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind: FieldKind::Float,
        }
    }

    pub fn int(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind: FieldKind::Int,
        }
    }
}

/// Declared layout of a simulator's headerless CSV output.
///
/// The simulator appends one positional row per run and nothing in the file
/// says what the columns mean. A schema pins that meaning down so metrics can
/// address columns by name, and so rows narrower than the declared layout are
/// rejected instead of silently misread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ResultSchema {
    /// Number of columns a valid row must have at minimum.
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Column index and spec for a field name.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }

    /// Schemas shipped with the harness, by name.
    pub fn builtin(name: &str) -> Option<ResultSchema> {
        match name {
            "wifi-dcf" => Some(Self::wifi_dcf()),
            "wifi-mld" => Some(Self::wifi_mld()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["wifi-dcf", "wifi-mld"]
    }

    /// Row written by the single-link DCF program into `wifi-dcf.dat`.
    ///
    /// Five measured columns, then the run parameters echoed back.
    pub fn wifi_dcf() -> ResultSchema {
        ResultSchema {
            name: "wifi-dcf".to_string(),
            fields: vec![
                FieldSpec::float("succ_prob"),
                FieldSpec::float("thpt_mbps"),
                FieldSpec::float("que_delay_ms"),
                FieldSpec::float("acc_delay_ms"),
                FieldSpec::float("e2e_delay_ms"),
                FieldSpec::int("rng_run"),
                FieldSpec::float("sim_time_s"),
                FieldSpec::int("payload_bytes"),
                FieldSpec::int("mcs"),
                FieldSpec::int("channel_width_mhz"),
                FieldSpec::int("n_sld"),
                FieldSpec::float("sld_lambda"),
                FieldSpec::int("ac"),
                FieldSpec::int("cw_min"),
                FieldSpec::int("cw_stage"),
            ],
        }
    }

    /// Row written by the multi-link program into `wifi-mld.dat`.
    ///
    /// Per-link and total metric triples come first, then every run
    /// parameter echoed back, per-access-category contention settings
    /// included.
    pub fn wifi_mld() -> ResultSchema {
        let mut fields = vec![
            FieldSpec::float("succ_prob_l1"),
            FieldSpec::float("succ_prob_l2"),
            FieldSpec::float("succ_prob_total"),
            FieldSpec::float("thpt_l1_mbps"),
            FieldSpec::float("thpt_l2_mbps"),
            FieldSpec::float("thpt_total_mbps"),
            FieldSpec::float("que_delay_l1_ms"),
            FieldSpec::float("que_delay_l2_ms"),
            FieldSpec::float("que_delay_total_ms"),
            FieldSpec::float("acc_delay_l1_ms"),
            FieldSpec::float("acc_delay_l2_ms"),
            FieldSpec::float("acc_delay_total_ms"),
            FieldSpec::float("e2e_delay_l1_ms"),
            FieldSpec::float("e2e_delay_l2_ms"),
            FieldSpec::float("e2e_delay_total_ms"),
            FieldSpec::int("rng_run"),
            FieldSpec::float("sim_time_s"),
            FieldSpec::int("payload_bytes"),
            FieldSpec::int("mcs_l1"),
            FieldSpec::int("mcs_l2"),
            FieldSpec::int("channel_width_l1_mhz"),
            FieldSpec::int("channel_width_l2_mhz"),
            FieldSpec::int("gi_l1_ns"),
            FieldSpec::int("gi_l2_ns"),
            FieldSpec::int("n_sld_l1"),
            FieldSpec::float("sld_l1_lambda"),
            FieldSpec::int("n_sld_l2"),
            FieldSpec::float("sld_l2_lambda"),
            FieldSpec::int("n_mld_sta"),
            FieldSpec::float("mld_lambda"),
            FieldSpec::float("mld_prob_link1"),
            FieldSpec::int("ac_mld"),
        ];
        for ac in ["be", "bk", "vi", "vo"] {
            for link in ["l1", "l2"] {
                fields.push(FieldSpec::int(&format!("{ac}_cw_min_{link}")));
                fields.push(FieldSpec::int(&format!("{ac}_cw_stage_{link}")));
            }
        }
        fields.push(FieldSpec::int("mpdu_buffer"));
        ResultSchema {
            name: "wifi-mld".to_string(),
            fields,
        }
    }
}

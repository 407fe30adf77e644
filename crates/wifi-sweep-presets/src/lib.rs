//! Ready-made sweep plans for the wifi simulator programs.
//!
//! Each preset is a complete [`ExperimentPlan`] that can run as-is or be
//! dumped with `validate --print` and edited as a starting point.

use std::collections::BTreeMap;

use anyhow::{Result, bail};

use wifi_sweep_abstract::{
    ChartSpec, ExperimentPlan, MetricSpec, ParamValue, SchemaRef, SweepAxis,
};

/// Look a preset up by plan name.
pub fn by_name(name: &str) -> Result<ExperimentPlan> {
    if let Some(plan) = all().into_iter().find(|plan| plan.name == name) {
        return Ok(plan);
    }
    let known: Vec<String> = all().into_iter().map(|plan| plan.name).collect();
    bail!("Unknown preset '{name}'. Known presets: {}.", known.join(", "))
}

pub fn all() -> Vec<ExperimentPlan> {
    vec![
        dcf_offered_load(),
        mld_offered_load(),
        station_count(),
        cw_grid(),
        traffic_allocation(),
        channel_mcs_grid(),
        payload_size(),
        guard_interval(),
    ]
}

/// Single-link DCF saturation curve: offered load from 1e-10 to 0.1
/// packets per slot, one decade per step.
pub fn dcf_offered_load() -> ExperimentPlan {
    ExperimentPlan {
        name: "dcf-offered-load".into(),
        description: "DCF throughput and delays of a single-link BSS over offered load".into(),
        program: "single-bss-sld".into(),
        output_file: "wifi-dcf.dat".into(),
        schema: SchemaRef::Builtin("wifi-dcf".into()),
        fixed: fixed(&[("payloadSize", ParamValue::Int(1500))]),
        axes: vec![SweepAxis::log_decades("lambda", "perSldLambda", -10, -1)],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: vec![
            MetricSpec::new("thpt", "thpt_mbps"),
            MetricSpec::new("que", "que_delay_ms"),
            MetricSpec::new("acc", "acc_delay_ms"),
            MetricSpec::new("e2e", "e2e_delay_ms"),
        ],
        charts: vec![
            ChartSpec::line(
                "Throughput vs. offered load",
                "throughput.png",
                "lambda",
                "Throughput (Mbps)",
                &["thpt"],
                true,
            ),
            ChartSpec::line(
                "Queueing delay vs. offered load",
                "queue-delay.png",
                "lambda",
                "Queueing delay (ms)",
                &["que"],
                true,
            ),
            ChartSpec::line(
                "Access delay vs. offered load",
                "access-delay.png",
                "lambda",
                "Access delay (ms)",
                &["acc"],
                true,
            ),
            ChartSpec::line(
                "End-to-end delay vs. offered load",
                "e2e-delay.png",
                "lambda",
                "End-to-end delay (ms)",
                &["e2e"],
                true,
            ),
        ],
    }
}

/// MLD saturation curve over per-node offered load, per-link and total.
pub fn mld_offered_load() -> ExperimentPlan {
    ExperimentPlan {
        name: "mld-offered-load".into(),
        description: "MLD per-link and total metrics over per-node offered load".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("nMldSta", ParamValue::Int(30)),
        ]),
        axes: vec![SweepAxis::log_decades("lambda", "mldPerNodeLambda", -10, -1)],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: mld_metrics(),
        charts: mld_line_charts("lambda", true),
    }
}

/// Contention scaling: grow the number of MLD stations at a fixed load.
pub fn station_count() -> ExperimentPlan {
    ExperimentPlan {
        name: "station-count".into(),
        description: "MLD metrics as the station count grows at fixed offered load".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("mldPerNodeLambda", ParamValue::Float(1e-4)),
        ]),
        axes: vec![SweepAxis::ints("n_sta", "nMldSta", [5, 10, 15, 20, 25, 30])],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: mld_metrics(),
        charts: mld_line_charts("n_sta", false),
    }
}

/// Per-link CWmin grid: every pairing of contention windows on both links.
pub fn cw_grid() -> ExperimentPlan {
    ExperimentPlan {
        name: "cw-grid".into(),
        description: "Throughput and delay over per-link CWmin pairings".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("nMldSta", ParamValue::Int(10)),
            ("mldPerNodeLambda", ParamValue::Float(1e-3)),
            ("mldProbLink1", ParamValue::Float(0.5)),
            ("simulationTime", ParamValue::Int(20)),
        ]),
        axes: vec![
            SweepAxis::ints("cw_l1", "acBECwminLink1", [16, 32, 64]),
            SweepAxis::ints("cw_l2", "acBECwminLink2", [16, 32, 64]),
        ],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: vec![
            MetricSpec::new("thpt_total", "thpt_total_mbps"),
            MetricSpec::new("e2e_total", "e2e_delay_total_ms"),
        ],
        charts: vec![
            ChartSpec::heatmap(
                "Total throughput over CWmin grid",
                "throughput-grid.png",
                "cw_l1",
                "cw_l2",
                "thpt_total",
            ),
            ChartSpec::heatmap(
                "End-to-end delay over CWmin grid",
                "e2e-grid.png",
                "cw_l1",
                "cw_l2",
                "e2e_total",
            ),
            ChartSpec::bar(
                "Totals per CWmin pairing",
                "totals.png",
                "Throughput (Mbps) / delay (ms)",
                &["thpt_total", "e2e_total"],
            ),
        ],
    }
}

/// Traffic split between the two links of an MLD, 10% to 90% on link 1.
pub fn traffic_allocation() -> ExperimentPlan {
    ExperimentPlan {
        name: "traffic-allocation".into(),
        description: "Per-link metrics as traffic shifts from link 2 to link 1".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("mldPerNodeLambda", ParamValue::Float(1e-2)),
            ("nMldSta", ParamValue::Int(5)),
            ("mcs", ParamValue::Int(6)),
            ("mcs2", ParamValue::Int(6)),
            ("channelWidth", ParamValue::Int(20)),
            ("channelWidth2", ParamValue::Int(40)),
        ]),
        axes: vec![SweepAxis::floats(
            "prob_l1",
            "mldProbLink1",
            [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
        )],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: [triple("thpt", "thpt", "mbps"), triple("e2e", "e2e_delay", "ms")].concat(),
        charts: vec![
            ChartSpec::line(
                "Throughput vs. link 1 allocation",
                "throughput.png",
                "prob_l1",
                "Throughput (Mbps)",
                &["thpt_l1", "thpt_l2", "thpt_total"],
                false,
            ),
            ChartSpec::line(
                "End-to-end delay vs. link 1 allocation",
                "e2e-delay.png",
                "prob_l1",
                "End-to-end delay (ms)",
                &["e2e_l1", "e2e_l2", "e2e_total"],
                false,
            ),
        ],
    }
}

/// PHY rate grid: channel widths and MCS indices on both links.
pub fn channel_mcs_grid() -> ExperimentPlan {
    ExperimentPlan {
        name: "channel-mcs-grid".into(),
        description: "Total throughput and delay over channel width and MCS pairings".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("mldPerNodeLambda", ParamValue::Float(1e-3)),
            ("nMldSta", ParamValue::Int(5)),
        ]),
        axes: vec![
            SweepAxis::ints("width_l1", "channelWidth", [20, 40, 80]),
            SweepAxis::ints("width_l2", "channelWidth2", [20, 40, 80]),
            SweepAxis::ints("mcs_l1", "mcs", [4, 6, 8]),
            SweepAxis::ints("mcs_l2", "mcs2", [4, 6, 8]),
        ],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: vec![
            MetricSpec::new("thpt_total", "thpt_total_mbps"),
            MetricSpec::new("e2e_total", "e2e_delay_total_ms"),
        ],
        charts: vec![
            ChartSpec::heatmap(
                "Total throughput over channel widths",
                "throughput-widths.png",
                "width_l1",
                "width_l2",
                "thpt_total",
            ),
            ChartSpec::heatmap(
                "Total throughput over MCS pairings",
                "throughput-mcs.png",
                "mcs_l1",
                "mcs_l2",
                "thpt_total",
            ),
        ],
    }
}

/// Payload size against station count at a light fixed load.
pub fn payload_size() -> ExperimentPlan {
    ExperimentPlan {
        name: "payload-size".into(),
        description: "MLD totals over payload size and station count".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("mldPerNodeLambda", ParamValue::Float(1e-4)),
            ("mldProbLink1", ParamValue::Float(0.5)),
            ("simulationTime", ParamValue::Int(20)),
        ]),
        axes: vec![
            SweepAxis::ints("payload", "payloadSize", [512, 1024, 2048, 4096]),
            SweepAxis::ints("n_sta", "nMldSta", [5, 10, 15, 20]),
        ],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: vec![
            MetricSpec::new("thpt_total", "thpt_total_mbps"),
            MetricSpec::new("que_total", "que_delay_total_ms"),
            MetricSpec::new("acc_total", "acc_delay_total_ms"),
            MetricSpec::new("e2e_total", "e2e_delay_total_ms"),
        ],
        charts: vec![
            ChartSpec::heatmap(
                "Total throughput over payload and stations",
                "throughput-grid.png",
                "payload",
                "n_sta",
                "thpt_total",
            ),
            ChartSpec::heatmap(
                "End-to-end delay over payload and stations",
                "e2e-grid.png",
                "payload",
                "n_sta",
                "e2e_total",
            ),
        ],
    }
}

/// Guard interval comparison on a symmetric two-link MLD.
pub fn guard_interval() -> ExperimentPlan {
    ExperimentPlan {
        name: "guard-interval".into(),
        description: "Per-link metrics for each guard interval setting".into(),
        program: "single-bss-mld".into(),
        output_file: "wifi-mld.dat".into(),
        schema: SchemaRef::Builtin("wifi-mld".into()),
        fixed: fixed(&[
            ("payloadSize", ParamValue::Int(1500)),
            ("mldPerNodeLambda", ParamValue::Float(1e-3)),
            ("mcs", ParamValue::Int(6)),
            ("mcs2", ParamValue::Int(6)),
            ("channelWidth", ParamValue::Int(40)),
            ("channelWidth2", ParamValue::Int(40)),
            ("nMldSta", ParamValue::Int(10)),
        ]),
        axes: vec![SweepAxis::ints("gi", "gi", [800, 1600, 3200])],
        repetitions: 1,
        base_seed: 1,
        seed_flag: "rngRun".into(),
        metrics: [triple("thpt", "thpt", "mbps"), triple("e2e", "e2e_delay", "ms")].concat(),
        charts: vec![
            ChartSpec::line(
                "Throughput vs. guard interval",
                "throughput.png",
                "gi",
                "Throughput (Mbps)",
                &["thpt_l1", "thpt_l2", "thpt_total"],
                false,
            ),
            ChartSpec::line(
                "End-to-end delay vs. guard interval",
                "e2e-delay.png",
                "gi",
                "End-to-end delay (ms)",
                &["e2e_l1", "e2e_l2", "e2e_total"],
                false,
            ),
        ],
    }
}

fn fixed(entries: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
    entries
        .iter()
        .map(|(flag, value)| (flag.to_string(), value.clone()))
        .collect()
}

/// Link 1, link 2 and total variants of one metric family.
fn triple(stem: &str, field_prefix: &str, field_suffix: &str) -> Vec<MetricSpec> {
    ["l1", "l2", "total"]
        .iter()
        .map(|link| {
            MetricSpec::new(
                &format!("{stem}_{link}"),
                &format!("{field_prefix}_{link}_{field_suffix}"),
            )
        })
        .collect()
}

fn mld_metrics() -> Vec<MetricSpec> {
    [
        triple("thpt", "thpt", "mbps"),
        triple("que", "que_delay", "ms"),
        triple("acc", "acc_delay", "ms"),
        triple("e2e", "e2e_delay", "ms"),
    ]
    .concat()
}

fn mld_line_charts(x_axis: &str, log_x: bool) -> Vec<ChartSpec> {
    vec![
        ChartSpec::line(
            "Throughput",
            "throughput.png",
            x_axis,
            "Throughput (Mbps)",
            &["thpt_l1", "thpt_l2", "thpt_total"],
            log_x,
        ),
        ChartSpec::line(
            "Queueing delay",
            "queue-delay.png",
            x_axis,
            "Queueing delay (ms)",
            &["que_l1", "que_l2", "que_total"],
            log_x,
        ),
        ChartSpec::line(
            "Access delay",
            "access-delay.png",
            x_axis,
            "Access delay (ms)",
            &["acc_l1", "acc_l2", "acc_total"],
            log_x,
        ),
        ChartSpec::line(
            "End-to-end delay",
            "e2e-delay.png",
            x_axis,
            "End-to-end delay (ms)",
            &["e2e_l1", "e2e_l2", "e2e_total"],
            log_x,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn every_preset_validates() {
        for plan in all() {
            plan.validate()
                .unwrap_or_else(|err| panic!("preset '{}' is invalid: {err}", plan.name));
        }
    }

    #[test]
    fn preset_names_are_unique() {
        let names: Vec<String> = all().into_iter().map(|plan| plan.name).collect();
        let unique: BTreeSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn by_name_finds_each_preset() {
        for plan in all() {
            let found = by_name(&plan.name).unwrap();
            assert_eq!(found.name, plan.name);
        }
    }

    #[test]
    fn unknown_preset_lists_the_known_ones() {
        let err = by_name("wat").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown preset 'wat'"), "{message}");
        assert!(message.contains("dcf-offered-load"), "{message}");
    }

    #[test]
    fn offered_load_sweeps_ten_decades() {
        let plan = dcf_offered_load();
        assert_eq!(plan.axes.len(), 1);
        assert_eq!(plan.axes[0].values.len(), 10);
        assert_eq!(plan.combination_count(), 10);
    }

    #[test]
    fn cw_grid_covers_every_pairing() {
        let plan = cw_grid();
        assert_eq!(plan.combination_count(), 9);
        let labels: Vec<String> = plan
            .combinations()
            .iter()
            .map(|combo| combo.label())
            .collect();
        assert!(labels.contains(&"cw_l1-16_cw_l2-64".to_string()));
        assert!(labels.contains(&"cw_l1-64_cw_l2-16".to_string()));
    }

    #[test]
    fn channel_mcs_grid_is_the_full_product() {
        assert_eq!(channel_mcs_grid().combination_count(), 81);
    }
}

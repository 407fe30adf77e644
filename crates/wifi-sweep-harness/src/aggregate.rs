use std::collections::BTreeMap;

use wifi_sweep_abstract::MetricSpec;

use crate::extract::Extraction;

/// Mean of every tracked metric, or `None` when no row survived.
///
/// Averaging over zero rows must surface as "no data" rather than zero: a
/// zero throughput is a real measurement, an empty file is a failed run.
pub fn metric_means(
    metrics: &[MetricSpec],
    extraction: &Extraction,
) -> Option<BTreeMap<String, f64>> {
    if extraction.valid_rows == 0 {
        return None;
    }
    let n = extraction.valid_rows as f64;
    Some(
        metrics
            .iter()
            .zip(&extraction.sums)
            .map(|(metric, sum)| (metric.name.clone(), sum / n))
            .collect(),
    )
}

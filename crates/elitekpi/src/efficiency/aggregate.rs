use super::config::MetricWeights;
use super::{EfficiencyMetric, ScoreBreakdown};

/// Weighted sum of the five sub-scores, rounded and clamped to `0..=100`.
pub(crate) fn weighted_overall(breakdown: &ScoreBreakdown, weights: &MetricWeights) -> u8 {
    let total: f64 = EfficiencyMetric::ordered()
        .into_iter()
        .map(|metric| weights.get(metric) * f64::from(breakdown.get(metric)))
        .sum();

    if total.is_nan() {
        return 0;
    }
    total.round().clamp(0.0, 100.0) as u8
}

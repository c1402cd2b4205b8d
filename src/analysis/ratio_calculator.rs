use std::collections::BTreeMap;

use crate::models::{Metric, MetricId, RatioSet};

/// Derive secondary ratios from the current-period metric values.
/// Each ratio needs both of its metrics and a non-zero denominator.
pub fn derive_ratios(metrics: &BTreeMap<MetricId, Metric>) -> RatioSet {
    RatioSet {
        debt_ratio: ratio_of(metrics, MetricId::TotalLiabilities, MetricId::TotalAssets),
        operating_margin: ratio_of(metrics, MetricId::OperatingProfit, MetricId::Revenue),
        net_margin: ratio_of(metrics, MetricId::NetIncome, MetricId::Revenue),
    }
}

fn ratio_of(
    metrics: &BTreeMap<MetricId, Metric>,
    numerator: MetricId,
    denominator: MetricId,
) -> Option<f64> {
    let numerator = metrics.get(&numerator)?;
    let denominator = metrics.get(&denominator)?;
    percentage(numerator.current, denominator.current)
}

fn percentage(numerator: i64, denominator: i64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some((numerator as f64 / denominator as f64) * 100.0)
}

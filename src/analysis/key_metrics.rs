use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{Metric, MetricId, NormalizedLineItem};

/// Exact account labels that feed the headline metrics
pub const KEY_ACCOUNTS: [(&str, MetricId); 6] = [
    ("자산총계", MetricId::TotalAssets),
    ("부채총계", MetricId::TotalLiabilities),
    ("자본총계", MetricId::TotalEquity),
    ("매출액", MetricId::Revenue),
    ("영업이익", MetricId::OperatingProfit),
    ("당기순이익", MetricId::NetIncome),
];

pub fn metric_for_account(account_name: &str) -> Option<MetricId> {
    KEY_ACCOUNTS
        .iter()
        .find(|(label, _)| *label == account_name)
        .map(|(_, id)| *id)
}

/// Percentage change; 0 when there is no previous value to compare against
pub fn change_rate(change: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (change as f64 / previous as f64) * 100.0
}

pub fn build_metric(name: &str, current: i64, previous: i64) -> Metric {
    let change = current.saturating_sub(previous);
    Metric {
        name: name.to_string(),
        current,
        previous,
        change,
        change_rate: change_rate(change, previous),
    }
}

/// Scan items for the key accounts.
///
/// When several items map to the same metric the last one wins; amounts are
/// never summed across items.
pub fn extract_metrics<'a, I>(items: I) -> BTreeMap<MetricId, Metric>
where
    I: IntoIterator<Item = &'a NormalizedLineItem>,
{
    let mut metrics = BTreeMap::new();

    for item in items {
        let Some(id) = metric_for_account(&item.account_name) else {
            continue;
        };

        let metric = build_metric(
            &item.account_name,
            item.current_period.amount,
            item.previous_period.amount,
        );
        if metrics.insert(id, metric).is_some() {
            debug!("{} seen again, keeping the later line item", id.as_str());
        }
    }

    metrics
}

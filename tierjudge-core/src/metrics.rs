/// Wilson score interval and the canonical item ordering.
///
/// Everything here is recomputed from the ledger on each call.
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::ledger::Ledger;
use crate::types::{Item, Metrics, Prior};

/// Lower bound of the Wilson score interval. 0 when `total <= 0`.
pub fn wilson_lower_bound(wins: f64, total: f64, z: f64) -> f64 {
    match wilson_parts(wins, total, z) {
        Some((center, margin, denom)) => ((center - margin) / denom).max(0.0),
        None => 0.0,
    }
}

/// Upper bound of the Wilson score interval. 0 when `total <= 0`.
pub fn wilson_upper_bound(wins: f64, total: f64, z: f64) -> f64 {
    match wilson_parts(wins, total, z) {
        Some((center, margin, denom)) => ((center + margin) / denom).min(1.0),
        None => 0.0,
    }
}

fn wilson_parts(wins: f64, total: f64, z: f64) -> Option<(f64, f64, f64)> {
    if total <= 0.0 {
        return None;
    }
    let p = wins / total;
    let z2 = z * z;
    let denom = 1.0 + z2 / total;
    let center = p + z2 / (2.0 * total);
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * total)) / total).sqrt();
    Some((center, margin, denom))
}

/// Per-item metrics keyed by item id.
///
/// With `priors`, an item's Wilson bounds use `wins + alpha` out of
/// `wins + losses + alpha + beta`. Items without an entry in `priors` are
/// scored on raw counts.
pub fn metrics_dictionary(
    items: &[Item],
    ledger: &Ledger,
    z: f64,
    priors: Option<&HashMap<String, Prior>>,
) -> HashMap<String, Metrics> {
    let mut out = HashMap::with_capacity(items.len());
    for item in items {
        let record = ledger.record(&item.id);
        let prior = priors.and_then(|p| p.get(&item.id)).copied();

        let (eff_wins, eff_losses) = match prior {
            Some(p) => (record.wins as f64 + p.alpha, record.losses as f64 + p.beta),
            None => (record.wins as f64, record.losses as f64),
        };
        let eff_total = eff_wins + eff_losses;

        out.insert(
            item.id.clone(),
            Metrics {
                id: item.id.clone(),
                wins: record.wins,
                comparisons: record.total,
                win_rate: record.win_rate,
                wilson_lb: wilson_lower_bound(eff_wins, eff_total, z),
                wilson_ub: wilson_upper_bound(eff_wins, eff_total, z),
                name_key: item.name_key(),
            },
        );
    }
    out
}

/// Canonical comparison: wilsonLB desc, comparisons desc, wins desc,
/// then name key and id ascending.
pub fn compare_metrics(a: &Metrics, b: &Metrics) -> Ordering {
    b.wilson_lb
        .total_cmp(&a.wilson_lb)
        .then_with(|| b.comparisons.cmp(&a.comparisons))
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.name_key.cmp(&b.name_key))
        .then_with(|| a.id.cmp(&b.id))
}

/// Items sorted into the canonical ranking. Items missing from `metrics`
/// sort as if they had never been compared.
pub fn ordered_items(items: &[Item], metrics: &HashMap<String, Metrics>) -> Vec<Item> {
    let mut ordered: Vec<Item> = items.to_vec();
    ordered.sort_by(|a, b| {
        let ma = metrics_or_empty(a, metrics);
        let mb = metrics_or_empty(b, metrics);
        compare_metrics(&ma, &mb)
    });
    ordered
}

pub(crate) fn metrics_or_empty(item: &Item, metrics: &HashMap<String, Metrics>) -> Metrics {
    metrics.get(&item.id).cloned().unwrap_or_else(|| Metrics {
        id: item.id.clone(),
        wins: 0,
        comparisons: 0,
        win_rate: 0.0,
        wilson_lb: 0.0,
        wilson_ub: 0.0,
        name_key: item.name_key(),
    })
}

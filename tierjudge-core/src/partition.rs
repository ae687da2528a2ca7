/// Cut selection over an ordered item sequence.
///
/// A cut `c` means "a new tier starts at index `c`". Cuts are always ascending
/// and strictly inside `(0, len)`.
use std::collections::HashMap;

use crate::constants::CONF_BONUS_BETA;
use crate::metrics::metrics_or_empty;
use crate::types::{Item, Metrics};

/// Item id → 1-based tier number.
pub type TierMap = HashMap<String, usize>;

/// Evenly spaced cuts splitting `count` items into `tier_count` groups.
pub fn quantile_cuts(count: usize, tier_count: usize) -> Vec<usize> {
    if tier_count <= 1 || count <= 1 {
        return Vec::new();
    }
    let mut cuts: Vec<usize> = (1..tier_count)
        .map(|i| (i as f64 * count as f64 / tier_count as f64).round() as usize)
        .filter(|&c| c > 0 && c < count)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

/// Cuts placed where neighbouring confidence intervals separate.
///
/// Each adjacent pair `(i, i+1)` scores
/// `gap * ln(1 + min(n_i, n_{i+1}) + CONF_BONUS_BETA * max(n_i, n_{i+1}))`
/// with `gap = max(0, lb_i - ub_{i+1} + overlap_eps)`. The best
/// `tier_count - 1` boundaries win. Pairs with no gap are never cut, so the
/// result can be shorter than `tier_count - 1`.
pub fn drop_cuts(
    ordered: &[Item],
    metrics: &HashMap<String, Metrics>,
    tier_count: usize,
    overlap_eps: f64,
) -> Vec<usize> {
    if tier_count <= 1 || ordered.len() <= 1 {
        return Vec::new();
    }

    let resolved: Vec<Metrics> = ordered.iter().map(|item| metrics_or_empty(item, metrics)).collect();

    // (boundary index, score)
    let mut scored: Vec<(usize, f64)> = Vec::new();
    for i in 0..resolved.len() - 1 {
        let upper = &resolved[i];
        let lower = &resolved[i + 1];
        let gap = (upper.wilson_lb - lower.wilson_ub + overlap_eps).max(0.0);
        if gap <= 0.0 {
            continue;
        }
        let n_min = upper.comparisons.min(lower.comparisons) as f64;
        let n_max = upper.comparisons.max(lower.comparisons) as f64;
        let score = gap * (1.0 + n_min + CONF_BONUS_BETA * n_max).ln();
        tracing::trace!(boundary = i + 1, gap, score, "drop-cut candidate");
        scored.push((i + 1, score));
    }

    // Highest score first; earlier boundary wins ties.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut cuts: Vec<usize> = scored.into_iter().take(tier_count - 1).map(|(idx, _)| idx).collect();
    cuts.sort_unstable();
    cuts
}

/// Assign 1-based tier numbers by walking `ordered` once.
///
/// The tier advances each time the walk reaches the next cut; it never
/// exceeds `tier_count`.
pub fn tier_map_for_cuts(ordered: &[Item], cuts: &[usize], tier_count: usize) -> TierMap {
    let cap = tier_count.max(1);
    let mut map = HashMap::with_capacity(ordered.len());
    let mut tier = 1usize;
    let mut next_cut = 0usize;

    for (idx, item) in ordered.iter().enumerate() {
        while next_cut < cuts.len() && idx >= cuts[next_cut] {
            tier += 1;
            next_cut += 1;
        }
        map.insert(item.id.clone(), tier.min(cap));
    }
    map
}

/// Fraction of `universe` whose tier differs between `old` and `new`.
///
/// An id missing from one map but present in the other counts as changed.
pub fn churn_fraction(old: &TierMap, new: &TierMap, universe: &[Item]) -> f64 {
    if universe.is_empty() {
        return 0.0;
    }
    let changed = universe
        .iter()
        .filter(|item| old.get(&item.id) != new.get(&item.id))
        .count();
    changed as f64 / universe.len() as f64
}

/// First-pass coarse tiering.
///
/// Rankable items are split by quantile cuts over a prior-biased ordering,
/// where the prior comes from each item's current tier. Undersampled items
/// are parked in `UNRANKED`.
use std::collections::HashSet;

use crate::constants::{
    FRONTIER_WINDOW, MIN_SUGGESTED_PAIRS, QUICK_Z, UNRANKED, WARM_UP_PER_ITEM, WARM_UP_PER_TIER,
};
use crate::ledger::Ledger;
use crate::metrics::{metrics_dictionary, ordered_items};
use crate::pairing::refinement_pairs;
use crate::partition::{quantile_cuts, tier_map_for_cuts};
use crate::priors::build_priors;
use crate::tiers::Tiers;
use crate::types::{
    operative_tier_names, Artifacts, ComparisonPair, FrontierWindow, Item, PassMode, RankingConfig,
};

/// Result of `quick_tier_pass`.
#[derive(Debug, Clone)]
pub struct QuickPassOutcome {
    pub tiers: Tiers,
    /// `None` when nothing was rankable (or the input was degenerate).
    pub artifacts: Option<Artifacts>,
    pub suggested_pairs: Vec<ComparisonPair>,
}

/// Coarse tiering of `pool` over `tier_order`, warm-started from `base_tiers`.
///
/// `base_tiers` is never modified; the returned board is a rebuilt copy.
pub fn quick_tier_pass(
    pool: &[Item],
    ledger: &Ledger,
    tier_order: &[String],
    base_tiers: &Tiers,
    config: &RankingConfig,
) -> QuickPassOutcome {
    let tier_names = operative_tier_names(tier_order);
    if pool.is_empty() || tier_names.is_empty() {
        return QuickPassOutcome {
            tiers: base_tiers.clone(),
            artifacts: None,
            suggested_pairs: Vec::new(),
        };
    }

    let mut tiers = prepare_canvas(pool, base_tiers, &tier_names);
    let (rankable, undersampled) = split_by_comparisons(pool, ledger, config.min_comparisons);
    let priors = build_priors(pool, base_tiers, &tier_names, config.prior_strength);

    let undersampled_metrics = metrics_dictionary(&undersampled, ledger, QUICK_Z, Some(&priors));
    let undersampled = ordered_items(&undersampled, &undersampled_metrics);

    if rankable.is_empty() {
        tracing::debug!(undersampled = undersampled.len(), "quick pass: nothing rankable yet");
        tiers.bucket_mut(UNRANKED).extend(undersampled);
        return QuickPassOutcome { tiers, artifacts: None, suggested_pairs: Vec::new() };
    }

    let metrics = metrics_dictionary(&rankable, ledger, QUICK_Z, Some(&priors));
    let ordered = ordered_items(&rankable, &metrics);
    let tier_count = tier_names.len();
    let cuts = quantile_cuts(ordered.len(), tier_count);

    assign_by_cuts(&mut tiers, &ordered, &cuts, &tier_names);
    tiers.bucket_mut(UNRANKED).extend(undersampled.iter().cloned());

    tracing::debug!(
        rankable = ordered.len(),
        undersampled = undersampled.len(),
        ?cuts,
        "quick pass"
    );

    let artifacts = Artifacts {
        mode: PassMode::Quick,
        tier_names,
        frontier: build_frontier(&cuts, ordered.len()),
        warm_up_comparisons: warm_up_target(ordered.len(), tier_count),
        rankable: ordered,
        undersampled,
        provisional_cuts: cuts,
    };

    let limit = MIN_SUGGESTED_PAIRS.max(tier_count - 1);
    let suggested_pairs = refinement_pairs(&artifacts, ledger, limit);

    QuickPassOutcome { tiers, artifacts: Some(artifacts), suggested_pairs }
}

/// Copy of `base_tiers` ready to be refilled: operative tiers emptied, and
/// pool items removed from every other tier (including `UNRANKED`).
pub(crate) fn prepare_canvas(pool: &[Item], base_tiers: &Tiers, tier_names: &[String]) -> Tiers {
    let mut canvas = base_tiers.normalized(tier_names);
    let pool_ids: HashSet<&str> = pool.iter().map(|i| i.id.as_str()).collect();

    for (name, bucket) in canvas.buckets_mut() {
        if tier_names.iter().any(|n| n == name) {
            bucket.clear();
        } else {
            bucket.retain(|item| !pool_ids.contains(item.id.as_str()));
        }
    }
    canvas
}

/// (rankable, undersampled), both in pool order.
pub(crate) fn split_by_comparisons(
    pool: &[Item],
    ledger: &Ledger,
    min_comparisons: u32,
) -> (Vec<Item>, Vec<Item>) {
    pool.iter()
        .cloned()
        .partition(|item| ledger.total(&item.id) >= min_comparisons)
}

/// Push `ordered` into the operative tiers, tier `k` (1-based) receiving the
/// items between cut `k-1` and cut `k`.
pub(crate) fn assign_by_cuts(tiers: &mut Tiers, ordered: &[Item], cuts: &[usize], tier_names: &[String]) {
    let map = tier_map_for_cuts(ordered, cuts, tier_names.len());
    for item in ordered {
        let tier = map.get(&item.id).copied().unwrap_or(1);
        tiers.bucket_mut(&tier_names[tier - 1]).push(item.clone());
    }
}

/// Index windows of `FRONTIER_WINDOW` items on each side of every cut.
pub(crate) fn build_frontier(cuts: &[usize], len: usize) -> Vec<FrontierWindow> {
    cuts.iter()
        .map(|&cut| FrontierWindow {
            cut,
            upper: (cut.saturating_sub(FRONTIER_WINDOW)..cut).collect(),
            lower: (cut..(cut + FRONTIER_WINDOW).min(len)).collect(),
        })
        .collect()
}

/// Comparisons expected before refinement may trust small interval margins.
pub(crate) fn warm_up_target(rankable: usize, tier_count: usize) -> usize {
    let per_item = (WARM_UP_PER_ITEM * rankable as f64).ceil() as usize;
    per_item.max(WARM_UP_PER_TIER * tier_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Ledger with exact (wins, losses) per item, using a sink opponent that
    /// is not part of the pool.
    fn ledger_with(records: &[(&str, u32, u32)]) -> Ledger {
        let mut ledger = Ledger::new();
        for &(id, wins, losses) in records {
            for _ in 0..wins {
                ledger.vote(id, "__sink", id).unwrap();
            }
            for _ in 0..losses {
                ledger.vote(id, "__sink", "__sink").unwrap();
            }
        }
        ledger
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_empty_pool_returns_input() {
        let tier_order = order(&["S", "A"]);
        let base = Tiers::new(&tier_order).with_tier("S", vec![Item::new("keep", "")]);
        let out = quick_tier_pass(&[], &Ledger::new(), &tier_order, &base, &RankingConfig::default());
        assert_eq!(out.tiers, base);
        assert!(out.artifacts.is_none());
        assert!(out.suggested_pairs.is_empty());
    }

    #[test]
    fn test_blank_tier_names_return_input() {
        let base = Tiers::default();
        let pool = vec![Item::new("a", "")];
        let out = quick_tier_pass(&pool, &Ledger::new(), &order(&["", "  ", "unranked"]), &base, &RankingConfig::default());
        assert_eq!(out.tiers, base);
        assert!(out.artifacts.is_none());
    }

    #[test]
    fn test_four_item_example() {
        let ledger = ledger_with(&[("alpha", 6, 1), ("beta", 4, 3), ("gamma", 2, 1), ("delta", 0, 1)]);
        let pool = vec![
            Item::new("alpha", "Alpha"),
            Item::new("beta", "Beta"),
            Item::new("gamma", "Gamma"),
            Item::new("delta", "Delta"),
        ];
        let tier_order = order(&["S", "A", "B", "C"]);
        let base = Tiers::new(&tier_order);

        let out = quick_tier_pass(&pool, &ledger, &tier_order, &base, &RankingConfig::default());

        let artifacts = out.artifacts.expect("three items are rankable");
        assert_eq!(artifacts.mode, PassMode::Quick);
        assert_eq!(ids(&artifacts.undersampled), vec!["delta"]);
        assert_eq!(ids(&artifacts.rankable), vec!["alpha", "beta", "gamma"]);
        assert_eq!(artifacts.provisional_cuts, vec![1, 2]);
        assert_eq!(artifacts.warm_up_comparisons, 8);

        assert_eq!(ids(out.tiers.unranked()), vec!["delta"]);
        assert_eq!(ids(out.tiers.get("S")), vec!["alpha"]);
        assert_eq!(ids(out.tiers.get("A")), vec!["beta"]);
        assert_eq!(ids(out.tiers.get("B")), vec!["gamma"]);
        assert!(out.tiers.get("C").is_empty());
    }

    #[test]
    fn test_nothing_rankable_goes_to_unranked() {
        let ledger = ledger_with(&[("a", 1, 0), ("b", 0, 1)]);
        let pool = vec![Item::new("a", ""), Item::new("b", ""), Item::new("c", "")];
        let tier_order = order(&["S", "A"]);
        let out = quick_tier_pass(&pool, &ledger, &tier_order, &Tiers::new(&tier_order), &RankingConfig::default());

        assert!(out.artifacts.is_none());
        assert_eq!(ids(out.tiers.unranked()), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_stale_membership_is_removed() {
        let ledger = ledger_with(&[("a", 2, 0), ("b", 0, 2)]);
        let pool = vec![Item::new("a", ""), Item::new("b", "")];
        let tier_order = order(&["S", "A"]);
        let base = Tiers::new(&tier_order)
            .with_tier("Old", vec![Item::new("a", ""), Item::new("outsider", "")])
            .with_tier(UNRANKED, vec![Item::new("b", ""), Item::new("parked", "")])
            .with_tier("S", vec![Item::new("dropped", "")]);

        let out = quick_tier_pass(&pool, &ledger, &tier_order, &base, &RankingConfig::default());

        assert_eq!(ids(out.tiers.get("Old")), vec!["outsider"]);
        assert_eq!(ids(out.tiers.unranked()), vec!["parked"]);
        assert_eq!(ids(out.tiers.get("S")), vec!["a"]);
        assert_eq!(ids(out.tiers.get("A")), vec!["b"]);
        // caller's board is untouched
        assert_eq!(base.tier_of("a"), Some("Old"));
    }

    #[test]
    fn test_current_tier_biases_close_calls() {
        // Identical records: only the prior separates them.
        let ledger = ledger_with(&[("x", 2, 2), ("y", 2, 2)]);
        let pool = vec![Item::new("x", ""), Item::new("y", "")];
        let tier_order = order(&["S", "F"]);
        let base = Tiers::new(&tier_order)
            .with_tier("S", vec![Item::new("y", "")])
            .with_tier("F", vec![Item::new("x", "")]);

        let out = quick_tier_pass(&pool, &ledger, &tier_order, &base, &RankingConfig::default());
        assert_eq!(ids(out.tiers.get("S")), vec!["y"]);
        assert_eq!(ids(out.tiers.get("F")), vec!["x"]);
    }

    #[test]
    fn test_frontier_windows() {
        let frontier = build_frontier(&[1, 5], 6);
        assert_eq!(frontier[0].upper, vec![0]);
        assert_eq!(frontier[0].lower, vec![1, 2]);
        assert_eq!(frontier[1].upper, vec![3, 4]);
        assert_eq!(frontier[1].lower, vec![5]);
    }

    #[test]
    fn test_warm_up_target() {
        assert_eq!(warm_up_target(3, 4), 8);
        assert_eq!(warm_up_target(20, 4), 30);
        assert_eq!(warm_up_target(7, 2), 11);
    }

    #[test]
    fn test_quick_pass_suggests_pairs() {
        let records: Vec<(String, u32, u32)> = (0..10).map(|i| (format!("i{i}"), 10 - i, i)).collect();
        let borrowed: Vec<(&str, u32, u32)> = records.iter().map(|(id, w, l)| (id.as_str(), *w, *l)).collect();
        let ledger = ledger_with(&borrowed);
        let pool: Vec<Item> = records.iter().map(|(id, _, _)| Item::new(id.clone(), "")).collect();
        let tier_order = order(&["S", "A", "B"]);

        let out = quick_tier_pass(&pool, &ledger, &tier_order, &Tiers::new(&tier_order), &RankingConfig::default());
        assert!(!out.suggested_pairs.is_empty());
        assert!(out.suggested_pairs.len() <= MIN_SUGGESTED_PAIRS);
        for (a, b) in &out.suggested_pairs {
            assert_ne!(a.id, b.id);
        }
    }
}

/// Vote-driven refinement of tier boundaries.
///
/// Each pass recomputes confidence-gap cuts from observed data only and
/// adopts them over plain quantile cuts only when doing so would not move
/// too many items at once.
use std::collections::HashMap;

use crate::constants::{
    BOTTOM_CLUSTER_SIZE, BOTTOM_CLUSTER_UPPER_BOUND, HARD_CHURN_THRESHOLD, QUICK_Z,
    SMALL_POOL_LIMIT, SOFT_CHURN_THRESHOLD, STABLE_Z, STABLE_Z_AVERAGE_COMPARISONS, UNRANKED,
    WARM_OVERLAP_EPS,
};
use crate::ledger::Ledger;
use crate::metrics::{metrics_dictionary, metrics_or_empty, ordered_items};
use crate::partition::{churn_fraction, drop_cuts, quantile_cuts, tier_map_for_cuts};
use crate::quick_pass::{assign_by_cuts, build_frontier, prepare_canvas, split_by_comparisons, warm_up_target};
use crate::tiers::Tiers;
use crate::types::{Artifacts, Item, Metrics, PassMode, RankingConfig};

/// Which cut set a refinement pass adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CutSource {
    Refined,
    Quantile,
}

/// Diagnostics for one refinement pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefinementReport {
    pub z: f64,
    pub overlap_eps: f64,
    /// Comparisons among rankable items (each vote counted once).
    pub total_comparisons: usize,
    pub required_comparisons: usize,
    /// min(1, total / required).
    pub ramp: f64,
    /// Fraction of rankable items whose tier differs between quantile and refined cuts.
    pub churn: f64,
    pub refined_cuts: Vec<usize>,
    pub quantile_cuts: Vec<usize>,
    pub cut_source: CutSource,
}

/// Result of `refine_tiers`.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub tiers: Tiers,
    pub artifacts: Option<Artifacts>,
    /// `None` when nothing was rankable.
    pub report: Option<RefinementReport>,
}

/// z for the current evidence level: loose while the average rankable item
/// has fewer than `STABLE_Z_AVERAGE_COMPARISONS` comparisons.
pub fn refinement_z(average_comparisons: f64) -> f64 {
    if average_comparisons < STABLE_Z_AVERAGE_COMPARISONS {
        QUICK_Z
    } else {
        STABLE_Z
    }
}

/// Hysteresis gate between refined and quantile cuts.
///
/// Small pools always take the refined cuts. Otherwise churn must be under
/// the soft threshold, or under the hard threshold scaled by `ramp`.
pub fn churn_gate(item_count: usize, churn: f64, ramp: f64) -> CutSource {
    if item_count <= SMALL_POOL_LIMIT
        || churn <= SOFT_CHURN_THRESHOLD
        || churn <= HARD_CHURN_THRESHOLD * ramp
    {
        CutSource::Refined
    } else {
        CutSource::Quantile
    }
}

/// Fill missing boundaries from the quantile cuts when the confidence-gap
/// cuts came up short: sorted union, truncated to `tier_count - 1`.
pub fn merge_cuts(primary: &[usize], quantile: &[usize], tier_count: usize) -> Vec<usize> {
    let wanted = tier_count.saturating_sub(1);
    if primary.len() >= wanted {
        return primary.to_vec();
    }
    let mut merged: Vec<usize> = primary.iter().chain(quantile.iter()).copied().collect();
    merged.sort_unstable();
    merged.dedup();
    merged.truncate(wanted);
    merged
}

/// Pull the last cut to the bottom cluster.
///
/// Scans the last `BOTTOM_CLUSTER_SIZE` positions top-down; the first item
/// whose upper bound exceeds `BOTTOM_CLUSTER_UPPER_BOUND` becomes the new last
/// cut. When every item there is confidently low the cuts are returned as-is.
/// Returns a new vector; the move is skipped when it would break strict
/// ordering of the cuts.
pub fn adjust_bottom_cluster(cuts: &[usize], ordered: &[Item], metrics: &HashMap<String, Metrics>) -> Vec<usize> {
    let mut adjusted = cuts.to_vec();
    let n = ordered.len();
    if adjusted.is_empty() || n == 0 {
        return adjusted;
    }

    let window_start = n - BOTTOM_CLUSTER_SIZE.min(n);
    let Some(target) = (window_start..n)
        .find(|&i| metrics_or_empty(&ordered[i], metrics).wilson_ub > BOTTOM_CLUSTER_UPPER_BOUND)
    else {
        return adjusted;
    };

    let last = adjusted.len() - 1;
    let floor = if last > 0 { adjusted[last - 1] } else { 0 };
    if target > floor {
        adjusted[last] = target;
    }
    adjusted
}

/// Re-tier the items of a previous pass from observed votes only.
///
/// Items that have since reached the minimum comparison count are promoted
/// out of the undersampled set. The warm-up target is recomputed from the
/// rankable count after promotion; `artifacts.warm_up_comparisons` from the
/// previous pass is not read.
pub fn refine_tiers(
    artifacts: &Artifacts,
    ledger: &Ledger,
    base_tiers: &Tiers,
    config: &RankingConfig,
) -> RefinementOutcome {
    let tier_names = artifacts.tier_names.clone();
    let universe: Vec<Item> = artifacts
        .rankable
        .iter()
        .chain(artifacts.undersampled.iter())
        .cloned()
        .collect();

    if universe.is_empty() || tier_names.is_empty() {
        return RefinementOutcome { tiers: base_tiers.clone(), artifacts: None, report: None };
    }

    let mut tiers = prepare_canvas(&universe, base_tiers, &tier_names);
    let (rankable, undersampled) = split_by_comparisons(&universe, ledger, config.min_comparisons);

    let undersampled_metrics = metrics_dictionary(&undersampled, ledger, STABLE_Z, None);
    let undersampled = ordered_items(&undersampled, &undersampled_metrics);

    if rankable.is_empty() {
        tiers.bucket_mut(UNRANKED).extend(undersampled);
        return RefinementOutcome { tiers, artifacts: None, report: None };
    }

    let n = rankable.len();
    let tier_count = tier_names.len();
    let comparison_sum: u64 = rankable.iter().map(|i| ledger.total(&i.id) as u64).sum();
    let average = comparison_sum as f64 / n as f64;
    let z = refinement_z(average);

    let metrics = metrics_dictionary(&rankable, ledger, z, None);
    let ordered = ordered_items(&rankable, &metrics);

    let total_comparisons = (comparison_sum / 2) as usize;
    let required = warm_up_target(n, tier_count);
    let overlap_eps = if total_comparisons >= required { WARM_OVERLAP_EPS } else { 0.0 };

    let primary = drop_cuts(&ordered, &metrics, tier_count, overlap_eps);
    let quantile = quantile_cuts(n, tier_count);
    let merged = merge_cuts(&primary, &quantile, tier_count);
    let refined = adjust_bottom_cluster(&merged, &ordered, &metrics);

    let quantile_map = tier_map_for_cuts(&ordered, &quantile, tier_count);
    let refined_map = tier_map_for_cuts(&ordered, &refined, tier_count);
    let churn = churn_fraction(&quantile_map, &refined_map, &ordered);
    let ramp = if required == 0 {
        1.0
    } else {
        (total_comparisons as f64 / required as f64).min(1.0)
    };

    let cut_source = churn_gate(n, churn, ramp);
    let cuts = match cut_source {
        CutSource::Refined => refined.clone(),
        CutSource::Quantile => quantile.clone(),
    };

    tracing::debug!(
        rankable = n,
        z,
        overlap_eps,
        churn,
        ramp,
        ?cut_source,
        ?cuts,
        "refinement pass"
    );

    assign_by_cuts(&mut tiers, &ordered, &cuts, &tier_names);
    tiers.bucket_mut(UNRANKED).extend(undersampled.iter().cloned());

    let report = RefinementReport {
        z,
        overlap_eps,
        total_comparisons,
        required_comparisons: required,
        ramp,
        churn,
        refined_cuts: refined,
        quantile_cuts: quantile,
        cut_source,
    };

    let artifacts = Artifacts {
        mode: PassMode::Done,
        tier_names,
        frontier: build_frontier(&cuts, n),
        warm_up_comparisons: required,
        rankable: ordered,
        undersampled,
        provisional_cuts: cuts,
    };

    RefinementOutcome { tiers, artifacts: Some(artifacts), report: Some(report) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quick_pass::quick_tier_pass;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn pool(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new(format!("i{i:02}"), "")).collect()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_refinement_z() {
        assert_eq!(refinement_z(0.0), QUICK_Z);
        assert_eq!(refinement_z(2.99), QUICK_Z);
        assert_eq!(refinement_z(3.0), STABLE_Z);
    }

    #[test]
    fn test_churn_gate_small_pool_always_refines() {
        assert_eq!(churn_gate(16, 1.0, 0.0), CutSource::Refined);
    }

    #[test]
    fn test_churn_gate_soft_threshold() {
        assert_eq!(churn_gate(40, 0.12, 0.0), CutSource::Refined);
        assert_eq!(churn_gate(40, 0.13, 0.0), CutSource::Quantile);
    }

    #[test]
    fn test_churn_gate_hard_threshold_ramps() {
        assert_eq!(churn_gate(40, 0.2, 0.5), CutSource::Quantile);
        assert_eq!(churn_gate(40, 0.2, 1.0), CutSource::Refined);
        assert_eq!(churn_gate(40, 0.3, 1.0), CutSource::Quantile);
    }

    #[test]
    fn test_merge_cuts() {
        assert_eq!(merge_cuts(&[4], &[3, 6, 9], 4), vec![3, 4, 6]);
        assert_eq!(merge_cuts(&[2, 5, 8], &[3, 6, 9], 4), vec![2, 5, 8]);
        assert_eq!(merge_cuts(&[], &[3, 6, 9], 4), vec![3, 6, 9]);
        assert_eq!(merge_cuts(&[3], &[3], 3), vec![3]);
    }

    fn ledger_from(records: &[(String, u32, u32)]) -> Ledger {
        let mut ledger = Ledger::new();
        for (id, wins, losses) in records {
            for _ in 0..*wins {
                ledger.vote(id, "__sink", id).unwrap();
            }
            for _ in 0..*losses {
                ledger.vote(id, "__sink", "__sink").unwrap();
            }
        }
        ledger
    }

    /// 8 items: `strong` of them at 6-6, the rest at 0-12.
    fn split_board(strong: usize) -> (Vec<Item>, HashMap<String, Metrics>) {
        let items = pool(8);
        let records: Vec<(String, u32, u32)> = items
            .iter()
            .enumerate()
            .map(|(i, it)| if i < strong { (it.id.clone(), 6, 6) } else { (it.id.clone(), 0, 12) })
            .collect();
        let ledger = ledger_from(&records);
        let metrics = metrics_dictionary(&items, &ledger, STABLE_Z, None);
        let ordered = ordered_items(&items, &metrics);
        (ordered, metrics)
    }

    #[test]
    fn test_adjust_bottom_cluster_moves_last_cut() {
        // Window is positions 4..8; position 4 is still 6-6, so its upper bound is high.
        let (ordered, metrics) = split_board(6);
        assert!(metrics[&ordered[4].id].wilson_ub > BOTTOM_CLUSTER_UPPER_BOUND);
        assert!(metrics[&ordered[6].id].wilson_ub <= BOTTOM_CLUSTER_UPPER_BOUND);

        assert_eq!(adjust_bottom_cluster(&[2, 6], &ordered, &metrics), vec![2, 4]);
        assert_eq!(adjust_bottom_cluster(&[2, 7], &ordered, &metrics), vec![2, 4]);
        assert_eq!(adjust_bottom_cluster(&[3], &ordered, &metrics), vec![4]);
        // would collide with the previous cut: left alone
        assert_eq!(adjust_bottom_cluster(&[4, 7], &ordered, &metrics), vec![4, 7]);
    }

    #[test]
    fn test_adjust_bottom_cluster_confident_tail_is_noop() {
        // Every item in the window is 0-12, all upper bounds below the threshold.
        let (ordered, metrics) = split_board(4);
        assert!((4..8).all(|i| metrics[&ordered[i].id].wilson_ub <= BOTTOM_CLUSTER_UPPER_BOUND));

        assert_eq!(adjust_bottom_cluster(&[2, 6], &ordered, &metrics), vec![2, 6]);
        assert_eq!(adjust_bottom_cluster(&[2, 7], &ordered, &metrics), vec![2, 7]);
        assert!(adjust_bottom_cluster(&[], &ordered, &metrics).is_empty());
    }

    #[test]
    fn test_adjust_bottom_cluster_uncertain_tail_takes_first_window_item() {
        // 20 items, all 3-3: the whole window is uncertain.
        let items = pool(20);
        let records: Vec<(String, u32, u32)> = items.iter().map(|it| (it.id.clone(), 3, 3)).collect();
        let ledger = ledger_from(&records);
        let metrics = metrics_dictionary(&items, &ledger, STABLE_Z, None);
        let ordered = ordered_items(&items, &metrics);

        assert_eq!(adjust_bottom_cluster(&[5, 10, 15], &ordered, &metrics), vec![5, 10, 16]);
        assert_eq!(adjust_bottom_cluster(&[5, 10, 18], &ordered, &metrics), vec![5, 10, 16]);
    }

    #[test]
    fn test_adjust_bottom_cluster_keeps_cut_above_confident_tail() {
        // 16 items at 3-3 over four items at 0-30.
        let items = pool(20);
        let records: Vec<(String, u32, u32)> = items
            .iter()
            .enumerate()
            .map(|(i, it)| if i < 16 { (it.id.clone(), 3, 3) } else { (it.id.clone(), 0, 30) })
            .collect();
        let ledger = ledger_from(&records);
        let metrics = metrics_dictionary(&items, &ledger, STABLE_Z, None);
        let ordered = ordered_items(&items, &metrics);
        assert!((16..20).all(|i| metrics[&ordered[i].id].wilson_ub <= BOTTOM_CLUSTER_UPPER_BOUND));

        assert_eq!(adjust_bottom_cluster(&[5, 10, 18], &ordered, &metrics), vec![5, 10, 18]);
        assert_eq!(adjust_bottom_cluster(&[5, 10, 15], &ordered, &metrics), vec![5, 10, 15]);
    }

    #[test]
    fn test_refinement_marks_done_and_promotes_items() {
        let items = pool(4);
        let tier_order = order(&["S", "A"]);
        let mut ledger = Ledger::new();
        ledger.vote("i00", "i01", "i00").unwrap();
        ledger.vote("i00", "i02", "i00").unwrap();
        ledger.vote("i01", "i02", "i01").unwrap();

        let quick = quick_tier_pass(&items, &ledger, &tier_order, &Tiers::new(&tier_order), &RankingConfig::default());
        let artifacts = quick.artifacts.expect("rankable");
        assert_eq!(ids(&artifacts.undersampled), vec!["i03"]);

        ledger.vote("i03", "i02", "i02").unwrap();
        ledger.vote("i03", "i01", "i01").unwrap();

        let out = refine_tiers(&artifacts, &ledger, &quick.tiers, &RankingConfig::default());
        let refined = out.artifacts.expect("still rankable");
        assert_eq!(refined.mode, PassMode::Done);
        assert!(refined.undersampled.is_empty());
        assert_eq!(refined.rankable.len(), 4);
        assert!(out.tiers.unranked().is_empty());
        assert_eq!(out.tiers.get("S").len() + out.tiers.get("A").len(), 4);
        assert_eq!(out.tiers.get("S")[0].id, "i00");

        // Warm-up target follows the four rankable items, not the quick pass's three.
        assert_eq!(artifacts.warm_up_comparisons, 5);
        assert_eq!(refined.warm_up_comparisons, 6);
        let report = out.report.expect("report");
        assert_eq!(report.required_comparisons, 6);
        assert_eq!(report.total_comparisons, 5);
        assert_eq!(report.cut_source, CutSource::Refined);
    }

    #[test]
    fn test_overlap_eps_switches_on_after_warm_up() {
        let items = pool(4);
        let tier_order = order(&["S", "A"]);
        let artifacts = Artifacts {
            mode: PassMode::Quick,
            tier_names: tier_order.clone(),
            rankable: items.clone(),
            undersampled: vec![],
            provisional_cuts: vec![2],
            frontier: build_frontier(&[2], 4),
            warm_up_comparisons: 6,
        };

        // A cycle gives every item two comparisons but only four votes in total.
        let mut ledger = Ledger::new();
        for (a, b) in [("i00", "i01"), ("i01", "i02"), ("i02", "i03"), ("i03", "i00")] {
            ledger.vote(a, b, a).unwrap();
        }
        let early = refine_tiers(&artifacts, &ledger, &Tiers::new(&tier_order), &RankingConfig::default())
            .report
            .expect("rankable");
        assert_eq!(early.total_comparisons, 4);
        assert_eq!(early.required_comparisons, 6);
        assert_eq!(early.overlap_eps, 0.0);

        ledger.vote("i00", "i02", "i00").unwrap();
        ledger.vote("i01", "i03", "i01").unwrap();
        let warm = refine_tiers(&artifacts, &ledger, &Tiers::new(&tier_order), &RankingConfig::default())
            .report
            .expect("rankable");
        assert_eq!(warm.total_comparisons, 6);
        assert_eq!(warm.overlap_eps, WARM_OVERLAP_EPS);
    }

    #[test]
    fn test_refinement_every_item_in_one_tier() {
        let items = pool(12);
        let mut ledger = Ledger::new();
        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                ledger.vote(&a.id, &b.id, &a.id).unwrap();
            }
        }
        let tier_order = order(&["S", "A", "B", "C"]);
        let quick = quick_tier_pass(&items, &ledger, &tier_order, &Tiers::new(&tier_order), &RankingConfig::default());
        let out = refine_tiers(quick.artifacts.as_ref().expect("rankable"), &ledger, &quick.tiers, &RankingConfig::default());

        let mut seen = std::collections::HashSet::new();
        for (_, members) in out.tiers.iter_ordered(&tier_order) {
            for item in members {
                assert!(seen.insert(item.id.clone()), "{} placed twice", item.id);
            }
        }
        assert_eq!(seen.len(), 12);
        let cuts = &out.artifacts.expect("rankable").provisional_cuts;
        assert!(cuts.len() <= 3);
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
    }

    /// 20 items whose confidence-gap cuts land far from the quantile cuts,
    /// with very little evidence overall.
    #[test]
    fn test_large_pool_high_churn_falls_back_to_quantile() {
        let items = pool(20);
        // Top item dominates, the rest are indistinguishable: the only
        // separated boundary is right after the first item.
        let mut records: Vec<(String, u32, u32)> = vec![(items[0].id.clone(), 10, 0)];
        for it in items.iter().skip(1) {
            records.push((it.id.clone(), 1, 1));
        }
        let ledger = ledger_from(&records);

        let tier_order = order(&["S", "A", "B", "C"]);
        let artifacts = Artifacts {
            mode: PassMode::Quick,
            tier_names: tier_order.clone(),
            rankable: items.clone(),
            undersampled: Vec::new(),
            provisional_cuts: quantile_cuts(20, 4),
            frontier: Vec::new(),
            warm_up_comparisons: 30,
        };

        let out = refine_tiers(&artifacts, &ledger, &Tiers::new(&tier_order), &RankingConfig::default());
        let report = out.report.expect("report");

        assert_eq!(report.quantile_cuts, vec![5, 10, 15]);
        // one gap cut at 1, padded from the quantile cuts, last cut pulled
        // to the first uncertain item of the bottom window
        assert_eq!(report.refined_cuts, vec![1, 5, 16]);
        assert!(report.churn > SOFT_CHURN_THRESHOLD, "churn {}", report.churn);
        assert!(report.churn > HARD_CHURN_THRESHOLD * report.ramp);
        assert_eq!(report.cut_source, CutSource::Quantile);
        assert_eq!(out.artifacts.expect("rankable").provisional_cuts, vec![5, 10, 15]);
        assert_eq!(out.tiers.get("S").len(), 5);
    }
}

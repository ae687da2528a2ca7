/// Reserved tier name for items that are not (yet) ranked.
/// Always present in a `Tiers` board, never part of the tier order.
pub const UNRANKED: &str = "unranked";

/// Minimum number of comparisons an item needs before it is ranked.
/// Items below this are parked in `UNRANKED` as undersampled.
pub const DEFAULT_MIN_COMPARISONS: u32 = 2;

/// Wilson z used by the quick pass and by refinement while data is thin.
pub const QUICK_Z: f64 = 1.0;

/// Wilson z used by refinement once the average item has enough comparisons.
pub const STABLE_Z: f64 = 1.28;

/// Average comparisons per rankable item at which refinement switches to `STABLE_Z`.
pub const STABLE_Z_AVERAGE_COMPARISONS: f64 = 3.0;

/// Total pseudo-counts (alpha + beta) carried by a tier-position prior.
pub const DEFAULT_PRIOR_STRENGTH: f64 = 2.0;

/// Prior mean for the top and bottom tiers when a tier name has no default.
/// Tiers in between are linearly interpolated.
pub const PRIOR_MEAN_TOP: f64 = 0.85;
pub const PRIOR_MEAN_BOTTOM: f64 = 0.35;

/// Prior means for the conventional letter tiers.
pub const DEFAULT_TIER_PRIOR_MEANS: [(&str, f64); 7] = [
    ("S", 0.85),
    ("A", 0.75),
    ("B", 0.65),
    ("C", 0.55),
    ("D", 0.45),
    ("E", 0.40),
    ("F", 0.35),
];

/// Weight of the better-sampled neighbour in the drop-cut sample bonus.
///
/// score = gap * ln(1 + min(n_i, n_j) + CONF_BONUS_BETA * max(n_i, n_j))
pub const CONF_BONUS_BETA: f64 = 0.25;

/// Overlap allowance once total comparisons reach the warm-up target.
pub const WARM_OVERLAP_EPS: f64 = 0.01;

/// Half-width of the frontier window around each cut.
pub const FRONTIER_WINDOW: usize = 2;

/// Warm-up target = max(ceil(WARM_UP_PER_ITEM * rankable), WARM_UP_PER_TIER * tiers).
pub const WARM_UP_PER_ITEM: f64 = 1.5;
pub const WARM_UP_PER_TIER: usize = 2;

/// Pools at or below this size always adopt refined cuts.
pub const SMALL_POOL_LIMIT: usize = 16;

/// Churn at or below this is always accepted.
pub const SOFT_CHURN_THRESHOLD: f64 = 0.12;

/// Churn ceiling scaled by the evidence ramp (totalComparisons / warmUp, capped at 1).
pub const HARD_CHURN_THRESHOLD: f64 = 0.25;

/// Number of trailing items inspected for the bottom-cluster adjustment
/// and for bottom-boundary forced pairs.
pub const BOTTOM_CLUSTER_SIZE: usize = 4;

/// An item whose upper bound is at or below this is confidently bottom-ranked.
pub const BOTTOM_CLUSTER_UPPER_BOUND: f64 = 0.2;

/// Near-tie tolerance for pairs straddling a tier boundary.
pub const BOUNDARY_PAIR_EPS: f64 = 0.012;

/// Near-tie tolerance for adjacent pairs in the bottom cluster.
pub const BOTTOM_PAIR_EPS: f64 = 0.01;

/// Minimum number of suggested pairs emitted by the quick pass.
pub const MIN_SUGGESTED_PAIRS: usize = 6;

/// Items taken from each side of a tier boundary by the warm-start queue.
pub const WARM_START_BOUNDARY_WINDOW: usize = 2;

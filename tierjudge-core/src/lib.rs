/// tierjudge-core: Pure-computation tier ranking engine.
///
/// Pairwise votes → Wilson intervals → items sorted into named tiers.
/// No IO, no filesystem, no clock. Randomness is injected.
///
/// Items are identified by caller-provided string IDs. A board (`Tiers`) maps
/// tier names to ordered item lists, plus a reserved `unranked` tier for
/// items without enough votes to place.
///
/// # Quick start
///
/// ```rust
/// use tierjudge_core::{Item, RankingConfig, RankingSession, Tiers};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let pool: Vec<Item> = ["a", "b", "c", "d"]
///     .iter()
///     .map(|id| Item::new(*id, id.to_uppercase()))
///     .collect();
/// let tier_order = vec!["S".to_string(), "A".to_string()];
///
/// let mut session = RankingSession::new(pool, &tier_order, Tiers::default(), RankingConfig::default());
/// let mut rng = StdRng::seed_from_u64(7);
///
/// for _ in 0..12 {
///     let Some((x, y)) = session.next_pairs(1, &mut rng).into_iter().next() else { break };
///     // your judge goes here
///     let winner = if x.id < y.id { x.id.clone() } else { y.id.clone() };
///     session.record_vote(&x.id, &y.id, &winner).unwrap();
/// }
///
/// for (tier, items) in session.tiers().iter_ordered(session.tier_order()) {
///     let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
///     println!("{tier}: {}", names.join(", "));
/// }
/// ```

pub mod constants;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod pairing;
pub mod partition;
pub mod priors;
pub mod quick_pass;
pub mod random;
pub mod refinement;
pub mod session;
pub mod tiers;
pub mod types;

// Re-export primary public API at crate root.
pub use error::VoteError;
pub use ledger::Ledger;
pub use metrics::{metrics_dictionary, ordered_items, wilson_lower_bound, wilson_upper_bound};
pub use pairing::{initial_comparison_queue_warm_start, pairings, pick_pair, refinement_pairs};
pub use partition::{churn_fraction, drop_cuts, quantile_cuts, tier_map_for_cuts, TierMap};
pub use quick_pass::{quick_tier_pass, QuickPassOutcome};
pub use random::{RandomSource, ReplayRandom};
pub use refinement::{churn_gate, refine_tiers, CutSource, RefinementOutcome, RefinementReport};
pub use session::RankingSession;
pub use tiers::{SortMode, Tiers};
pub use types::{
    operative_tier_names, Artifacts, ComparisonPair, FrontierWindow, Item, Metrics, PassMode, Prior,
    RankingConfig, VoteRecord,
};

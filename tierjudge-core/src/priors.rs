/// Warm-start priors derived from an item's current tier.
use std::collections::HashMap;

use crate::constants::{DEFAULT_TIER_PRIOR_MEANS, PRIOR_MEAN_BOTTOM, PRIOR_MEAN_TOP};
use crate::tiers::Tiers;
use crate::types::{operative_tier_names, Item, Prior};

/// Implied win rate for the tier at `position` of `tier_count`.
///
/// Conventional letter names (S, A … F) use fixed means; anything else is
/// interpolated linearly from `PRIOR_MEAN_TOP` down to `PRIOR_MEAN_BOTTOM`.
pub fn tier_prior_mean(name: &str, position: usize, tier_count: usize) -> f64 {
    let key = name.trim();
    if let Some(&(_, mean)) = DEFAULT_TIER_PRIOR_MEANS
        .iter()
        .find(|(letter, _)| letter.eq_ignore_ascii_case(key))
    {
        return mean;
    }
    if tier_count <= 1 {
        return (PRIOR_MEAN_TOP + PRIOR_MEAN_BOTTOM) / 2.0;
    }
    let t = position.min(tier_count - 1) as f64 / (tier_count - 1) as f64;
    PRIOR_MEAN_TOP - (PRIOR_MEAN_TOP - PRIOR_MEAN_BOTTOM) * t
}

/// Prior per pool item from its tier in `tiers`.
///
/// Items in `UNRANKED` or in no operative tier get a neutral 0.5 prior of
/// the same strength.
pub fn build_priors(
    pool: &[Item],
    tiers: &Tiers,
    tier_order: &[String],
    strength: f64,
) -> HashMap<String, Prior> {
    let names = operative_tier_names(tier_order);
    let mut mean_by_item: HashMap<&str, f64> = HashMap::new();
    for (position, name) in names.iter().enumerate() {
        let mean = tier_prior_mean(name, position, names.len());
        for item in tiers.get(name) {
            mean_by_item.entry(item.id.as_str()).or_insert(mean);
        }
    }

    pool.iter()
        .map(|item| {
            let mean = mean_by_item.get(item.id.as_str()).copied().unwrap_or(0.5);
            (item.id.clone(), Prior::from_mean(mean, strength))
        })
        .collect()
}

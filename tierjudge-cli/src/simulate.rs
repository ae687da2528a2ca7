/// Simulate command: measures how well the engine recovers a hidden tiering.
///
/// Every item gets a hidden Bradley–Terry strength. The engine picks each
/// pair, a synthetic rater votes with P(a beats b) = 1 / (1 + e^(s_b - s_a)),
/// and at the end the board is compared against the true quantile tiers.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use tierjudge_core::{quantile_cuts, tier_map_for_cuts, CutSource, Item, RankingConfig, RankingSession, Tiers};

use crate::bail;

/// Hidden strengths are drawn uniformly from `[-SPREAD, SPREAD]`.
const STRENGTH_SPREAD: f64 = 3.0;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub items: usize,
    pub tiers: usize,
    pub votes: usize,
    /// Fraction of items placed in their true tier.
    pub exact_agreement: f64,
    /// Fraction of items placed within one tier of their true tier.
    pub near_agreement: f64,
    /// Items still unranked at the end.
    pub unranked: usize,
    /// Refinement passes that adopted the confidence-gap cuts.
    pub refined_passes: usize,
    /// Refinement passes where the churn gate kept the quantile cuts.
    pub quantile_passes: usize,
}

impl SimulationSummary {
    pub fn quantile_rate(&self) -> f64 {
        let passes = self.refined_passes + self.quantile_passes;
        if passes == 0 {
            0.0
        } else {
            self.quantile_passes as f64 / passes as f64
        }
    }
}

/// P(a beats b) under Bradley–Terry.
fn win_probability(strength_a: f64, strength_b: f64) -> f64 {
    1.0 / (1.0 + (strength_b - strength_a).exp())
}

/// Run one seeded simulation.
pub fn run_simulation(
    num_items: usize,
    num_votes: usize,
    tier_order: &[String],
    config: RankingConfig,
    seed: u64,
) -> SimulationSummary {
    let mut rng = StdRng::seed_from_u64(seed);

    let pool: Vec<Item> = (0..num_items)
        .map(|i| Item::new(format!("item-{i:03}"), format!("Item {i}")))
        .collect();
    let strengths: HashMap<String, f64> = pool
        .iter()
        .map(|item| (item.id.clone(), rng.random_range(-STRENGTH_SPREAD..=STRENGTH_SPREAD)))
        .collect();

    let mut session = RankingSession::new(pool.clone(), tier_order, Tiers::default(), config);
    let tier_names = session.tier_order().to_vec();
    session.quick_pass();

    let mut refined_passes = 0;
    let mut quantile_passes = 0;
    let mut votes = 0;

    for _ in 0..num_votes {
        let Some((a, b)) = session.next_pairs(1, &mut rng).into_iter().next() else {
            break;
        };
        let p = win_probability(strengths[&a.id], strengths[&b.id]);
        let winner = if rng.random::<f64>() < p { &a.id } else { &b.id };
        session
            .record_vote(&a.id, &b.id, winner)
            .unwrap_or_else(|e| bail(format!("Simulated vote rejected: {e}")));
        votes += 1;

        match session.last_report().map(|r| r.cut_source) {
            Some(CutSource::Refined) => refined_passes += 1,
            Some(CutSource::Quantile) => quantile_passes += 1,
            None => {}
        }
    }

    // True tiers: quantile cuts over the hidden order.
    let mut truth_order = pool.clone();
    truth_order.sort_by(|x, y| strengths[&y.id].total_cmp(&strengths[&x.id]).then_with(|| x.id.cmp(&y.id)));
    let tier_count = tier_names.len();
    let truth = tier_map_for_cuts(&truth_order, &quantile_cuts(truth_order.len(), tier_count), tier_count);

    let placed: HashMap<&str, usize> = tier_names
        .iter()
        .enumerate()
        .flat_map(|(k, name)| session.tiers().get(name).iter().map(move |item| (item.id.as_str(), k + 1)))
        .collect();

    let mut exact = 0;
    let mut near = 0;
    for item in &pool {
        let (Some(&actual), Some(&expected)) = (placed.get(item.id.as_str()), truth.get(&item.id)) else {
            continue;
        };
        if actual == expected {
            exact += 1;
        }
        if actual.abs_diff(expected) <= 1 {
            near += 1;
        }
    }

    let n = pool.len().max(1) as f64;
    SimulationSummary {
        items: pool.len(),
        tiers: tier_count,
        votes,
        exact_agreement: exact as f64 / n,
        near_agreement: near as f64 / n,
        unranked: session.tiers().unranked().len(),
        refined_passes,
        quantile_passes,
    }
}

pub fn print_summary(summary: &SimulationSummary) {
    println!("=== Simulation Results ===");
    println!("Items:             {}", summary.items);
    println!("Tiers:             {}", summary.tiers);
    println!("Votes:             {}", summary.votes);
    println!("Exact tier match:  {:.1}%", summary.exact_agreement * 100.0);
    println!("Within one tier:   {:.1}%", summary.near_agreement * 100.0);
    println!("Still unranked:    {}", summary.unranked);
    println!(
        "Churn gate:        {} refined / {} quantile ({:.1}% kept quantile cuts)",
        summary.refined_passes,
        summary.quantile_passes,
        summary.quantile_rate() * 100.0,
    );
}

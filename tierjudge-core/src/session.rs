/// Session orchestrator.
///
/// Owns the ledger and the current board, and closes the loop:
/// vote → refine → next pairs. Pure computation: the caller presents pairs
/// and feeds judgments back in, one at a time.
use crate::constants::MIN_SUGGESTED_PAIRS;
use crate::error::VoteError;
use crate::ledger::Ledger;
use crate::pairing::{initial_comparison_queue_warm_start, pick_pair, refinement_pairs};
use crate::quick_pass::quick_tier_pass;
use crate::random::RandomSource;
use crate::refinement::{refine_tiers, RefinementReport};
use crate::tiers::Tiers;
use crate::types::{operative_tier_names, Artifacts, ComparisonPair, Item, PassMode, RankingConfig};

#[derive(Debug)]
pub struct RankingSession {
    pool: Vec<Item>,
    tier_order: Vec<String>,
    ledger: Ledger,
    tiers: Tiers,
    artifacts: Option<Artifacts>,
    last_report: Option<RefinementReport>,
    votes_recorded: usize,
    config: RankingConfig,
}

impl RankingSession {
    /// `tier_order` is cleaned (blank, duplicate and reserved names dropped);
    /// `tiers` is normalized so every operative tier exists.
    pub fn new(pool: Vec<Item>, tier_order: &[String], tiers: Tiers, config: RankingConfig) -> Self {
        let tier_order = operative_tier_names(tier_order);
        let tiers = tiers.normalized(&tier_order);
        RankingSession {
            pool,
            tier_order,
            ledger: Ledger::new(),
            tiers,
            artifacts: None,
            last_report: None,
            votes_recorded: 0,
            config,
        }
    }

    /// Start from an existing ledger (e.g. replayed history).
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn pool(&self) -> &[Item] {
        &self.pool
    }

    pub fn tier_order(&self) -> &[String] {
        &self.tier_order
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn tiers(&self) -> &Tiers {
        &self.tiers
    }

    pub fn artifacts(&self) -> Option<&Artifacts> {
        self.artifacts.as_ref()
    }

    pub fn last_report(&self) -> Option<&RefinementReport> {
        self.last_report.as_ref()
    }

    pub fn votes_recorded(&self) -> usize {
        self.votes_recorded
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Coarse re-tiering of the whole pool. Returns suggested next pairs.
    pub fn quick_pass(&mut self) -> Vec<ComparisonPair> {
        let outcome = quick_tier_pass(&self.pool, &self.ledger, &self.tier_order, &self.tiers, &self.config);
        self.tiers = outcome.tiers;
        self.artifacts = outcome.artifacts;
        self.last_report = None;
        outcome.suggested_pairs
    }

    /// Run a refinement pass, or a quick pass if there is nothing to refine yet.
    pub fn refine(&mut self) {
        let Some(artifacts) = self.artifacts.as_ref() else {
            self.quick_pass();
            return;
        };
        let outcome = refine_tiers(artifacts, &self.ledger, &self.tiers, &self.config);
        self.tiers = outcome.tiers;
        self.artifacts = outcome.artifacts;
        self.last_report = outcome.report;
    }

    /// Record one judgment and re-tier. The board is untouched on error.
    pub fn record_vote(&mut self, a: &str, b: &str, winner: &str) -> Result<(), VoteError> {
        self.ledger.vote(a, b, winner)?;
        self.votes_recorded += 1;
        self.refine();
        Ok(())
    }

    /// Record judgments without re-tiering between them.
    ///
    /// All or nothing: every vote is checked first, and on the first invalid
    /// one the ledger and vote count are left as they were.
    pub fn record_votes<'a>(
        &mut self,
        votes: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Result<usize, VoteError> {
        let votes: Vec<(&str, &str, &str)> = votes.into_iter().collect();
        for &(a, b, winner) in &votes {
            Ledger::check_vote(a, b, winner)?;
        }
        for &(a, b, winner) in &votes {
            self.ledger.vote(a, b, winner)?;
        }
        self.votes_recorded += votes.len();
        Ok(votes.len())
    }

    /// Up to `limit` pairs to present next.
    ///
    /// Boundary refinement pairs while the board is a quick pass; otherwise
    /// the warm-start queue (one more comparison than the least-compared item
    /// has); finally a random draw.
    pub fn next_pairs<R: RandomSource + ?Sized>(&self, limit: usize, rng: &mut R) -> Vec<ComparisonPair> {
        if limit == 0 || self.pool.len() < 2 {
            return Vec::new();
        }

        if let Some(artifacts) = self.artifacts.as_ref() {
            if artifacts.mode == PassMode::Quick {
                let pairs = refinement_pairs(artifacts, &self.ledger, limit.max(MIN_SUGGESTED_PAIRS));
                if !pairs.is_empty() {
                    return pairs.into_iter().take(limit).collect();
                }
            }
        }

        let least = self.pool.iter().map(|i| self.ledger.total(&i.id)).min().unwrap_or(0);
        let target = least.max(self.config.min_comparisons.saturating_sub(1)) + 1;
        let mut queue = initial_comparison_queue_warm_start(
            &self.pool,
            &self.ledger,
            &self.tier_order,
            &self.tiers,
            target,
            rng,
        );
        if !queue.is_empty() {
            queue.truncate(limit);
            return queue;
        }

        match pick_pair(self.pool.len(), rng) {
            Some((i, j)) => vec![(self.pool[i].clone(), self.pool[j].clone())],
            None => Vec::new(),
        }
    }
}

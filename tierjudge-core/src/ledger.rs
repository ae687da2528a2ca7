/// Vote Ledger: id → win/loss record. The only mutable state in the engine.
use std::collections::HashMap;

use crate::error::VoteError;
use crate::types::VoteRecord;

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ledger {
    records: HashMap<String, VoteRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Validate a judgment without recording it. Returns the loser.
    pub fn check_vote<'a>(a: &'a str, b: &'a str, winner: &str) -> Result<&'a str, VoteError> {
        if a == b {
            return Err(VoteError::SelfComparison(a.to_string()));
        }
        if winner == a {
            Ok(b)
        } else if winner == b {
            Ok(a)
        } else {
            Err(VoteError::WinnerNotInPair {
                a: a.to_string(),
                b: b.to_string(),
                winner: winner.to_string(),
            })
        }
    }

    /// Record one judgment: `winner` beat the other member of `(a, b)`.
    ///
    /// No deduplication: call exactly once per judgment.
    pub fn vote(&mut self, a: &str, b: &str, winner: &str) -> Result<(), VoteError> {
        let loser = Self::check_vote(a, b, winner)?;

        let w = self.records.entry(winner.to_string()).or_default();
        w.wins += 1;
        w.recompute();

        let l = self.records.entry(loser.to_string()).or_default();
        l.losses += 1;
        l.recompute();

        Ok(())
    }

    /// Record for `id`, if it has ever been voted on.
    pub fn get(&self, id: &str) -> Option<&VoteRecord> {
        self.records.get(id)
    }

    /// Record for `id`, or an all-zero record.
    pub fn record(&self, id: &str) -> VoteRecord {
        self.records.get(id).copied().unwrap_or_default()
    }

    /// Comparisons recorded for `id` (0 if unseen).
    pub fn total(&self, id: &str) -> u32 {
        self.records.get(id).map_or(0, |r| r.total)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VoteRecord)> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_vote_updates_both_records() {
        let mut ledger = Ledger::new();
        ledger.vote("a", "b", "a").unwrap();
        ledger.vote("a", "b", "a").unwrap();
        ledger.vote("b", "a", "b").unwrap();

        let a = ledger.record("a");
        assert_eq!((a.wins, a.losses, a.total), (2, 1, 3));
        assert!((a.win_rate - 2.0 / 3.0).abs() < 1e-12);

        let b = ledger.record("b");
        assert_eq!((b.wins, b.losses, b.total), (1, 2, 3));
    }

    #[test]
    fn test_unseen_item_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.record("nobody"), VoteRecord::default());
        assert_eq!(ledger.record("nobody").win_rate, 0.0);
        assert!(ledger.get("nobody").is_none());
    }

    #[test]
    fn test_vote_rejects_foreign_winner() {
        let mut ledger = Ledger::new();
        let err = ledger.vote("a", "b", "c").unwrap_err();
        assert!(matches!(err, VoteError::WinnerNotInPair { .. }));
        assert!(ledger.is_empty(), "ledger must not change on error");
    }

    #[test]
    fn test_vote_rejects_self_comparison() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.vote("a", "a", "a"), Err(VoteError::SelfComparison("a".to_string())));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_random_votes_keep_totals_consistent() {
        let ids = ["a", "b", "c", "d", "e"];
        let mut rng = StdRng::seed_from_u64(7);
        let mut ledger = Ledger::new();

        for _ in 0..500 {
            let i = rng.random_range(0..ids.len());
            let j = (i + 1 + rng.random_range(0..ids.len() - 1)) % ids.len();
            let winner = if rng.random::<bool>() { ids[i] } else { ids[j] };
            ledger.vote(ids[i], ids[j], winner).unwrap();
        }

        let mut sum_totals = 0;
        for (_, r) in ledger.iter() {
            assert_eq!(r.total, r.wins + r.losses);
            assert!((0.0..=1.0).contains(&r.win_rate));
            sum_totals += r.total;
        }
        assert_eq!(sum_totals, 1000);
    }
}

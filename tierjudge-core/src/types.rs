use std::hash::{Hash, Hasher};

/// A candidate being ranked.
///
/// Equality and hashing use `id` only; `name` is display text.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Item { id: id.into(), name: name.into() }
    }

    /// Lower-cased trimmed name, or the id when the name is blank.
    /// Used as a deterministic tie-break when ordering.
    pub fn name_key(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            self.id.to_lowercase()
        } else {
            trimmed.to_lowercase()
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Win/loss record for one item. Created lazily on its first vote.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoteRecord {
    pub wins: u32,
    pub losses: u32,
    pub total: u32,
    pub win_rate: f64,
}

impl VoteRecord {
    pub(crate) fn recompute(&mut self) {
        self.total = self.wins + self.losses;
        self.win_rate = if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64
        };
    }
}

/// Beta pseudo-counts added to an item's observed wins/losses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prior {
    pub alpha: f64,
    pub beta: f64,
}

impl Prior {
    /// Prior with the given mean carrying `strength` pseudo-comparisons.
    pub fn from_mean(mean: f64, strength: f64) -> Self {
        let mean = mean.clamp(0.0, 1.0);
        Prior { alpha: mean * strength, beta: (1.0 - mean) * strength }
    }
}

/// Derived per-item statistics. Recomputed on demand, never cached.
///
/// `wins`, `comparisons` and `win_rate` are the raw observed counts; the Wilson
/// bounds are computed on prior-smoothed counts when priors are supplied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub id: String,
    pub wins: u32,
    pub comparisons: u32,
    pub win_rate: f64,
    pub wilson_lb: f64,
    pub wilson_ub: f64,
    pub name_key: String,
}

/// Which controller produced an `Artifacts` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PassMode {
    Quick,
    Done,
}

/// Index windows directly above and below one cut, into `Artifacts::rankable`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrontierWindow {
    pub cut: usize,
    pub upper: Vec<usize>,
    pub lower: Vec<usize>,
}

/// Frozen result of one ranking pass. Replaced wholesale by the next pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Artifacts {
    pub mode: PassMode,
    /// Operative tier names, in order. Never contains `UNRANKED`.
    pub tier_names: Vec<String>,
    /// Items with at least the minimum comparisons, in canonical ranked order.
    pub rankable: Vec<Item>,
    pub undersampled: Vec<Item>,
    /// Ascending cut indices into `rankable`.
    pub provisional_cuts: Vec<usize>,
    pub frontier: Vec<FrontierWindow>,
    pub warm_up_comparisons: usize,
}

impl Artifacts {
    pub fn tier_count(&self) -> usize {
        self.tier_names.len()
    }
}

/// Tunables shared by the quick pass, refinement and the session driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RankingConfig {
    /// Comparisons an item needs before it is ranked instead of parked in `UNRANKED`.
    pub min_comparisons: u32,
    /// Pseudo-comparisons carried by a tier-position prior.
    pub prior_strength: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            min_comparisons: crate::constants::DEFAULT_MIN_COMPARISONS,
            prior_strength: crate::constants::DEFAULT_PRIOR_STRENGTH,
        }
    }
}

/// A suggested comparison between two items.
pub type ComparisonPair = (Item, Item);

/// Order-independent key for deduplicating pairs.
pub(crate) fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Trimmed, non-blank, deduplicated tier names with `UNRANKED` removed.
pub fn operative_tier_names(tier_order: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(tier_order.len());
    for raw in tier_order {
        let name = raw.trim();
        if name.is_empty() || name == crate::constants::UNRANKED {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_equality_is_by_id() {
        assert_eq!(Item::new("a", "Alpha"), Item::new("a", "Something else"));
        assert_ne!(Item::new("a", "Alpha"), Item::new("b", "Alpha"));
    }

    #[test]
    fn test_name_key_falls_back_to_id() {
        assert_eq!(Item::new("X1", "  Hello World ").name_key(), "hello world");
        assert_eq!(Item::new("X1", "   ").name_key(), "x1");
    }

    #[test]
    fn test_prior_from_mean() {
        let p = Prior::from_mean(0.75, 2.0);
        assert!((p.alpha - 1.5).abs() < 1e-12);
        assert!((p.beta - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_operative_tier_names() {
        let order: Vec<String> = ["S", " A ", "", "unranked", "S", "B"]
            .iter().map(|s| s.to_string()).collect();
        assert_eq!(operative_tier_names(&order), vec!["S", "A", "B"]);
    }
}

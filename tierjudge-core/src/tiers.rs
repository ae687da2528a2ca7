/// Tier board: tier name → ordered items.
///
/// Every operation here returns a new board; callers keep ownership of the
/// board they passed in. Invalid moves are no-ops, not errors.
use std::collections::BTreeMap;

use crate::constants::{STABLE_Z, UNRANKED};
use crate::ledger::Ledger;
use crate::metrics::{metrics_dictionary, ordered_items};
use crate::types::{operative_tier_names, Item};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tiers {
    buckets: BTreeMap<String, Vec<Item>>,
}

/// How `Tiers::sorted` orders each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SortMode {
    /// Canonical Wilson ordering.
    Rank,
    /// Raw win rate, highest first; name breaks ties.
    WinRate,
    /// Alphabetical by name key.
    Name,
}

impl Tiers {
    /// Empty board with an entry for every operative name plus `UNRANKED`.
    pub fn new(tier_order: &[String]) -> Self {
        Tiers::default().normalized(tier_order)
    }

    /// Copy with an (possibly empty) entry for every operative name and `UNRANKED`.
    pub fn normalized(&self, tier_order: &[String]) -> Self {
        let mut out = self.clone();
        for name in operative_tier_names(tier_order) {
            out.buckets.entry(name).or_default();
        }
        out.buckets.entry(UNRANKED.to_string()).or_default();
        out
    }

    /// Builder-style: replace the contents of one tier.
    pub fn with_tier(mut self, name: impl Into<String>, items: Vec<Item>) -> Self {
        self.buckets.insert(name.into(), items);
        self
    }

    pub fn get(&self, name: &str) -> &[Item] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_tier(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    pub fn unranked(&self) -> &[Item] {
        self.get(UNRANKED)
    }

    /// Name of the tier holding `item_id`, if any.
    pub fn tier_of(&self, item_id: &str) -> Option<&str> {
        self.buckets
            .iter()
            .find(|(_, items)| items.iter().any(|i| i.id == item_id))
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Tiers in `tier_order`, followed by `UNRANKED`.
    pub fn iter_ordered<'a>(&'a self, tier_order: &[String]) -> Vec<(String, &'a [Item])> {
        let mut out: Vec<(String, &'a [Item])> = operative_tier_names(tier_order)
            .into_iter()
            .map(|name| {
                let items = self.get(&name);
                (name, items)
            })
            .collect();
        out.push((UNRANKED.to_string(), self.unranked()));
        out
    }

    /// Total items across all tiers.
    pub fn item_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Move `item_id` into `to_tier` at `index`.
    ///
    /// No-op when the item or tier is unknown, or `index` is past the end of
    /// the destination after removal.
    pub fn move_item(&self, item_id: &str, to_tier: &str, index: usize) -> Tiers {
        let Some(from_tier) = self.tier_of(item_id).map(str::to_string) else {
            return self.clone();
        };
        if !self.buckets.contains_key(to_tier) {
            return self.clone();
        }

        let mut out = self.clone();
        let Some(source) = out.buckets.get_mut(&from_tier) else {
            return self.clone();
        };
        let Some(pos) = source.iter().position(|i| i.id == item_id) else {
            return self.clone();
        };
        let item = source.remove(pos);

        let Some(dest) = out.buckets.get_mut(to_tier) else {
            return self.clone();
        };
        if index > dest.len() {
            return self.clone();
        }
        dest.insert(index, item);
        out
    }

    /// Move the item at `from` to `to` inside one tier. Out-of-range is a no-op.
    pub fn reorder(&self, tier: &str, from: usize, to: usize) -> Tiers {
        let mut out = self.clone();
        let Some(items) = out.buckets.get_mut(tier) else {
            return out;
        };
        if from >= items.len() || to >= items.len() || from == to {
            return out;
        }
        let item = items.remove(from);
        items.insert(to, item);
        out
    }

    /// Every tier re-sorted by `mode`.
    pub fn sorted(&self, ledger: &Ledger, mode: SortMode) -> Tiers {
        let mut out = self.clone();
        for items in out.buckets.values_mut() {
            match mode {
                SortMode::Rank => {
                    let metrics = metrics_dictionary(items, ledger, STABLE_Z, None);
                    *items = ordered_items(items, &metrics);
                }
                SortMode::WinRate => {
                    items.sort_by(|a, b| {
                        ledger
                            .record(&b.id)
                            .win_rate
                            .total_cmp(&ledger.record(&a.id).win_rate)
                            .then_with(|| a.name_key().cmp(&b.name_key()))
                            .then_with(|| a.id.cmp(&b.id))
                    });
                }
                SortMode::Name => {
                    items.sort_by(|a, b| a.name_key().cmp(&b.name_key()).then_with(|| a.id.cmp(&b.id)));
                }
            }
        }
        out
    }

    pub(crate) fn bucket_mut(&mut self, name: &str) -> &mut Vec<Item> {
        self.buckets.entry(name.to_string()).or_default()
    }

    pub(crate) fn buckets_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<Item>)> {
        self.buckets.iter_mut()
    }
}

/// Session file: a JSON snapshot of items, board and vote history.
///
/// ```json
/// {
///   "items": ["Alien", {"id": "t2", "name": "Terminator 2"}],
///   "tier_order": ["S", "A", "B"],
///   "tiers": {"S": ["t2"], "unranked": ["Alien"]},
///   "votes": [{"a": "t2", "b": "Alien", "winner": "t2"}]
/// }
/// ```
///
/// Items given as plain strings use the string as both id and name.
/// `tier_order` and `tiers` are optional.
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tierjudge_core::{Item, RankingConfig, RankingSession, Tiers};

use crate::bail;

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ItemEntry {
    Name(String),
    Full(Item),
}

impl ItemEntry {
    fn into_item(self) -> Item {
        match self {
            ItemEntry::Name(name) => Item::new(name.clone(), name),
            ItemEntry::Full(item) => item,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteEntry {
    pub a: String,
    pub b: String,
    pub winner: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionFile {
    pub items: Vec<ItemEntry>,
    #[serde(default)]
    pub tier_order: Option<Vec<String>>,
    #[serde(default)]
    pub tiers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub votes: Vec<VoteEntry>,
}

/// Load and parse a session file, bailing on any IO or JSON error.
pub fn load_session(path: &Path) -> SessionFile {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| bail(format!("Failed to read session file {}: {e}", path.display())));
    parse_session(&content)
        .unwrap_or_else(|e| bail(format!("Failed to parse session file {}: {e}", path.display())))
}

pub fn parse_session(content: &str) -> Result<SessionFile, serde_json::Error> {
    serde_json::from_str(content)
}

impl SessionFile {
    /// Items with duplicate ids rejected.
    pub fn pool(&self) -> Result<Vec<Item>, String> {
        let mut seen = HashSet::new();
        let mut pool = Vec::with_capacity(self.items.len());
        for entry in &self.items {
            let item = entry.clone().into_item();
            if item.id.trim().is_empty() {
                return Err("Item with an empty id".to_string());
            }
            if !seen.insert(item.id.clone()) {
                return Err(format!("Duplicate item id \"{}\"", item.id));
            }
            pool.push(item);
        }
        Ok(pool)
    }

    /// Board built from the `tiers` map. Every id must name a pool item, and
    /// no item may appear twice.
    pub fn board(&self, pool: &[Item]) -> Result<Tiers, String> {
        let by_id: HashMap<&str, &Item> = pool.iter().map(|i| (i.id.as_str(), i)).collect();
        let mut placed = HashSet::new();
        let mut board = Tiers::default();
        for (tier, ids) in &self.tiers {
            let mut members = Vec::with_capacity(ids.len());
            for id in ids {
                let item = by_id
                    .get(id.as_str())
                    .ok_or_else(|| format!("Tier \"{tier}\" lists unknown item \"{id}\""))?;
                if !placed.insert(id.as_str()) {
                    return Err(format!("Item \"{id}\" is placed in more than one tier"));
                }
                members.push((*item).clone());
            }
            board = board.with_tier(tier.clone(), members);
        }
        Ok(board)
    }

    /// Build a session over this file and replay its votes one at a time.
    pub fn replay(&self, tier_order: &[String], config: RankingConfig) -> Result<RankingSession, String> {
        let pool = self.pool()?;
        let board = self.board(&pool)?;
        let mut session = RankingSession::new(pool, tier_order, board, config);
        for (n, vote) in self.votes.iter().enumerate() {
            session
                .record_vote(&vote.a, &vote.b, &vote.winner)
                .map_err(|e| format!("Vote #{}: {e}", n + 1))?;
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "items": ["alpha", {"id": "b", "name": "Beta"}, "gamma"],
        "tier_order": ["S", "A"],
        "tiers": {"S": ["b"]},
        "votes": [
            {"a": "alpha", "b": "b", "winner": "b"},
            {"a": "b", "b": "gamma", "winner": "b"},
            {"a": "alpha", "b": "gamma", "winner": "alpha"}
        ]
    }"#;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mixed_items() {
        let file = parse_session(SAMPLE).unwrap();
        let pool = file.pool().unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0], Item::new("alpha", "alpha"));
        assert_eq!(pool[1].name, "Beta");
        assert_eq!(file.votes.len(), 3);
    }

    #[test]
    fn test_minimal_file() {
        let file = parse_session(r#"{"items": ["x", "y"]}"#).unwrap();
        assert!(file.tier_order.is_none());
        assert!(file.tiers.is_empty());
        assert!(file.votes.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let file = parse_session(r#"{"items": ["x", {"id": "x", "name": "X"}]}"#).unwrap();
        assert!(file.pool().unwrap_err().contains("Duplicate"));
    }

    #[test]
    fn test_board_rejects_unknown_and_repeated_ids() {
        let file = parse_session(r#"{"items": ["x", "y"], "tiers": {"S": ["z"]}}"#).unwrap();
        let pool = file.pool().unwrap();
        assert!(file.board(&pool).unwrap_err().contains("unknown item"));

        let file = parse_session(r#"{"items": ["x", "y"], "tiers": {"A": ["x"], "S": ["x"]}}"#).unwrap();
        let pool = file.pool().unwrap();
        assert!(file.board(&pool).unwrap_err().contains("more than one tier"));
    }

    #[test]
    fn test_replay_places_items() {
        let file = parse_session(SAMPLE).unwrap();
        let session = file.replay(&order(&["S", "A"]), RankingConfig::default()).unwrap();
        assert_eq!(session.votes_recorded(), 3);
        assert_eq!(session.tiers().item_count(), 3);
        // b won both of its votes
        assert_eq!(session.tiers().tier_of("b"), Some("S"));
    }

    #[test]
    fn test_replay_reports_bad_vote() {
        let file = parse_session(
            r#"{"items": ["x", "y"], "votes": [{"a": "x", "b": "y", "winner": "q"}]}"#,
        )
        .unwrap();
        let err = file.replay(&order(&["S"]), RankingConfig::default()).unwrap_err();
        assert!(err.starts_with("Vote #1"));
    }
}

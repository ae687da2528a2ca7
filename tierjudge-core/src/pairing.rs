/// Comparison-pair scheduling.
///
/// Two schedulers live here:
///   - `refinement_pairs`: after a quick pass, near-ties straddling tier
///     boundaries first, then the best frontier crossings.
///   - `initial_comparison_queue_warm_start`: a staged queue that tries to
///     give every item a target number of comparisons, spending them where
///     the current board is least certain.
///
/// Randomness only enters through an injected `RandomSource`.
use std::collections::{HashMap, HashSet};

use crate::constants::{
    BOTTOM_CLUSTER_SIZE, BOTTOM_CLUSTER_UPPER_BOUND, BOTTOM_PAIR_EPS, BOUNDARY_PAIR_EPS,
    WARM_START_BOUNDARY_WINDOW,
};
use crate::ledger::Ledger;
use crate::metrics::{metrics_dictionary, metrics_or_empty};
use crate::random::{index_below, RandomSource};
use crate::refinement::refinement_z;
use crate::tiers::Tiers;
use crate::types::{operative_tier_names, pair_key, Artifacts, ComparisonPair, Item, Metrics, PassMode};

// ---------------------------------------------------------------------------
// Refinement pairs
// ---------------------------------------------------------------------------

/// Up to `limit` pairs that would most sharpen the current tier boundaries.
///
/// Empty when the artifacts are already refined (`PassMode::Done`), there is
/// nothing rankable, there is no frontier, or `limit` is 0.
pub fn refinement_pairs(artifacts: &Artifacts, ledger: &Ledger, limit: usize) -> Vec<ComparisonPair> {
    match artifacts.mode {
        PassMode::Done => return Vec::new(),
        PassMode::Quick => {}
    }
    if artifacts.rankable.is_empty() || artifacts.frontier.is_empty() || limit == 0 {
        return Vec::new();
    }

    let ranked = &artifacts.rankable;
    let n = ranked.len();
    let average = ranked.iter().map(|i| ledger.total(&i.id) as f64).sum::<f64>() / n as f64;
    let metrics = metrics_dictionary(ranked, ledger, refinement_z(average), None);
    let m: Vec<Metrics> = ranked.iter().map(|i| metrics_or_empty(i, &metrics)).collect();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut pairs: Vec<ComparisonPair> = Vec::with_capacity(limit);

    // Forced pairs: near-ties across each cut.
    for &cut in &artifacts.provisional_cuts {
        if cut == 0 || cut >= n {
            continue;
        }
        let gap = m[cut - 1].wilson_lb - m[cut].wilson_ub;
        if gap <= BOUNDARY_PAIR_EPS {
            push_unique(&mut pairs, &mut seen, &ranked[cut - 1], &ranked[cut]);
        }
    }

    // Forced pairs: near-ties inside a confidently-low bottom cluster.
    let bottom_start = n - BOTTOM_CLUSTER_SIZE.min(n);
    for i in bottom_start..n.saturating_sub(1) {
        let lower = &m[i + 1];
        if lower.wilson_ub <= BOTTOM_CLUSTER_UPPER_BOUND && m[i].wilson_lb - lower.wilson_ub <= BOTTOM_PAIR_EPS {
            push_unique(&mut pairs, &mut seen, &ranked[i], &ranked[i + 1]);
        }
    }

    if pairs.len() >= limit {
        pairs.truncate(limit);
        return pairs;
    }

    // Frontier candidates: every upper-window item against every lower-window item.
    struct Candidate {
        upper: usize,
        lower: usize,
        closeness: f64,
        min_comparisons: u32,
        key: (String, String),
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut candidate_keys: HashSet<(String, String)> = HashSet::new();
    for window in &artifacts.frontier {
        for &u in &window.upper {
            for &l in &window.lower {
                if u == l || u >= n || l >= n {
                    continue;
                }
                let key = pair_key(&ranked[u].id, &ranked[l].id);
                if seen.contains(&key) || !candidate_keys.insert(key.clone()) {
                    continue;
                }
                candidates.push(Candidate {
                    upper: u,
                    lower: l,
                    closeness: (m[u].wilson_lb - m[l].wilson_ub).abs(),
                    min_comparisons: m[u].comparisons.min(m[l].comparisons),
                    key,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        a.closeness
            .total_cmp(&b.closeness)
            .then(a.min_comparisons.cmp(&b.min_comparisons))
            .then_with(|| a.key.cmp(&b.key))
    });

    for c in candidates {
        if pairs.len() >= limit {
            break;
        }
        tracing::trace!(upper = %ranked[c.upper].id, lower = %ranked[c.lower].id, closeness = c.closeness, "frontier pair");
        push_unique(&mut pairs, &mut seen, &ranked[c.upper], &ranked[c.lower]);
    }

    pairs
}

fn push_unique(pairs: &mut Vec<ComparisonPair>, seen: &mut HashSet<(String, String)>, a: &Item, b: &Item) {
    if a.id == b.id {
        return;
    }
    if seen.insert(pair_key(&a.id, &b.id)) {
        pairs.push((a.clone(), b.clone()));
    }
}

// ---------------------------------------------------------------------------
// Warm-start queue
// ---------------------------------------------------------------------------

/// Working state of the warm-start queue builder.
///
/// `counts` starts from each item's ledger total, so comparisons already made
/// count towards the target.
#[derive(Debug, Clone)]
pub struct WarmStartQueue {
    pub queue: Vec<ComparisonPair>,
    counts: HashMap<String, u32>,
    seen: HashSet<(String, String)>,
    target: u32,
}

impl WarmStartQueue {
    pub fn new(pool: &[Item], ledger: &Ledger, target_per_item: u32) -> Self {
        WarmStartQueue {
            queue: Vec::new(),
            counts: pool.iter().map(|i| (i.id.clone(), ledger.total(&i.id))).collect(),
            seen: HashSet::new(),
            target: target_per_item,
        }
    }

    /// Recorded plus queued comparisons for `id`.
    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn needs_more(&self, id: &str) -> bool {
        self.count(id) < self.target
    }
}

/// Enqueue `(a, b)` unless it is a self-pair, a duplicate, or both sides
/// already have enough comparisons. Returns whether it was enqueued.
pub fn enqueue_pair(state: &mut WarmStartQueue, a: &Item, b: &Item) -> bool {
    if a.id == b.id {
        return false;
    }
    if !state.needs_more(&a.id) && !state.needs_more(&b.id) {
        return false;
    }
    if !state.seen.insert(pair_key(&a.id, &b.id)) {
        return false;
    }
    *state.counts.entry(a.id.clone()).or_insert(0) += 1;
    *state.counts.entry(b.id.clone()).or_insert(0) += 1;
    state.queue.push((a.clone(), b.clone()));
    true
}

/// True once every pool item has reached the target.
pub fn queue_satisfied(state: &WarmStartQueue, pool: &[Item]) -> bool {
    pool.iter().all(|i| !state.needs_more(&i.id))
}

/// Staged comparison queue seeded from the current board.
///
/// Stages, each skipped once every item has `target_per_item` comparisons:
///   1. boundary pairs: tail of each tier against the head of the next one;
///   2. unranked items against boundary anchors (or the whole pool);
///   3. adjacent pairs inside each tier;
///   4. every pairing of the pool, shuffled.
pub fn initial_comparison_queue_warm_start<R: RandomSource + ?Sized>(
    pool: &[Item],
    ledger: &Ledger,
    tier_order: &[String],
    current_tiers: &Tiers,
    target_per_item: u32,
    rng: &mut R,
) -> Vec<ComparisonPair> {
    let mut state = WarmStartQueue::new(pool, ledger, target_per_item);
    if pool.len() < 2 || queue_satisfied(&state, pool) {
        return state.queue;
    }

    let pool_ids: HashSet<&str> = pool.iter().map(|i| i.id.as_str()).collect();
    let tiered: Vec<Vec<Item>> = operative_tier_names(tier_order)
        .iter()
        .map(|name| {
            current_tiers
                .get(name)
                .iter()
                .filter(|i| pool_ids.contains(i.id.as_str()))
                .cloned()
                .collect::<Vec<Item>>()
        })
        .filter(|members| !members.is_empty())
        .collect();

    // 1. Boundary pairs.
    let mut anchors: Vec<Item> = Vec::new();
    for adjacent in tiered.windows(2) {
        let (upper, lower) = (&adjacent[0], &adjacent[1]);
        let tail = &upper[upper.len().saturating_sub(WARM_START_BOUNDARY_WINDOW)..];
        let head = &lower[..WARM_START_BOUNDARY_WINDOW.min(lower.len())];
        for a in tail {
            for b in head {
                enqueue_pair(&mut state, a, b);
            }
        }
        for item in tail.iter().chain(head.iter()) {
            if !anchors.contains(item) {
                anchors.push(item.clone());
            }
        }
    }
    tracing::debug!(queued = state.queue.len(), anchors = anchors.len(), "warm start: boundary stage");
    if queue_satisfied(&state, pool) {
        return state.queue;
    }

    // 2. Unranked items against anchors.
    let placed: HashSet<&str> = tiered.iter().flatten().map(|i| i.id.as_str()).collect();
    let unplaced: Vec<&Item> = pool.iter().filter(|i| !placed.contains(i.id.as_str())).collect();
    let anchors: Vec<Item> = if anchors.is_empty() { pool.to_vec() } else { anchors };
    for item in &unplaced {
        for anchor in &anchors {
            if !state.needs_more(&item.id) {
                break;
            }
            enqueue_pair(&mut state, item, anchor);
        }
    }
    tracing::debug!(queued = state.queue.len(), unplaced = unplaced.len(), "warm start: unranked stage");
    if queue_satisfied(&state, pool) {
        return state.queue;
    }

    // 3. Adjacent pairs within each tier.
    for members in &tiered {
        for adjacent in members.windows(2) {
            enqueue_pair(&mut state, &adjacent[0], &adjacent[1]);
        }
    }
    tracing::debug!(queued = state.queue.len(), "warm start: same-tier stage");
    if queue_satisfied(&state, pool) {
        return state.queue;
    }

    // 4. Shuffled exhaustive fallback.
    for (a, b) in pairings(pool, rng) {
        if queue_satisfied(&state, pool) {
            break;
        }
        enqueue_pair(&mut state, &a, &b);
    }
    tracing::debug!(queued = state.queue.len(), "warm start: fallback stage");

    state.queue
}

// ---------------------------------------------------------------------------
// Random helpers
// ---------------------------------------------------------------------------

/// Two distinct indices into a pool of `len` items.
///
/// On a collision the second index is bumped by one (mod `len`) rather than
/// re-drawn. `None` when `len < 2`.
pub fn pick_pair<R: RandomSource + ?Sized>(len: usize, rng: &mut R) -> Option<(usize, usize)> {
    if len < 2 {
        return None;
    }
    let first = index_below(rng, len);
    let mut second = index_below(rng, len);
    if second == first {
        second = (second + 1) % len;
    }
    Some((first, second))
}

/// Every unordered pair of `pool`, Fisher–Yates shuffled.
pub fn pairings<R: RandomSource + ?Sized>(pool: &[Item], rng: &mut R) -> Vec<ComparisonPair> {
    let mut all: Vec<ComparisonPair> = Vec::with_capacity(pool.len() * pool.len().saturating_sub(1) / 2);
    for (i, a) in pool.iter().enumerate() {
        for b in &pool[i + 1..] {
            all.push((a.clone(), b.clone()));
        }
    }
    for i in (1..all.len()).rev() {
        let j = index_below(rng, i + 1);
        all.swap(i, j);
    }
    all
}

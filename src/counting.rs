//! Frequency tallies and deterministic top-k selection shared by the queries.

use ahash::AHashMap;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::Hash;

/// How equal counts are ordered in a ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
    /// Key first added to the table wins.
    FirstSeen,
    /// Key most recently added to the table wins.
    LastSeen,
    /// Smaller key wins.
    KeyAscending,
}

/// Per-key tally: count plus the sequence numbers of its first and last hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tally {
    pub count: u64,
    pub first_seen: u64,
    pub last_seen: u64,
}

impl Tally {
    /// Compare for ranking: `Less` means `self` ranks ahead of `other`.
    fn rank_cmp<K: Ord>(&self, key: &K, other: &Tally, other_key: &K, tie: TieBreak) -> Ordering {
        other.count.cmp(&self.count).then_with(|| match tie {
            TieBreak::FirstSeen => self.first_seen.cmp(&other.first_seen),
            TieBreak::LastSeen => other.last_seen.cmp(&self.last_seen),
            TieBreak::KeyAscending => key.cmp(other_key),
        })
    }
}

/// Hash-map counter that remembers insertion order, so rankings never depend
/// on hash iteration order.
#[derive(Clone, Debug)]
pub struct FrequencyTable<K> {
    entries: AHashMap<K, Tally>,
    seq: u64,
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self { entries: AHashMap::new(), seq: 0 }
    }
}

impl<K: Hash + Eq> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        let seq = self.bump();
        self.entries
            .entry(key)
            .and_modify(|t| {
                t.count += 1;
                t.last_seen = seq;
            })
            .or_insert(Tally { count: 1, first_seen: seq, last_seen: seq });
    }

    /// Like `add`, but only allocates an owned key the first time it is seen.
    pub fn add_ref<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let seq = self.bump();
        if let Some(t) = self.entries.get_mut(key) {
            t.count += 1;
            t.last_seen = seq;
        } else {
            self.entries.insert(key.to_owned(), Tally { count: 1, first_seen: seq, last_seen: seq });
        }
    }

    pub fn get<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|t| t.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|t| t.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Tally)> {
        self.entries.iter()
    }

    fn bump(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }
}

impl<K: Hash + Eq + Ord + Clone> FrequencyTable<K> {
    /// The `k` highest counts, best first, ordered by `tie` among equal counts.
    pub fn top_k(&self, k: usize, tie: TieBreak) -> Vec<(K, u64)> {
        top_k_by(self.entries.iter().map(|(key, t)| (key.clone(), *t)), k, tie)
            .into_iter()
            .map(|(key, t)| (key, t.count))
            .collect()
    }
}

/// Select the best `k` of `(key, tally)` pairs, best first.
/// Partial selection keeps this O(n) before the final sort of `k` items.
pub fn top_k_by<K: Ord>(items: impl IntoIterator<Item = (K, Tally)>, k: usize, tie: TieBreak) -> Vec<(K, Tally)> {
    if k == 0 {
        return Vec::new();
    }
    let mut all: Vec<(K, Tally)> = items.into_iter().collect();
    let cmp = |a: &(K, Tally), b: &(K, Tally)| a.1.rank_cmp(&a.0, &b.1, &b.0, tie);
    if all.len() > k {
        all.select_nth_unstable_by(k - 1, cmp);
        all.truncate(k);
    }
    all.sort_unstable_by(cmp);
    all
}

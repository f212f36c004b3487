//! Memoized pairwise similarities.
//!
//! The cache is a derived index over the grouper's node set. Entries are keyed by the
//! unordered pair of node ids, so an entry never goes stale while both nodes are alive;
//! the grouper still evicts or drops entries whenever the node set changes so that the
//! cache never outgrows the data it describes.

use std::collections::HashMap;

use super::node::NodeId;

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compute a cosine similarity.
    pub misses: u64,
    /// Pairs currently stored.
    pub entries: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct SimilarityCache {
    pairs: HashMap<(NodeId, NodeId), f32>,
    // Ascending list of every pairwise similarity of the current node set.
    distribution: Option<Vec<f32>>,
    hits: u64,
    misses: u64,
}

#[inline]
fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SimilarityCache {
    pub(crate) fn get(&self, a: NodeId, b: NodeId) -> Option<f32> {
        self.pairs.get(&key(a, b)).copied()
    }

    pub(crate) fn get_or_insert_with(
        &mut self,
        a: NodeId,
        b: NodeId,
        compute: impl FnOnce() -> f32,
    ) -> f32 {
        if let Some(&sim) = self.pairs.get(&key(a, b)) {
            self.hits += 1;
            return sim;
        }
        self.misses += 1;
        let sim = compute();
        self.pairs.insert(key(a, b), sim);
        sim
    }

    pub(crate) fn distribution(&self) -> Option<&[f32]> {
        self.distribution.as_deref()
    }

    pub(crate) fn set_distribution(&mut self, mut sims: Vec<f32>) {
        sims.sort_by(|a, b| a.total_cmp(b));
        self.distribution = Some(sims);
    }

    /// Node set changed without touching existing pairs.
    pub(crate) fn invalidate_distribution(&mut self) {
        self.distribution = None;
    }

    /// Drop every pair involving `id`.
    pub(crate) fn evict_node(&mut self, id: NodeId) {
        self.pairs.retain(|&(a, b), _| a != id && b != id);
        self.distribution = None;
    }

    /// Drop everything.
    pub(crate) fn invalidate(&mut self) {
        self.pairs.clear();
        self.distribution = None;
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.pairs.len(),
        }
    }
}

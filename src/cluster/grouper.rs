//! Incremental grouping of embeddings by cosine similarity.
//!
//! [`EmbeddingsGrouper`] owns a set of nodes (payload + embedding) and keeps them
//! partitioned into clusters. It offers two ways of building that partition:
//!
//! - **Incremental** ([`add_node`](EmbeddingsGrouper::add_node)): a greedy, order-dependent
//!   join against existing centroids. Cheap (one pass over the clusters) but the result
//!   depends on insertion order.
//! - **Full** ([`recluster`](EmbeddingsGrouper::recluster)): connected components of the
//!   graph linking every pair with similarity `>= eps`. Deterministic and idempotent.
//!
//! The two do not generally agree. Callers that need a canonical grouping call
//! `recluster` after incremental inserts.
//!
//! ## Threshold tuning
//!
//! Picking `eps` by hand is data dependent. [`tune_threshold_for_target_clusters`]
//! searches percentiles of the pairwise similarity distribution instead, and keeps the
//! most selective threshold that still brings the cluster count down to the target.
//!
//! ## Cost
//!
//! Full passes are O(n²) in both time and memory: every pairwise similarity is computed
//! once and kept in the cache until the node set changes. A few thousand nodes are fine;
//! beyond that the cache dominates memory use.
//!
//! [`tune_threshold_for_target_clusters`]: EmbeddingsGrouper::tune_threshold_for_target_clusters

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::cache::{CacheStats, SimilarityCache};
use super::node::{Cluster, ClusterId, Node, NodeId};
use super::threshold::{validate_cutoff, validate_eps};
use super::util::{self, Edge};
use crate::embedding::{Embedding, EmbeddingType};
use crate::error::{Error, Result};
use crate::vector;

/// Default similarity cutoff for linking nodes.
pub const DEFAULT_EPS: f32 = 0.85;

/// Lowest percentile considered by threshold tuning.
pub const MIN_TUNING_PERCENTILE: u32 = 80;

/// Highest percentile considered by threshold tuning.
pub const MAX_TUNING_PERCENTILE: u32 = 99;

/// Grouper configuration.
///
/// Every field has a default, so a partial (or empty) serialized object is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    /// Minimum cosine similarity for two nodes to be linked by a full recluster.
    pub eps: f32,

    /// Connected groups smaller than this are not merged during a full recluster;
    /// each of their nodes stays a singleton. `0` behaves like `1`.
    pub min_cluster_size: usize,

    /// Cutoff for joining an existing cluster in [`EmbeddingsGrouper::add_node`].
    /// Falls back to `eps` when unset.
    pub insert_threshold: Option<f32>,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_cluster_size: 1,
            insert_threshold: None,
        }
    }
}

impl GroupingOptions {
    /// Set the linking cutoff.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set the minimum size of a merged group.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Set the incremental join cutoff.
    pub fn with_insert_threshold(mut self, insert_threshold: f32) -> Self {
        self.insert_threshold = Some(insert_threshold);
        self
    }

    /// Cutoff used by incremental inserts.
    pub fn join_threshold(&self) -> f32 {
        self.insert_threshold.unwrap_or(self.eps)
    }

    /// Check that both cutoffs are finite cosine similarities in `[-1, 1]`.
    ///
    /// Builder methods and deserialization accept any value; out-of-range cutoffs never
    /// link anything and leave every node a singleton.
    pub fn validate(&self) -> Result<()> {
        validate_eps(self.eps)?;
        if let Some(t) = self.insert_threshold {
            validate_cutoff("insert_threshold", t)?;
        }
        Ok(())
    }
}

/// Outcome of [`EmbeddingsGrouper::tune_threshold_for_target_clusters`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTuning {
    /// Chosen percentile of the pairwise similarity distribution.
    pub percentile: f32,
    /// Similarity cutoff at that percentile, now the grouper's `eps`.
    pub threshold: f32,
    /// Number of clusters after reclustering at `threshold`.
    pub cluster_count: usize,
}

/// Similarity-based clustering engine over nodes carrying a payload `T`.
///
/// Every tracked node belongs to exactly one cluster, no cluster is ever empty, and
/// every centroid is the normalized mean of its members once a call returns.
#[derive(Clone, Debug)]
pub struct EmbeddingsGrouper<T> {
    options: GroupingOptions,
    nodes: BTreeMap<NodeId, Node<T>>,
    // Keyed by monotonic ids, so iteration is creation order.
    clusters: BTreeMap<ClusterId, Cluster>,
    node_cluster: HashMap<NodeId, ClusterId>,
    cache: SimilarityCache,
    next_node: u64,
    next_cluster: u64,
}

impl<T> Default for EmbeddingsGrouper<T> {
    fn default() -> Self {
        Self::new(GroupingOptions::default())
    }
}

impl<T> EmbeddingsGrouper<T> {
    /// Create an empty grouper.
    ///
    /// Never fails; invalid cutoffs are logged. Use [`try_new`](Self::try_new) to reject
    /// them instead.
    pub fn new(options: GroupingOptions) -> Self {
        if let Err(err) = options.validate() {
            warn!(%err, ?options, "grouping options out of range");
        }
        Self {
            options,
            nodes: BTreeMap::new(),
            clusters: BTreeMap::new(),
            node_cluster: HashMap::new(),
            cache: SimilarityCache::default(),
            next_node: 0,
            next_cluster: 0,
        }
    }

    /// Create an empty grouper from validated options.
    pub fn try_new(options: GroupingOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    /// Current configuration.
    pub fn options(&self) -> &GroupingOptions {
        &self.options
    }

    /// Replace the linking cutoff. Takes effect on the next full recluster.
    pub fn set_eps(&mut self, eps: f32) -> Result<()> {
        validate_eps(eps)?;
        self.options.eps = eps;
        Ok(())
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is tracked.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The node behind `id`.
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(&id)
    }

    /// Tracked nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> + '_ {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    /// Dimensionality of the tracked embeddings, if any node is tracked.
    pub fn dimension(&self) -> Option<usize> {
        self.reference_embedding().map(Embedding::dimension)
    }

    /// Embedding model of the tracked nodes, if any node is tracked.
    pub fn embedding_type(&self) -> Option<&EmbeddingType> {
        self.reference_embedding().map(|e| &e.kind)
    }

    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Clusters in creation order.
    pub fn clusters(&self) -> impl ExactSizeIterator<Item = &Cluster> + '_ {
        self.clusters.values()
    }

    /// Owned copy of the current clusters.
    pub fn cluster_snapshot(&self) -> Vec<Cluster> {
        self.clusters.values().cloned().collect()
    }

    /// Cluster by id.
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// The cluster currently holding `id`, or `None` if the node is not tracked.
    pub fn cluster_for_node(&self, id: NodeId) -> Option<&Cluster> {
        self.node_cluster
            .get(&id)
            .and_then(|cid| self.clusters.get(cid))
    }

    /// Cosine similarity between two tracked nodes, served from the cache when present.
    pub fn similarity(&self, a: NodeId, b: NodeId) -> Option<f32> {
        let (na, nb) = (self.nodes.get(&a)?, self.nodes.get(&b)?);
        Some(self.cache.get(a, b).unwrap_or_else(|| {
            vector::cosine_similarity(&na.embedding.values, &nb.embedding.values)
        }))
    }

    /// Similarity cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Insert one node, joining the most similar cluster if its centroid clears the
    /// join threshold, otherwise starting a singleton.
    ///
    /// Ties go to the earliest created cluster. The outcome depends on insertion order.
    pub fn add_node(&mut self, node: Node<T>) -> Result<NodeId> {
        check_compatible(self.reference_embedding(), &node.embedding)?;

        let threshold = self.options.join_threshold();
        let mut best: Option<(ClusterId, f32)> = None;
        for cluster in self.clusters.values() {
            let sim = vector::cosine_similarity(&cluster.centroid, &node.embedding.values);
            if sim >= threshold && best.map_or(true, |(_, b)| sim > b) {
                best = Some((cluster.id, sim));
            }
        }

        let id = self.issue_node_id();
        self.nodes.insert(id, node);
        self.cache.invalidate_distribution();

        match best {
            Some((cid, sim)) => {
                trace!(node = %id, cluster = %cid, sim, "joined cluster");
                self.attach(id, cid);
            }
            None => {
                let cid = self.push_cluster(vec![id]);
                trace!(node = %id, cluster = %cid, "started cluster");
            }
        }
        Ok(id)
    }

    /// Insert many nodes, each as a singleton, then optionally recluster.
    ///
    /// Every node is validated before any is inserted. Returned ids follow input order.
    pub fn add_nodes<I>(&mut self, nodes: I, recluster_after: bool) -> Result<Vec<NodeId>>
    where
        I: IntoIterator<Item = Node<T>>,
    {
        let nodes: Vec<Node<T>> = nodes.into_iter().collect();
        let reference = self
            .reference_embedding()
            .or_else(|| nodes.first().map(|n| &n.embedding));
        for node in &nodes {
            check_compatible(reference, &node.embedding)?;
        }

        let mut ids = Vec::with_capacity(nodes.len());
        for node in nodes {
            let id = self.issue_node_id();
            self.nodes.insert(id, node);
            self.push_cluster(vec![id]);
            ids.push(id);
        }
        debug!(added = ids.len(), total = self.nodes.len(), recluster_after, "bulk insert");

        if recluster_after {
            self.cache.invalidate_distribution();
            self.recluster();
        } else {
            self.cache.invalidate();
        }
        Ok(ids)
    }

    /// Remove a node. Returns `false` if `id` is not tracked.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.take_node(id).is_some()
    }

    /// Remove a node and hand back its payload and embedding.
    ///
    /// A cluster left without members is deleted; otherwise its centroid is recomputed.
    pub fn take_node(&mut self, id: NodeId) -> Option<Node<T>> {
        let node = self.nodes.remove(&id)?;
        self.cache.evict_node(id);

        let Some(cid) = self.node_cluster.remove(&id) else {
            return Some(node);
        };
        let emptied = match self.clusters.get_mut(&cid) {
            Some(cluster) => {
                cluster.members.retain(|&m| m != id);
                if !cluster.members.is_empty() {
                    cluster.centroid = centroid_of(&self.nodes, &cluster.members);
                }
                cluster.members.is_empty()
            }
            None => false,
        };
        if emptied {
            self.clusters.remove(&cid);
            trace!(node = %id, cluster = %cid, "removed node and its cluster");
        } else {
            trace!(node = %id, cluster = %cid, "removed node");
        }
        Some(node)
    }

    /// Drop all nodes, clusters and cached similarities.
    ///
    /// Ids keep counting up, so handles issued before the call stay invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.clusters.clear();
        self.node_cluster.clear();
        self.cache.invalidate();
    }

    /// Rebuild every cluster from scratch.
    ///
    /// Nodes are linked when their similarity is `>= eps` and clusters are the connected
    /// components of that graph. Components smaller than `min_cluster_size` are split
    /// into singletons. Clusters come out ordered by their oldest node.
    ///
    /// O(n²) on the first call after the node set changes; later calls reuse cached
    /// similarities.
    pub fn recluster(&mut self) {
        let (ids, groups) = match self.nodes.len() {
            0 => (Vec::new(), Vec::new()),
            1 => (self.nodes.keys().copied().collect(), vec![vec![0]]),
            n => {
                let (ids, edges) = self.similarity_graph();
                let groups = util::components_at_threshold(
                    n,
                    &edges,
                    self.options.eps,
                    self.options.min_cluster_size,
                );
                (ids, groups)
            }
        };

        self.clusters.clear();
        self.node_cluster.clear();
        for group in groups {
            self.push_cluster(group.into_iter().map(|i| ids[i]).collect());
        }
        debug!(
            nodes = self.nodes.len(),
            clusters = self.clusters.len(),
            eps = self.options.eps,
            "reclustered"
        );
    }

    /// Similarity at `percentile` (`0..=100`) of the pairwise distribution.
    ///
    /// `Ok(None)` with fewer than two nodes, since there are no pairs.
    pub fn percentile_threshold(&mut self, percentile: f32) -> Result<Option<f32>> {
        validate_percentile(percentile)?;
        if self.nodes.len() < 2 {
            return Ok(None);
        }
        if self.cache.distribution().is_none() {
            self.similarity_graph();
        }
        Ok(self
            .cache
            .distribution()
            .and_then(|sorted| util::percentile(sorted, percentile)))
    }

    /// Set `eps` to the similarity at `percentile` and recluster.
    ///
    /// Returns the threshold in effect afterwards. With fewer than two nodes there is no
    /// distribution, so `eps` is left unchanged.
    pub fn apply_percentile_and_recluster(&mut self, percentile: f32) -> Result<f32> {
        if let Some(threshold) = self.percentile_threshold(percentile)? {
            self.options.eps = threshold;
        }
        self.recluster();
        Ok(self.options.eps)
    }

    /// Find the most selective percentile in
    /// [`MIN_TUNING_PERCENTILE`]`..=`[`MAX_TUNING_PERCENTILE`] whose threshold yields at
    /// most `max_clusters` clusters, then apply it.
    ///
    /// Higher percentiles mean stricter thresholds and never fewer clusters, so the
    /// search is a binary search. When even the loosest percentile leaves too many
    /// clusters, the loosest one is applied. Candidates are scored from cached
    /// similarities only.
    pub fn tune_threshold_for_target_clusters(
        &mut self,
        max_clusters: usize,
    ) -> Result<ThresholdTuning> {
        let n = self.nodes.len();
        if n == 0 {
            return Ok(ThresholdTuning {
                percentile: MAX_TUNING_PERCENTILE as f32,
                threshold: self.options.eps,
                cluster_count: 0,
            });
        }
        if max_clusters == 0 {
            return Err(Error::InvalidClusterCount {
                requested: max_clusters,
                n_items: n,
            });
        }
        if n == 1 {
            self.recluster();
            return Ok(ThresholdTuning {
                percentile: MAX_TUNING_PERCENTILE as f32,
                threshold: self.options.eps,
                cluster_count: 1,
            });
        }

        let (_, edges) = self.similarity_graph();
        let sorted = self.cache.distribution().unwrap_or(&[]);
        let min_cluster_size = self.options.min_cluster_size;
        let eps = self.options.eps;

        let mut best: Option<u32> = None;
        let (mut lo, mut hi) = (MIN_TUNING_PERCENTILE, MAX_TUNING_PERCENTILE);
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let threshold = util::percentile(sorted, mid as f32).unwrap_or(eps);
            let count = util::count_at_threshold(n, &edges, threshold, min_cluster_size);
            debug!(percentile = mid, threshold, count, "tuning candidate");
            if count <= max_clusters {
                best = Some(mid);
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }

        let percentile = best.unwrap_or_else(|| {
            warn!(
                max_clusters,
                percentile = MIN_TUNING_PERCENTILE,
                "no tuning percentile reaches the target cluster count"
            );
            MIN_TUNING_PERCENTILE
        }) as f32;

        let threshold = self.apply_percentile_and_recluster(percentile)?;
        let tuning = ThresholdTuning {
            percentile,
            threshold,
            cluster_count: self.clusters.len(),
        };
        debug!(?tuning, max_clusters, "tuned threshold");
        Ok(tuning)
    }

    fn reference_embedding(&self) -> Option<&Embedding> {
        self.nodes.values().next().map(|n| &n.embedding)
    }

    fn issue_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn push_cluster(&mut self, members: Vec<NodeId>) -> ClusterId {
        let id = ClusterId(self.next_cluster);
        self.next_cluster += 1;
        for &m in &members {
            self.node_cluster.insert(m, id);
        }
        let centroid = centroid_of(&self.nodes, &members);
        self.clusters.insert(
            id,
            Cluster {
                id,
                members,
                centroid,
            },
        );
        id
    }

    fn attach(&mut self, node: NodeId, cid: ClusterId) {
        if let Some(cluster) = self.clusters.get_mut(&cid) {
            cluster.members.push(node);
            cluster.centroid = centroid_of(&self.nodes, &cluster.members);
            self.node_cluster.insert(node, cid);
        }
    }

    /// All pairwise similarities of the current node set, in node order, going through
    /// the cache. Also records the sorted distribution.
    fn similarity_graph(&mut self) -> (Vec<NodeId>, Vec<Edge>) {
        let (ids, vectors): (Vec<NodeId>, Vec<&[f32]>) = self
            .nodes
            .iter()
            .map(|(&id, node)| (id, node.embedding.values.as_slice()))
            .unzip();

        let n = ids.len();
        let mut edges: Vec<Edge> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = self.cache.get_or_insert_with(ids[i], ids[j], || {
                    vector::cosine_similarity(vectors[i], vectors[j])
                });
                edges.push((i, j, sim));
            }
        }

        if self.cache.distribution().is_none() {
            self.cache
                .set_distribution(edges.iter().map(|&(_, _, sim)| sim).collect());
        }
        (ids, edges)
    }
}

fn centroid_of<T>(nodes: &BTreeMap<NodeId, Node<T>>, members: &[NodeId]) -> Vec<f32> {
    vector::compute_centroid(
        members
            .iter()
            .filter_map(|id| nodes.get(id))
            .map(|n| n.embedding.values.as_slice()),
    )
}

fn check_compatible(reference: Option<&Embedding>, embedding: &Embedding) -> Result<()> {
    embedding.validate()?;
    let Some(reference) = reference else {
        return Ok(());
    };
    if reference.kind != embedding.kind {
        return Err(Error::EmbeddingTypeMismatch {
            expected: reference.kind.to_string(),
            found: embedding.kind.to_string(),
        });
    }
    if reference.dimension() != embedding.dimension() {
        return Err(Error::DimensionMismatch {
            expected: reference.dimension(),
            found: embedding.dimension(),
        });
    }
    Ok(())
}

fn validate_percentile(percentile: f32) -> Result<()> {
    if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
        return Err(Error::InvalidParameter {
            name: "percentile",
            message: "must be within [0, 100]",
        });
    }
    Ok(())
}

//! Similarity-based grouping of embedding vectors.
//!
//! ## Model
//!
//! Points are embeddings compared by **cosine similarity**, so only direction matters.
//! Two points are *linked* when their similarity is at least a cutoff `eps`, and a
//! cluster is a connected component of the resulting graph:
//!
//! ```text
//! link(i, j)  ⇔  cos(x_i, x_j) ≥ eps
//! ```
//!
//! This is single-linkage agglomeration cut at a fixed similarity. It needs no `k`,
//! never labels anything as noise, and is fully determined by `eps`.
//!
//! Each cluster carries a **centroid**: the mean of its members, rescaled to unit length.
//! A mean of zero stays zero instead of becoming NaN.
//!
//! ## Incremental vs. full
//!
//! [`EmbeddingsGrouper`] keeps a live partition. Single inserts take a greedy shortcut
//! (join the closest centroid if it is close enough), which depends on insertion order.
//! A full [`recluster`](EmbeddingsGrouper::recluster) recomputes the canonical
//! partition from cached pairwise similarities.
//!
//! ## Choosing `eps`
//!
//! A fixed `eps` transfers poorly between embedding models. The grouper can derive it
//! from a percentile of the observed pairwise similarities, and can search that
//! percentile to meet a maximum cluster count.
//!
//! ## Usage
//!
//! ```rust
//! use embedding_grouper::cluster::{Clustering, EmbeddingsGrouper, GroupingOptions, Node};
//! use embedding_grouper::cluster::SimilarityThreshold;
//! use embedding_grouper::Embedding;
//!
//! let data = vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.9, 0.1, 0.0],
//!     vec![0.0, 0.0, 1.0],
//! ];
//!
//! // One-shot clustering of raw vectors.
//! let labels = SimilarityThreshold::new(0.9).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![0, 0, 1]);
//!
//! // Stateful grouping of payloads.
//! let mut grouper = EmbeddingsGrouper::new(GroupingOptions::default().with_eps(0.9));
//! let ids = grouper
//!     .add_nodes(
//!         data.into_iter()
//!             .enumerate()
//!             .map(|(i, v)| Node::new(i, Embedding::new("demo-3", v))),
//!         true,
//!     )
//!     .unwrap();
//! assert_eq!(grouper.cluster_count(), 2);
//! assert!(grouper.cluster_for_node(ids[1]).unwrap().contains(ids[0]));
//! ```

mod cache;
mod grouper;
mod node;
mod threshold;
mod traits;
mod util;

pub use cache::CacheStats;
pub use grouper::{
    EmbeddingsGrouper, GroupingOptions, ThresholdTuning, DEFAULT_EPS, MAX_TUNING_PERCENTILE,
    MIN_TUNING_PERCENTILE,
};
pub use node::{Cluster, ClusterId, Node, NodeId};
pub use threshold::SimilarityThreshold;
pub use traits::Clustering;

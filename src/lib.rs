//! Incremental clustering of embedding vectors.
//!
//! `embedding-grouper` groups embeddings (tool descriptions, code chunks, search hits)
//! into clusters of similar items for downstream selection and reranking.
//!
//! The primary public API is under [`cluster`], which provides:
//! - [`EmbeddingsGrouper`]: a stateful grouper with incremental inserts and removals,
//!   a deterministic full recluster, and percentile-based threshold tuning
//! - [`SimilarityThreshold`]: the same clustering as a one-shot [`Clustering`] over raw
//!   vectors
//!
//! Vector helpers live in [`vector`].

#![forbid(unsafe_code)]

pub mod cluster;
pub mod embedding;
pub mod error;
pub mod vector;

pub use cluster::{
    CacheStats, Cluster, ClusterId, Clustering, EmbeddingsGrouper, GroupingOptions, Node,
    NodeId, SimilarityThreshold, ThresholdTuning,
};
pub use embedding::{Embedding, EmbeddingType};
pub use error::{Error, Result};

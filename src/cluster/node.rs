use std::fmt;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// Handle the grouper hands out for every inserted node.
///
/// Ids are monotonic and never reused by the grouper that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Cluster identifier. Ordering follows creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub(crate) u64);

impl ClusterId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster#{}", self.0)
    }
}

/// A caller payload paired with its embedding.
///
/// The grouper only ever looks at the embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<T> {
    /// Opaque payload.
    pub value: T,
    /// Embedding used for all similarity decisions.
    pub embedding: Embedding,
}

impl<T> Node<T> {
    /// Pair a payload with its embedding.
    pub fn new(value: T, embedding: Embedding) -> Self {
        Self { value, embedding }
    }
}

/// A group of nodes and its centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub(crate) id: ClusterId,
    pub(crate) members: Vec<NodeId>,
    pub(crate) centroid: Vec<f32>,
}

impl Cluster {
    /// Cluster identifier.
    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// Member node ids.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Normalized mean of the member embeddings (zero if the mean is zero).
    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    /// Number of members. Never zero for a cluster owned by a grouper.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false` for clusters returned by a grouper.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }
}

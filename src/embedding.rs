//! Embedding values as produced by an external embedding service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector;

/// Tag identifying the model (and therefore dimensionality) that produced an embedding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingType(String);

impl EmbeddingType {
    /// Create a tag from a model identifier, e.g. `"text-embedding-3-small-512"`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbeddingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmbeddingType {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A fixed-length float vector tagged with the model that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Producing model.
    pub kind: EmbeddingType,
    /// Vector components.
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create an embedding.
    pub fn new(kind: impl Into<EmbeddingType>, values: Vec<f32>) -> Self {
        Self {
            kind: kind.into(),
            values,
        }
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Check that the vector is usable in similarity math.
    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(Error::EmptyEmbedding);
        }
        vector::check_finite(&self.values)
    }
}

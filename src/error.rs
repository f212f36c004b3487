use thiserror::Error;

/// Errors returned by the grouper and the clustering helpers in this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// An embedding has no dimensions.
    #[error("embedding has zero dimensions")]
    EmptyEmbedding,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the tracked nodes.
    #[error("invalid cluster count: requested {requested}, but grouper has {n_items} nodes")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of nodes being clustered.
        n_items: usize,
    },

    /// Embeddings have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Embeddings produced by different models were mixed.
    #[error("embedding type mismatch: expected {expected}, found {found}")]
    EmbeddingTypeMismatch {
        /// Embedding type already tracked by the grouper.
        expected: String,
        /// Embedding type of the rejected node.
        found: String,
    },

    /// An embedding contains NaN or an infinity.
    #[error("non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first offending component.
        index: usize,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

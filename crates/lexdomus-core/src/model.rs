//! Capability traits for the optional model backends.
//!
//! Retrieval depends only on these traits; the ONNX and HTTP implementations
//! live in `lexdomus-ai` behind features.

use async_trait::async_trait;

/// Encodes text into the embedding space of a vector index.
pub trait TextEncoder: Send + Sync {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Encode one query into a normalized vector.
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Pairwise (query, passage) relevance model used for reranking.
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// One score per passage, higher is more relevant.
    async fn score_pairs(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>>;
}

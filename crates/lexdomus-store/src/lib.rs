//! Storage and retrieval: chunk corpus, BM25 and vector indices, hybrid
//! ranking, and the hash-chained audit ledger.

mod context;
mod corpus;
mod error;
pub mod fusion;
mod hybrid;
pub mod ledger;
pub mod lexical;
pub mod rerank;
mod vector;

#[cfg(feature = "lancedb")]
mod lance;

pub use context::RetrievalContext;
pub use corpus::Corpus;
pub use error::StoreError;
pub use hybrid::HybridRetriever;
pub use ledger::{Ledger, LedgerEntry, LedgerError};
pub use lexical::Bm25Index;
pub use rerank::Reranker;
pub use vector::{FlatIndex, VectorIndex, VectorScorer};

#[cfg(feature = "lancedb")]
pub use lance::LanceIndex;

//! Model backends for retrieval: ONNX Runtime embeddings and cross-encoder
//! reranking (feature `onnx`), and a remote reranker client (feature `http`).

#[cfg(feature = "onnx")]
mod cross_encoder;
#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "http")]
mod remote;

#[cfg(feature = "onnx")]
pub use cross_encoder::{CrossEncoder, DEFAULT_RERANK_MODEL};
#[cfg(feature = "onnx")]
pub use embedder::{DEFAULT_EMBEDDING_MODEL, Embedder};
#[cfg(feature = "http")]
pub use remote::{RemoteReranker, RerankError};

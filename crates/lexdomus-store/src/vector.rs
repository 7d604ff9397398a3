//! Nearest-neighbour search over chunk embeddings.
//!
//! Two backends implement [`VectorIndex`]: the in-memory [`FlatIndex`] read
//! from a JSONL file of `{doc_id, vector}` rows, and the LanceDB table (feature
//! `lancedb`). [`VectorScorer`] pairs an index with a query encoder and turns
//! every failure into an empty contribution.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lexdomus_core::TextEncoder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::StoreError;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embedding dimensionality of the indexed vectors.
    fn dim(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `limit` nearest chunks as `(doc_id, similarity)`, best first.
    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>, StoreError>;
}

#[derive(Deserialize)]
struct VectorRow {
    doc_id: String,
    vector: Vec<f32>,
}

/// Brute-force inner-product index over L2-normalised vectors.
#[derive(Debug, Default)]
pub struct FlatIndex {
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Build from rows already in memory. The first row fixes the dimension;
    /// rows of any other length are skipped.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, Vec<f32>)>) -> Self {
        let mut index = Self::default();
        for (doc_id, vector) in rows {
            index.push(doc_id, vector);
        }
        index
    }

    /// Load a JSONL vector file. A missing file yields an empty index.
    pub fn load_jsonl(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            warn!(path = %path.display(), "vector file not found, vector scoring disabled");
            return Ok(Self::default());
        }

        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut index = Self::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<VectorRow>(&line) {
                Ok(row) => index.push(row.doc_id, row.vector),
                Err(e) => warn!(line = lineno + 1, error = %e, "skipping malformed vector row"),
            }
        }

        info!(path = %path.display(), vectors = index.len(), dim = index.dim, "loaded flat vector index");
        Ok(index)
    }

    fn push(&mut self, doc_id: String, mut vector: Vec<f32>) {
        if vector.is_empty() {
            return;
        }
        if self.dim == 0 {
            self.dim = vector.len();
        }
        if vector.len() != self.dim {
            warn!(%doc_id, expected = self.dim, actual = vector.len(), "skipping vector of wrong dimension");
            return;
        }
        l2_normalize(&mut vector);
        self.ids.push(doc_id);
        self.vectors.extend_from_slice(&vector);
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>, StoreError> {
        if self.ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut q = query.to_vec();
        l2_normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .map(|v| v.iter().zip(&q).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, s)| (self.ids[i].clone(), s))
            .collect())
    }
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Query encoder plus index. Never fails: any error is logged and the
/// vector path contributes nothing. Encoding runs on the blocking pool.
#[derive(Clone)]
pub struct VectorScorer {
    encoder: Arc<dyn TextEncoder>,
    index: Arc<dyn VectorIndex>,
}

impl VectorScorer {
    pub fn new(encoder: Arc<dyn TextEncoder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { encoder, index }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Vec<(String, f32)> {
        if self.index.is_empty() {
            return Vec::new();
        }
        let encoder = Arc::clone(&self.encoder);
        let text = query.to_owned();
        let embedding = match tokio::task::spawn_blocking(move || encoder.encode(&text)).await {
            Ok(Ok(e)) => e,
            Ok(Err(e)) => {
                warn!(error = %e, "query encoding failed, skipping vector scoring");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "query encoding task aborted, skipping vector scoring");
                return Vec::new();
            }
        };
        match self.index.search(&embedding, limit).await {
            Ok(hits) => {
                debug!(hits = hits.len(), "vector search");
                hits
            }
            Err(e) => {
                warn!(error = %e, "vector search failed, skipping vector scoring");
                Vec::new()
            }
        }
    }
}

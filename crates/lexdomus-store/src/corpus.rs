//! The chunk corpus: every citable unit, in ingestion order.
//!
//! Loaded once from `chunks.jsonl` (one [`Candidate`] per line). A missing
//! file is an empty corpus, not an error: retrieval then finds nothing and
//! every question resolves to `NO_EVIDENCE`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lexdomus_core::Candidate;
use tracing::{info, warn};

use crate::StoreError;

#[derive(Debug, Default)]
pub struct Corpus {
    chunks: Vec<Candidate>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a corpus from chunks already in memory. Later duplicates of a
    /// `doc_id` are dropped.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Candidate>) -> Self {
        let mut corpus = Self::default();
        for chunk in chunks {
            corpus.push(chunk);
        }
        corpus
    }

    /// Load a JSONL chunk file. Malformed lines are skipped with a warning.
    pub fn load_jsonl(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            warn!(path = %path.display(), "corpus file not found, using empty corpus");
            return Ok(Self::empty());
        }

        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut corpus = Self::default();
        let mut skipped = 0usize;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Candidate>(line) {
                Ok(chunk) => corpus.push(chunk),
                Err(e) => {
                    skipped += 1;
                    warn!(line = lineno + 1, error = %e, "skipping malformed chunk record");
                }
            }
        }

        info!(
            path = %path.display(),
            chunks = corpus.len(),
            skipped,
            "loaded corpus"
        );
        Ok(corpus)
    }

    fn push(&mut self, chunk: Candidate) {
        if self.by_id.contains_key(&chunk.doc_id) {
            warn!(doc_id = %chunk.doc_id, "duplicate doc_id in corpus, keeping first");
            return;
        }
        self.by_id.insert(chunk.doc_id.clone(), self.chunks.len());
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk at a corpus position.
    pub fn get(&self, idx: usize) -> Option<&Candidate> {
        self.chunks.get(idx)
    }

    /// Corpus position of a `doc_id`.
    pub fn position(&self, doc_id: &str) -> Option<usize> {
        self.by_id.get(doc_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.chunks.iter()
    }
}

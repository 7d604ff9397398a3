//! Hybrid retrieval: BM25 + vector similarity, fused and reranked.

use std::sync::Arc;

use lexdomus_core::{Candidate, RelevanceModel, RetrievalSettings};
use tracing::debug;

use crate::fusion::fuse;
use crate::rerank::Reranker;
use crate::{Bm25Index, Corpus, VectorScorer};

/// Minimum candidate pool drawn from each scorer.
const MIN_POOL: usize = 20;

/// Top-k candidates for a query over a fixed corpus.
///
/// Deterministic for a fixed corpus, vector index and relevance model. An
/// empty corpus always yields an empty result.
pub struct HybridRetriever {
    corpus: Arc<Corpus>,
    bm25: Bm25Index,
    vectors: Option<VectorScorer>,
    model: Option<Arc<dyn RelevanceModel>>,
    settings: RetrievalSettings,
}

impl HybridRetriever {
    /// Lexical-only retriever with default settings.
    pub fn new(corpus: Arc<Corpus>) -> Self {
        let bm25 = Bm25Index::build(&corpus);
        Self {
            corpus,
            bm25,
            vectors: None,
            model: None,
            settings: RetrievalSettings::default(),
        }
    }

    pub fn with_vectors(mut self, vectors: VectorScorer) -> Self {
        self.vectors = Some(vectors);
        self
    }

    pub fn with_relevance_model(mut self, model: Arc<dyn RelevanceModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_settings(mut self, settings: &RetrievalSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn has_vectors(&self) -> bool {
        self.vectors.is_some()
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<Candidate> {
        if k == 0 || self.corpus.is_empty() {
            return Vec::new();
        }
        let pool = (6 * k).max(MIN_POOL);

        let lexical = self.bm25.search(query, pool);
        let vector: Vec<(usize, f32)> = match &self.vectors {
            Some(scorer) => scorer
                .search(query, pool)
                .await
                .into_iter()
                .filter_map(|(doc_id, s)| self.corpus.position(&doc_id).map(|pos| (pos, s)))
                .collect(),
            None => Vec::new(),
        };

        let fused = fuse(&lexical, &vector, self.settings.alpha());
        debug!(
            lexical = lexical.len(),
            vector = vector.len(),
            fused = fused.len(),
            "hybrid candidates"
        );

        let mut items: Vec<(usize, String)> = fused
            .into_iter()
            .filter_map(|(pos, _)| self.corpus.get(pos).map(|c| (pos, c.text.clone())))
            .collect();

        let reranker = Reranker::new(
            self.model.clone(),
            self.settings.rerank_depth(),
            self.settings.rerank_timeout(),
        );
        reranker.rerank(query, &mut items).await;

        items
            .into_iter()
            .take(k)
            .filter_map(|(pos, _)| self.corpus.get(pos).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatIndex;
    use crate::corpus::tests::chunk;
    use crate::rerank::tests::LengthModel;
    use crate::vector::tests::KeywordEncoder;

    fn corpus() -> Arc<Corpus> {
        Arc::new(Corpus::from_chunks([
            chunk("lpi14", "BOE", "LPI art. 14", "Derechos morales del autor: paternidad e integridad de la obra."),
            chunk("lpi17", "BOE", "LPI art. 17", "Corresponde al autor el ejercicio exclusivo de los derechos de explotación de su obra."),
            chunk("lpi43", "BOE", "LPI art. 43", "La cesión de derechos para cualquier modalidad de explotación deberá expresarse."),
            chunk("berne", "WIPO/OMPI", "Berna art. 6bis", "The author shall have the right to claim authorship of the work."),
            chunk("dir", "EUR-Lex", "Directiva 2001/29/CE", "Reproduction right for authors of their works."),
        ]))
    }

    fn ids(cands: &[Candidate]) -> Vec<&str> {
        cands.iter().map(|c| c.doc_id.as_str()).collect()
    }

    #[tokio::test]
    async fn lexical_only_finds_best_match() {
        let r = HybridRetriever::new(corpus());
        let out = r.retrieve("derechos morales paternidad", 3).await;
        assert_eq!(out[0].doc_id, "lpi14");
        assert!(out.len() <= 3);
    }

    #[tokio::test]
    async fn length_bounded_by_k() {
        let r = HybridRetriever::new(corpus());
        for k in 0..6 {
            assert!(r.retrieve("derechos autor obra explotación", k).await.len() <= k);
        }
    }

    #[tokio::test]
    async fn deterministic() {
        let r = HybridRetriever::new(corpus());
        let a = r.retrieve("derechos de explotación", 4).await;
        let b = r.retrieve("derechos de explotación", 4).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_corpus_yields_nothing() {
        let r = HybridRetriever::new(Arc::new(Corpus::empty()));
        assert!(r.retrieve("derechos", 6).await.is_empty());
    }

    #[tokio::test]
    async fn vector_only_hit_is_surfaced() {
        // "authorship" has no lexical match for the Spanish query, only the vector.
        let encoder = Arc::new(KeywordEncoder(vec!["paternidad", "authorship"]));
        let index = Arc::new(FlatIndex::from_rows([
            ("berne".to_string(), vec![1.0, 1.0]),
            ("dir".to_string(), vec![0.0, 1.0]),
        ]));
        let r = HybridRetriever::new(corpus())
            .with_vectors(VectorScorer::new(encoder, index))
            .with_settings(&RetrievalSettings {
                alpha: 0.5,
                ..Default::default()
            });
        let out = r.retrieve("paternidad", 5).await;
        assert!(ids(&out).contains(&"berne"));
        assert!(ids(&out).contains(&"lpi14"));
    }

    #[tokio::test]
    async fn relevance_model_reorders() {
        let r = HybridRetriever::new(corpus()).with_relevance_model(Arc::new(LengthModel));
        let out = r.retrieve("derechos obra", 5).await;
        let lens: Vec<usize> = out.iter().map(|c| c.text.len()).collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }
}

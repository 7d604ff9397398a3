//! BM25 lexical scoring over the chunk corpus.
//!
//! Okapi BM25 with `k1 = 1.5`, `b = 0.75` and the non-negative Lucene IDF
//! `ln(1 + (N - n + 0.5) / (n + 0.5))`, so every matching term adds a
//! positive contribution even in very small corpora.

use std::collections::{HashMap, HashSet};

use crate::Corpus;

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Case-folded word tokens (`\w+` semantics).
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct tokens of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Inverted index with per-term postings `(doc, term frequency)`.
#[derive(Debug, Default)]
pub struct Bm25Index {
    postings: HashMap<String, Vec<(u32, u32)>>,
    doc_len: Vec<u32>,
    avg_len: f32,
}

impl Bm25Index {
    pub fn build(corpus: &Corpus) -> Self {
        let mut postings: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        let mut doc_len = Vec::with_capacity(corpus.len());

        for (doc, chunk) in corpus.iter().enumerate() {
            let tokens = tokenize(&chunk.text);
            doc_len.push(tokens.len() as u32);

            let mut tf: HashMap<String, u32> = HashMap::new();
            for t in tokens {
                *tf.entry(t).or_default() += 1;
            }
            for (term, count) in tf {
                postings.entry(term).or_default().push((doc as u32, count));
            }
        }

        let total: u64 = doc_len.iter().map(|&l| l as u64).sum();
        let avg_len = if doc_len.is_empty() {
            0.0
        } else {
            total as f32 / doc_len.len() as f32
        };

        Self {
            postings,
            doc_len,
            avg_len,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_len.len()
    }

    fn idf(&self, doc_freq: usize) -> f32 {
        let n = self.doc_count() as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Score every chunk and return the best `limit` as `(corpus position, score)`.
    ///
    /// Only chunks sharing at least one term with the query are returned.
    /// Ordering is by descending score; ties keep corpus order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f32)> {
        if limit == 0 || self.doc_count() == 0 {
            return Vec::new();
        }

        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        let mut scores = vec![0.0f32; self.doc_count()];
        for term in &terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(list.len());
            for &(doc, tf) in list {
                let tf = tf as f32;
                let len_norm = 1.0 - B + B * self.doc_len[doc as usize] as f32 / self.avg_len;
                scores[doc as usize] += idf * tf * (K1 + 1.0) / (tf + K1 * len_norm);
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, s)| *s > 0.0)
            .collect();
        // Stable: equal scores stay in corpus order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::chunk;

    fn corpus() -> Corpus {
        Corpus::from_chunks([
            chunk("lpi14", "BOE", "LPI art. 14", "Derechos morales del autor: irrenunciables e inalienables."),
            chunk("lpi17", "BOE", "LPI art. 17", "Derechos de explotación: reproducción, distribución y comunicación pública."),
            chunk("berne6", "WIPO/OMPI", "Berna art. 6bis", "Independientemente de los derechos patrimoniales, el autor conservará el derecho de reivindicar la paternidad."),
            chunk("usc106", "USC (Cornell/LII)", "17 U.S.C. §106", "Exclusive rights in copyrighted works: reproduce and distribute copies."),
        ])
    }

    #[test]
    fn tokenize_case_folds_words() {
        assert_eq!(
            tokenize("Artículo 14: Derechos MORALES"),
            ["artículo", "14", "derechos", "morales"]
        );
    }

    #[test]
    fn best_match_first() {
        let index = Bm25Index::build(&corpus());
        let hits = index.search("derechos morales irrenunciables", 10);
        assert_eq!(hits[0].0, 0);
        assert!(hits.iter().all(|(_, s)| *s > 0.0));
    }

    #[test]
    fn non_matching_chunks_excluded() {
        let index = Bm25Index::build(&corpus());
        let hits = index.search("copyrighted", 10);
        assert_eq!(hits, vec![(3, hits[0].1)]);
        assert!(index.search("zzz", 10).is_empty());
    }

    #[test]
    fn limit_respected() {
        let index = Bm25Index::build(&corpus());
        assert_eq!(index.search("derechos", 1).len(), 1);
        assert!(index.search("derechos", 0).is_empty());
    }

    #[test]
    fn ties_keep_corpus_order() {
        let c = Corpus::from_chunks([
            chunk("a", "BOE", "", "obra"),
            chunk("b", "BOE", "", "obra"),
            chunk("c", "BOE", "", "obra"),
        ]);
        let index = Bm25Index::build(&c);
        let ids: Vec<usize> = index.search("obra", 10).into_iter().map(|(i, _)| i).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = Bm25Index::build(&Corpus::empty());
        assert!(index.search("derechos", 5).is_empty());
    }
}

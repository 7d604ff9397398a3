//! Reranking of the fused prefix.
//!
//! The top `min(len, depth)` fused candidates are re-scored with a pairwise
//! relevance model; the rest keep their fused order. When no model is
//! configured, or the model fails, times out or returns the wrong number of
//! scores, the token-set similarity ratio is used instead.
//!
//! The model call is driven from the blocking pool, so a model that blocks
//! its thread still cannot hold the request past the timeout.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use lexdomus_core::RelevanceModel;
use lexdomus_core::policy::RERANK_DEPTH_RANGE;
use tracing::{debug, warn};

use crate::lexical::token_set;

/// `2 |Q ∩ D| / (|Q| + |D|)` over distinct case-folded tokens, in `[0, 1]`.
pub fn token_set_ratio(query: &str, text: &str) -> f32 {
    let q = token_set(query);
    let d = token_set(text);
    ratio(&q, &d)
}

fn ratio(q: &HashSet<String>, d: &HashSet<String>) -> f32 {
    let total = q.len() + d.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * q.intersection(d).count() as f32 / total as f32
}

#[derive(Clone)]
pub struct Reranker {
    model: Option<Arc<dyn RelevanceModel>>,
    depth: usize,
    timeout: Duration,
}

impl Default for Reranker {
    fn default() -> Self {
        Self {
            model: None,
            depth: 24,
            timeout: Duration::from_millis(2000),
        }
    }
}

impl Reranker {
    pub fn new(model: Option<Arc<dyn RelevanceModel>>, depth: usize, timeout: Duration) -> Self {
        let (lo, hi) = RERANK_DEPTH_RANGE;
        Self {
            model,
            depth: depth.clamp(lo, hi),
            timeout,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reorder `items` (each paired with its passage text) in place.
    pub async fn rerank<T>(&self, query: &str, items: &mut Vec<(T, String)>) {
        let n = items.len().min(self.depth);
        if n == 0 {
            return;
        }

        let scores = self.score_prefix(query, &items[..n]).await;
        let mut prefix: Vec<((T, String), f32)> = items.drain(..n).zip(scores).collect();
        // Stable: equal scores keep fused order.
        prefix.sort_by(|a, b| b.1.total_cmp(&a.1));

        let rest = std::mem::take(items);
        items.extend(prefix.into_iter().map(|(item, _)| item));
        items.extend(rest);
    }

    async fn score_prefix<T>(&self, query: &str, prefix: &[(T, String)]) -> Vec<f32> {
        if let Some(model) = &self.model {
            let call = {
                let model = Arc::clone(model);
                let query = query.to_owned();
                let passages: Vec<String> = prefix.iter().map(|(_, text)| text.clone()).collect();
                let handle = tokio::runtime::Handle::current();
                tokio::task::spawn_blocking(move || {
                    let passages: Vec<&str> = passages.iter().map(String::as_str).collect();
                    handle.block_on(model.score_pairs(&query, &passages))
                })
            };
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(Ok(scores))) if scores.len() == prefix.len() => {
                    debug!(model = model.name(), scored = scores.len(), "reranked with model");
                    return scores;
                }
                Ok(Ok(Ok(scores))) => warn!(
                    model = model.name(),
                    expected = prefix.len(),
                    actual = scores.len(),
                    "relevance model returned wrong score count, using token-set fallback"
                ),
                Ok(Ok(Err(e))) => warn!(
                    model = model.name(),
                    error = %e,
                    "relevance model failed, using token-set fallback"
                ),
                Ok(Err(e)) => warn!(
                    model = model.name(),
                    error = %e,
                    "relevance model task aborted, using token-set fallback"
                ),
                Err(_) => warn!(
                    model = model.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "relevance model timed out, using token-set fallback"
                ),
            }
        }

        let q = token_set(query);
        prefix
            .iter()
            .map(|(_, text)| ratio(&q, &token_set(text)))
            .collect()
    }
}

//! HTTP client for a remote reranking service.
//!
//! Speaks the text-embeddings-inference `/rerank` shape: POST
//! `{"query", "texts"}` and receive `[{"index", "score"}, ...]` in any order.

use async_trait::async_trait;
use lexdomus_core::RelevanceModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("score for passage {index} out of range for {len} passages")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
}

#[derive(Deserialize)]
struct RankedText {
    index: usize,
    score: f32,
}

pub struct RemoteReranker {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteReranker {
    /// `base_url` like `http://localhost:8080`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn rerank(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>, RerankError> {
        let url = format!("{}/rerank", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&RerankRequest { query, texts })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RerankError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let ranked: Vec<RankedText> = resp.json().await?;
        debug!(url = %url, returned = ranked.len(), "remote rerank");
        scores_by_index(ranked, texts.len())
    }
}

/// Scatter ranked results back into passage order. Passages the server
/// omitted score `f32::NEG_INFINITY`.
fn scores_by_index(ranked: Vec<RankedText>, len: usize) -> Result<Vec<f32>, RerankError> {
    let mut scores = vec![f32::NEG_INFINITY; len];
    for r in ranked {
        let slot = scores
            .get_mut(r.index)
            .ok_or(RerankError::IndexOutOfRange { index: r.index, len })?;
        *slot = r.score;
    }
    Ok(scores)
}

#[async_trait]
impl RelevanceModel for RemoteReranker {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn score_pairs(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>> {
        Ok(self.rerank(query, passages).await?)
    }
}

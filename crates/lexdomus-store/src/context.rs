//! Process-wide holder for the loaded retrieval indices.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::HybridRetriever;

/// Shares one [`HybridRetriever`] across requests and lets a rebuilt one be
/// swapped in. Readers take an `Arc` snapshot, so a request in flight keeps
/// the index it started with.
pub struct RetrievalContext {
    current: RwLock<Arc<HybridRetriever>>,
}

impl RetrievalContext {
    pub fn new(retriever: HybridRetriever) -> Self {
        Self {
            current: RwLock::new(Arc::new(retriever)),
        }
    }

    pub fn snapshot(&self) -> Arc<HybridRetriever> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Install `retriever` and return the one it replaces.
    pub fn swap(&self, retriever: HybridRetriever) -> Arc<HybridRetriever> {
        let next = Arc::new(retriever);
        let chunks = next.corpus().len();
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        let previous = std::mem::replace(&mut *guard, next);
        info!(chunks, "swapped retrieval index");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Corpus;
    use crate::corpus::tests::chunk;

    #[tokio::test]
    async fn snapshot_survives_swap() {
        let ctx = RetrievalContext::new(HybridRetriever::new(Arc::new(Corpus::empty())));
        let before = ctx.snapshot();

        let corpus = Corpus::from_chunks([chunk("a", "BOE", "LPI art. 14", "derechos morales")]);
        let old = ctx.swap(HybridRetriever::new(Arc::new(corpus)));

        assert!(Arc::ptr_eq(&before, &old));
        assert!(before.retrieve("derechos", 3).await.is_empty());
        assert_eq!(ctx.snapshot().retrieve("derechos", 3).await.len(), 1);
    }
}

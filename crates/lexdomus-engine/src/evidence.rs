//! Source-required answering: retrieve, filter by policy, count citations.

use std::sync::Arc;

use async_trait::async_trait;
use lexdomus_core::{Candidate, Jurisdiction, Policy, RetrievalResult, resolve_ref_label};
use lexdomus_store::{HybridRetriever, RetrievalContext};
use tracing::debug;

use crate::collaborators::{EvidenceSource, Outcome};
use crate::filter;

pub const INSUFFICIENT_EVIDENCE: &str = "insufficient citable evidence";

/// Evidence gate over the retriever currently installed in a [`RetrievalContext`].
pub struct EvidenceGate {
    context: Arc<RetrievalContext>,
}

impl EvidenceGate {
    pub fn new(context: Arc<RetrievalContext>) -> Self {
        Self { context }
    }

    pub fn from_retriever(retriever: HybridRetriever) -> Self {
        Self::new(Arc::new(RetrievalContext::new(retriever)))
    }

    /// Decide OK / NO_CONCLUYENTE / NO_EVIDENCE for one question.
    ///
    /// All admissible citations are returned, even past `min_citations`.
    pub async fn answer(&self, question: &str, policy: &Policy) -> RetrievalResult {
        let k = policy.top_k().max(policy.min_citations());
        let retriever = self.context.snapshot();
        let retrieved = retriever.retrieve(question, k).await;
        let retrieved_count = retrieved.len();

        let citations: Vec<Candidate> = filter::filter(retrieved, policy)
            .into_iter()
            .map(|mut c| {
                c.pinpoint = resolve_ref_label(&c.ref_label).is_some();
                c
            })
            .collect();

        let counted = if policy.require_pinpoint() {
            citations.iter().filter(|c| c.pinpoint).count()
        } else {
            citations.len()
        };
        debug!(
            question,
            retrieved = retrieved_count,
            admitted = citations.len(),
            counted,
            "evidence gate"
        );

        if citations.is_empty() {
            RetrievalResult::no_evidence()
        } else if counted < policy.min_citations() {
            RetrievalResult::inconclusive(citations, INSUFFICIENT_EVIDENCE)
        } else {
            RetrievalResult::ok(citations)
        }
    }
}

#[async_trait]
impl EvidenceSource for EvidenceGate {
    async fn answer(
        &self,
        question: &str,
        _jurisdiction: Jurisdiction,
        policy: &Policy,
    ) -> Outcome<RetrievalResult> {
        Outcome::Success(EvidenceGate::answer(self, question, policy).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cite, retriever};
    use lexdomus_core::RetrievalStatus;

    fn policy(min_citations: usize, require_pinpoint: bool) -> Policy {
        let mut p = Policy::default();
        p.rag.thresholds.min_citations = min_citations;
        p.rag.thresholds.require_pinpoint = require_pinpoint;
        p
    }

    #[tokio::test]
    async fn empty_corpus_is_no_evidence() {
        let gate = EvidenceGate::from_retriever(retriever(vec![]));
        let r = gate.answer("derechos morales", &policy(2, false)).await;
        assert_eq!(r.status, RetrievalStatus::NoEvidence);
        assert!(r.citations.is_empty());
    }

    #[tokio::test]
    async fn below_minimum_is_inconclusive_and_keeps_citations() {
        let gate = EvidenceGate::from_retriever(retriever(vec![cite(
            "lpi14",
            "BOE",
            "LPI art. 14",
        )]));
        let r = gate.answer("derechos morales", &policy(2, false)).await;
        assert_eq!(r.status, RetrievalStatus::Inconclusive);
        assert_eq!(r.citations.len(), 1);
        assert_eq!(r.missing_reason.as_deref(), Some(INSUFFICIENT_EVIDENCE));
    }

    #[tokio::test]
    async fn at_minimum_is_ok_with_full_list() {
        let gate = EvidenceGate::from_retriever(retriever(vec![
            cite("lpi14", "BOE", "LPI art. 14"),
            cite("berne", "WIPO/OMPI", "Berna art. 6bis"),
            cite("dir", "EUR-Lex", "Directiva 2001/29/CE"),
        ]));
        let r = gate.answer("derechos morales", &policy(2, false)).await;
        assert_eq!(r.status, RetrievalStatus::Ok);
        assert_eq!(r.citations.len(), 3);
    }

    #[tokio::test]
    async fn pinpoint_is_resolved_from_ref_label() {
        let mut stale = cite("dir", "EUR-Lex", "Directiva 2001/29/CE");
        stale.pinpoint = true;
        let gate = EvidenceGate::from_retriever(retriever(vec![
            cite("lpi14", "BOE", "LPI art. 14"),
            stale,
        ]));
        let r = gate.answer("derechos morales", &policy(1, false)).await;
        let pin = |id: &str| r.citations.iter().find(|c| c.doc_id == id).unwrap().pinpoint;
        assert!(pin("lpi14"));
        assert!(!pin("dir"));
    }

    #[tokio::test]
    async fn require_pinpoint_counts_only_pinpoints() {
        let gate = EvidenceGate::from_retriever(retriever(vec![
            cite("lpi14", "BOE", "LPI art. 14"),
            cite("dir", "EUR-Lex", "Directiva 2001/29/CE"),
        ]));
        let r = gate.answer("derechos morales", &policy(2, true)).await;
        assert_eq!(r.status, RetrievalStatus::Inconclusive);
        assert_eq!(r.citations.len(), 2);
    }

    #[tokio::test]
    async fn inadmissible_sources_are_dropped_before_counting() {
        let gate = EvidenceGate::from_retriever(retriever(vec![
            cite("lpi14", "BOE", "LPI art. 14"),
            cite("blog", "Blog jurídico", "art. 14"),
        ]));
        let r = gate.answer("derechos morales", &policy(2, false)).await;
        assert_eq!(r.status, RetrievalStatus::Inconclusive);
        assert_eq!(r.citations[0].doc_id, "lpi14");
    }

    #[tokio::test]
    async fn k_is_raised_to_min_citations() {
        let chunks = (0..5)
            .map(|i| cite(&format!("c{i}"), "BOE", &format!("LPI art. {i}")))
            .collect();
        let gate = EvidenceGate::from_retriever(retriever(chunks));
        let mut p = policy(4, false);
        p.rag.retrieval.top_k = 1;
        let r = gate.answer("derechos morales", &p).await;
        assert_eq!(r.status, RetrievalStatus::Ok);
        assert_eq!(r.citations.len(), 4);
    }
}

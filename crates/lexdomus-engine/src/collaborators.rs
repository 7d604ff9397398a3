//! Interfaces for the swappable stages of an analysis, and the null adapters
//! that stand in when a stage is absent or fails.
//!
//! Each stage has one canonical signature and reports through [`Outcome`]; the
//! pipeline never needs to probe how a collaborator wants to be called.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use async_trait::async_trait;
use lexdomus_core::{
    DraftingInput, EeeScore, EvidenceSummary, Flag, InquiryNode, Jurisdiction, NodeEvidence,
    Opinion, Policy, RetrievalResult,
};

/// Result of invoking a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// The collaborator could not run (missing model, index, backend).
    Unavailable(String),
    /// The collaborator ran but produced something unusable.
    Invalid(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Run a collaborator call, turning a panic into `Unavailable`.
    pub fn catching(call: impl FnOnce() -> Self) -> Self {
        catch_unwind(AssertUnwindSafe(call))
            .unwrap_or_else(|payload| Self::Unavailable(panic_message(payload.as_ref())))
    }

    /// The success value, or the null adapter's value with a warning naming
    /// the stage.
    pub fn or_null(self, stage: &'static str, null: impl FnOnce() -> T) -> T {
        match self {
            Self::Success(v) => v,
            Self::Unavailable(reason) => {
                tracing::warn!(stage, %reason, "collaborator unavailable, using null adapter");
                null()
            }
            Self::Invalid(reason) => {
                tracing::warn!(stage, %reason, "collaborator returned invalid output, using null adapter");
                null()
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    format!("panicked: {detail}")
}

/// Splits a clause into the questions that each need their own evidence.
pub trait Decomposer: Send + Sync {
    fn decompose(&self, clause: &str, jurisdiction: Jurisdiction) -> Outcome<Vec<InquiryNode>>;
}

/// Source-required answering for one question.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn answer(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        policy: &Policy,
    ) -> Outcome<RetrievalResult>;
}

pub trait FlagDetector: Send + Sync {
    fn detect(&self, clause: &str, jurisdiction: Jurisdiction) -> Outcome<Vec<Flag>>;
}

/// Everything a scorer may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub per_node: &'a [NodeEvidence],
    pub flags: &'a [Flag],
    pub evidence: &'a EvidenceSummary,
    pub alternative: Option<&'a str>,
}

impl ScoringInput<'_> {
    /// Whether any reasonable alternative exists: a node-level fallback or a
    /// proposed clause.
    pub fn has_alternative(&self) -> bool {
        self.per_node.iter().any(|n| n.node.has_alternative())
            || self.alternative.is_some_and(|a| !a.trim().is_empty())
    }
}

pub trait EeeScorer: Send + Sync {
    fn score(&self, input: ScoringInput<'_>) -> Outcome<EeeScore>;
}

/// Produces a counter-proposal clause. An empty string means none.
pub trait AlternativeProposer: Send + Sync {
    fn propose(&self, clause: &str, jurisdiction: Jurisdiction, flags: &[Flag]) -> Outcome<String>;
}

#[async_trait]
pub trait OpinionDrafter: Send + Sync {
    async fn draft(&self, input: DraftingInput<'_>) -> Outcome<Opinion>;
}

// ── Null adapters ──

/// One catch-all node.
pub struct NullDecomposer;

impl Decomposer for NullDecomposer {
    fn decompose(&self, _clause: &str, _jurisdiction: Jurisdiction) -> Outcome<Vec<InquiryNode>> {
        Outcome::Success(vec![InquiryNode::generic()])
    }
}

/// Never finds evidence.
pub struct NullEvidence;

#[async_trait]
impl EvidenceSource for NullEvidence {
    async fn answer(
        &self,
        _question: &str,
        _jurisdiction: Jurisdiction,
        _policy: &Policy,
    ) -> Outcome<RetrievalResult> {
        Outcome::Success(RetrievalResult::no_evidence())
    }
}

pub struct NullFlags;

impl FlagDetector for NullFlags {
    fn detect(&self, _clause: &str, _jurisdiction: Jurisdiction) -> Outcome<Vec<Flag>> {
        Outcome::Success(Vec::new())
    }
}

pub struct NullScorer;

impl EeeScorer for NullScorer {
    fn score(&self, _input: ScoringInput<'_>) -> Outcome<EeeScore> {
        Outcome::Success(EeeScore::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_null_passes_success_through() {
        assert_eq!(Outcome::Success(3).or_null("test", || 0), 3);
    }

    #[test]
    fn or_null_replaces_failures() {
        assert_eq!(Outcome::<u8>::Unavailable("down".into()).or_null("test", || 7), 7);
        assert_eq!(Outcome::<u8>::Invalid("bad".into()).or_null("test", || 7), 7);
    }

    #[test]
    fn catching_turns_panics_into_unavailable() {
        assert_eq!(Outcome::catching(|| Outcome::Success(1)), Outcome::Success(1));
        let outcome = Outcome::<u8>::catching(|| panic!("index corrupted"));
        assert_eq!(outcome, Outcome::Unavailable("panicked: index corrupted".into()));
        let outcome = Outcome::<u8>::catching(|| panic!("{} nodes", 3));
        assert_eq!(outcome, Outcome::Unavailable("panicked: 3 nodes".into()));
    }

    #[test]
    fn null_decomposer_yields_generic_node() {
        let Outcome::Success(nodes) = NullDecomposer.decompose("x", Jurisdiction::Es) else {
            panic!("null decomposer must succeed");
        };
        assert_eq!(nodes, vec![InquiryNode::generic()]);
    }

    #[tokio::test]
    async fn null_evidence_is_no_evidence() {
        let Outcome::Success(r) = NullEvidence
            .answer("q", Jurisdiction::Es, &Policy::default())
            .await
        else {
            panic!("null evidence must succeed");
        };
        assert!(r.citations.is_empty());
        assert!(!r.is_ok());
    }

    #[test]
    fn alternative_from_node_or_clause() {
        let evidence = EvidenceSummary::from_nodes(&[]);
        let mut node = InquiryNode::generic();
        let per_node = vec![NodeEvidence {
            node: node.clone(),
            retrieval: RetrievalResult::no_evidence(),
        }];
        let input = ScoringInput {
            per_node: &per_node,
            flags: &[],
            evidence: &evidence,
            alternative: None,
        };
        assert!(!input.has_alternative());
        assert!(ScoringInput { alternative: Some("Licencia"), ..input }.has_alternative());
        assert!(!ScoringInput { alternative: Some("  "), ..input }.has_alternative());

        node.fallback_alternative = "Licencia no exclusiva".into();
        let per_node = vec![NodeEvidence {
            node,
            retrieval: RetrievalResult::no_evidence(),
        }];
        assert!(ScoringInput { per_node: &per_node, ..input }.has_alternative());
    }
}

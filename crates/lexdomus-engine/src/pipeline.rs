//! The analysis pipeline.
//!
//! `Decompose → Retrieve(node)* → DetectFlags → aggregate evidence →
//! Propose → Score → Gate → Assemble → Draft → Ledger`.
//!
//! Every stage is a trait object with a null adapter default. A stage that
//! reports `Unavailable`/`Invalid` or panics is replaced by its null adapter
//! for that call. The drafter is also bounded by the policy's drafting
//! timeout. Only malformed input (empty clause, unsupported jurisdiction)
//! reaches the caller as an error.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use lexdomus_core::{
    AnalysisRequest, AnalysisResult, CoreError, EeeScore, EvidenceSummary, InquiryNode, Jurisdiction, NodeEvidence, Opinion, Policy, RetrievalResult, RetrievalStatus,
};
use lexdomus_store::{Ledger, LedgerEntry, RetrievalContext};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::collaborators::{
    AlternativeProposer, Decomposer, EeeScorer, EvidenceSource, FlagDetector, NullDecomposer,
    NullEvidence, NullFlags, NullScorer, OpinionDrafter, Outcome, ScoringInput, panic_message,
};
use crate::drafting::{TemplateDecomposer, TemplateProposer};
use crate::eee::{HeuristicScorer, gate};
use crate::evidence::EvidenceGate;
use crate::flags::PatternFlagDetector;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] CoreError),
}

pub struct Pipeline {
    policy: Arc<Policy>,
    decomposer: Arc<dyn Decomposer>,
    evidence: Arc<dyn EvidenceSource>,
    flags: Arc<dyn FlagDetector>,
    scorer: Arc<dyn EeeScorer>,
    proposer: Option<Arc<dyn AlternativeProposer>>,
    drafter: Option<Arc<dyn OpinionDrafter>>,
    ledger: Option<Arc<Ledger>>,
}

impl Pipeline {
    /// A pipeline where every stage is its null adapter.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
            decomposer: Arc::new(NullDecomposer),
            evidence: Arc::new(NullEvidence),
            flags: Arc::new(NullFlags),
            scorer: Arc::new(NullScorer),
            proposer: None,
            drafter: None,
            ledger: None,
        }
    }

    /// Template decomposition, hybrid evidence gate, pattern flags, heuristic
    /// EEE scoring and the template counter-proposal.
    pub fn standard(policy: Policy, context: Arc<RetrievalContext>) -> Self {
        Self::new(policy)
            .with_decomposer(Arc::new(TemplateDecomposer))
            .with_evidence(Arc::new(EvidenceGate::new(context)))
            .with_flag_detector(Arc::new(PatternFlagDetector))
            .with_scorer(Arc::new(HeuristicScorer::default()))
            .with_proposer(Arc::new(TemplateProposer))
    }

    pub fn with_decomposer(mut self, decomposer: Arc<dyn Decomposer>) -> Self {
        self.decomposer = decomposer;
        self
    }

    pub fn with_evidence(mut self, evidence: Arc<dyn EvidenceSource>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_flag_detector(mut self, flags: Arc<dyn FlagDetector>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn EeeScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_proposer(mut self, proposer: Arc<dyn AlternativeProposer>) -> Self {
        self.proposer = Some(proposer);
        self
    }

    pub fn with_drafter(mut self, drafter: Arc<dyn OpinionDrafter>) -> Self {
        self.drafter = Some(drafter);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let jurisdiction = request.validate()?;
        let clause = request.clause.as_str();

        let nodes = match Outcome::catching(|| self.decomposer.decompose(clause, jurisdiction)) {
            Outcome::Success(nodes) if nodes.is_empty() => {
                Outcome::Invalid("decomposition produced no nodes".to_string())
            }
            other => other,
        }
        .or_null("decomposer", || vec![InquiryNode::generic()]);

        let per_node = self.retrieve_all(nodes, jurisdiction).await;

        let mut flags = Outcome::catching(|| self.flags.detect(clause, jurisdiction))
            .or_null("flag detector", Vec::new);
        flags.sort();
        flags.dedup();

        let evidence = EvidenceSummary::from_nodes(&per_node);

        let alternative_clause = self
            .proposer
            .as_ref()
            .map(|p| {
                Outcome::catching(|| p.propose(clause, jurisdiction, &flags))
                    .or_null("proposer", String::new)
            })
            .filter(|alt| !alt.trim().is_empty());

        let eee = Outcome::catching(|| {
            self.scorer.score(ScoringInput {
                per_node: &per_node,
                flags: &flags,
                evidence: &evidence,
                alternative: alternative_clause.as_deref(),
            })
        })
        .or_null("scorer", EeeScore::zero);

        let verdict = gate(&eee, evidence.citation_total, &self.policy);

        let mut result = AnalysisResult {
            clause: clause.to_string(),
            jurisdiction,
            per_node,
            flags,
            evidence,
            eee,
            gate: verdict,
            alternative_clause,
            opinion: None,
        };

        if let Some(drafter) = &self.drafter {
            result.opinion = self.draft(drafter.as_ref(), &result).await;
        }

        info!(
            jurisdiction = %jurisdiction,
            nodes = result.per_node.len(),
            evidence = result.evidence.status.as_str(),
            citations = result.evidence.citation_total,
            flags = result.flags.len(),
            gate = result.gate.status.as_str(),
            "analysis complete"
        );

        if let Some(ledger) = &self.ledger
            && let Err(e) = ledger.append(&LedgerEntry::from(&result))
        {
            warn!(error = %e, path = %ledger.path().display(), "ledger append failed");
        }

        Ok(result)
    }

    async fn draft(&self, drafter: &dyn OpinionDrafter, result: &AnalysisResult) -> Option<Opinion> {
        let limit = self.policy.drafting_timeout();
        let call = AssertUnwindSafe(drafter.draft(result.drafting_input())).catch_unwind();
        let outcome = match tokio::time::timeout(limit, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(payload)) => Outcome::Unavailable(panic_message(payload.as_ref())),
            Err(_) => {
                warn!(
                    timeout_ms = limit.as_millis() as u64,
                    "opinion drafting timed out, omitting opinion"
                );
                return None;
            }
        };
        match outcome {
            Outcome::Success(opinion) => Some(opinion),
            Outcome::Unavailable(reason) | Outcome::Invalid(reason) => {
                warn!(%reason, "opinion drafting failed, omitting opinion");
                None
            }
        }
    }

    /// Answer every node concurrently; results come back in node order.
    async fn retrieve_all(&self, nodes: Vec<InquiryNode>, jurisdiction: Jurisdiction) -> Vec<NodeEvidence> {
        let mut tasks = JoinSet::new();
        for (idx, node) in nodes.iter().enumerate() {
            let evidence = Arc::clone(&self.evidence);
            let policy = Arc::clone(&self.policy);
            let question = node.question.clone();
            tasks.spawn(async move {
                let outcome = evidence.answer(&question, jurisdiction, &policy).await;
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<RetrievalResult>> = vec![None; nodes.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    slots[idx] = Some(
                        check_retrieval(outcome).or_null("evidence source", RetrievalResult::no_evidence),
                    );
                }
                Err(e) => warn!(error = %e, "retrieval task failed, node gets no evidence"),
            }
        }

        nodes
            .into_iter()
            .zip(slots)
            .map(|(node, retrieval)| NodeEvidence {
                node,
                retrieval: retrieval.unwrap_or_else(RetrievalResult::no_evidence),
            })
            .collect()
    }
}

/// Reject results that break the status/citation invariants.
fn check_retrieval(outcome: Outcome<RetrievalResult>) -> Outcome<RetrievalResult> {
    match outcome {
        Outcome::Success(r) if r.status == RetrievalStatus::NoEvidence && !r.citations.is_empty() => {
            Outcome::Invalid("NO_EVIDENCE result carries citations".into())
        }
        Outcome::Success(r) if r.status != RetrievalStatus::NoEvidence && r.citations.is_empty() => {
            Outcome::Invalid(format!("{} result has no citations", r.status.as_str()))
        }
        other => other,
    }
}

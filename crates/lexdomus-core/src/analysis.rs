//! Analysis request/response types.

use serde::{Deserialize, Serialize};

use crate::{Candidate, CoreError, EeeScore, Flag, GateResult, InquiryNode, Jurisdiction};
use crate::{RetrievalResult, RetrievalStatus};

/// Inbound request as received from an API or CLI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub clause: String,
    pub jurisdiction: String,
}

impl AnalysisRequest {
    pub fn new(clause: impl Into<String>, jurisdiction: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            jurisdiction: jurisdiction.into(),
        }
    }

    /// Reject malformed input: an empty clause or an unknown jurisdiction.
    pub fn validate(&self) -> Result<Jurisdiction, CoreError> {
        if self.clause.trim().is_empty() {
            return Err(CoreError::EmptyClause);
        }
        self.jurisdiction.parse()
    }
}

/// A node together with the evidence retrieved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvidence {
    pub node: InquiryNode,
    pub retrieval: RetrievalResult,
}

/// Aggregate evidence picture across all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub status: RetrievalStatus,
    /// Citations held by nodes whose own status is `OK`.
    pub citation_total: usize,
    pub nodes_ok: usize,
}

impl EvidenceSummary {
    pub fn from_nodes(per_node: &[NodeEvidence]) -> Self {
        let mut citation_total = 0;
        let mut nodes_ok = 0;
        let mut any_citations = false;
        for item in per_node {
            let retrieval = &item.retrieval;
            any_citations |= !retrieval.citations.is_empty();
            if retrieval.is_ok() {
                nodes_ok += 1;
                citation_total += retrieval.citations.len();
            }
        }
        let status = if nodes_ok > 0 {
            RetrievalStatus::Ok
        } else if any_citations {
            RetrievalStatus::Inconclusive
        } else {
            RetrievalStatus::NoEvidence
        };
        Self {
            status,
            citation_total,
            nodes_ok,
        }
    }
}

/// A drafted opinion, produced by an optional external drafter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub analysis_md: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// The unit returned to callers and persisted to the audit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub clause: String,
    pub jurisdiction: Jurisdiction,
    pub per_node: Vec<NodeEvidence>,
    pub flags: Vec<Flag>,
    pub evidence: EvidenceSummary,
    #[serde(rename = "EEE")]
    pub eee: EeeScore,
    pub gate: GateResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opinion: Option<Opinion>,
}

impl AnalysisResult {
    pub fn nodes(&self) -> impl Iterator<Item = &InquiryNode> {
        self.per_node.iter().map(|n| &n.node)
    }

    /// Stable view for drafting layers.
    pub fn drafting_input(&self) -> DraftingInput<'_> {
        DraftingInput {
            clause: &self.clause,
            jurisdiction: self.jurisdiction,
            per_node: &self.per_node,
            flags: &self.flags,
        }
    }
}

/// What a drafter may read: the clause, per-node citations, and flags.
#[derive(Debug, Clone, Copy)]
pub struct DraftingInput<'a> {
    pub clause: &'a str,
    pub jurisdiction: Jurisdiction,
    pub per_node: &'a [NodeEvidence],
    pub flags: &'a [Flag],
}

impl<'a> DraftingInput<'a> {
    /// Citations per node, in node order.
    pub fn citations(&self) -> impl Iterator<Item = (&'a InquiryNode, &'a [Candidate])> {
        self.per_node
            .iter()
            .map(|n| (&n.node, n.retrieval.citations.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cite(id: &str, pinpoint: bool) -> Candidate {
        Candidate {
            doc_id: id.into(),
            source: "BOE".into(),
            jurisdiction: "ES".into(),
            title: "LPI".into(),
            family: String::new(),
            ref_label: String::new(),
            ref_url: String::new(),
            pinpoint,
            line_start: 0,
            line_end: 0,
            text: String::new(),
            personal_data: false,
        }
    }

    fn node_with(retrieval: RetrievalResult) -> NodeEvidence {
        NodeEvidence {
            node: InquiryNode::generic(),
            retrieval,
        }
    }

    #[test]
    fn validate_rejects_blank_clause() {
        let err = AnalysisRequest::new("   ", "ES").validate().unwrap_err();
        assert!(matches!(err, CoreError::EmptyClause));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn validate_rejects_unknown_jurisdiction() {
        let err = AnalysisRequest::new("cláusula", "XX").validate().unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn summary_counts_only_ok_nodes() {
        let per_node = vec![
            node_with(RetrievalResult::ok(vec![cite("a", true), cite("b", true)])),
            node_with(RetrievalResult::inconclusive(vec![cite("c", false)], "short")),
        ];
        let s = EvidenceSummary::from_nodes(&per_node);
        assert_eq!(s.status, RetrievalStatus::Ok);
        assert_eq!(s.citation_total, 2);
        assert_eq!(s.nodes_ok, 1);
    }

    #[test]
    fn summary_without_ok_nodes() {
        let inconclusive = vec![node_with(RetrievalResult::inconclusive(
            vec![cite("c", false)],
            "short",
        ))];
        assert_eq!(
            EvidenceSummary::from_nodes(&inconclusive).status,
            RetrievalStatus::Inconclusive
        );
        let empty = vec![node_with(RetrievalResult::no_evidence())];
        let s = EvidenceSummary::from_nodes(&empty);
        assert_eq!(s.status, RetrievalStatus::NoEvidence);
        assert_eq!(s.citation_total, 0);
    }
}

//! Trust / Justification / Proportionality scoring and the final gate.

use lexdomus_core::{EeeScore, GateResult, Policy};

use crate::collaborators::{EeeScorer, Outcome, ScoringInput};

/// Heuristic EEE scorer.
///
/// - T: `t_scale * nodes_with_pinpoint / nodes_with_citations`, or
///   `t_baseline` when no node produced a citation.
/// - J: `j_supported` when any citation is a pinpoint, else `j_unsupported`.
/// - P: `p_with_alternative` when an alternative exists, else `p_without_alternative`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicScorer {
    pub t_scale: f32,
    pub t_baseline: f32,
    pub j_supported: f32,
    pub j_unsupported: f32,
    pub p_with_alternative: f32,
    pub p_without_alternative: f32,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            t_scale: 5.0,
            t_baseline: 1.0,
            j_supported: 4.0,
            j_unsupported: 2.0,
            p_with_alternative: 4.0,
            p_without_alternative: 2.0,
        }
    }
}

impl HeuristicScorer {
    pub fn compute(&self, input: ScoringInput<'_>) -> EeeScore {
        let asserting = input
            .per_node
            .iter()
            .filter(|n| !n.retrieval.citations.is_empty())
            .count();
        let pinpointed = input
            .per_node
            .iter()
            .filter(|n| n.retrieval.has_pinpoint())
            .count();

        let t = if asserting == 0 {
            self.t_baseline
        } else {
            self.t_scale * pinpointed as f32 / asserting as f32
        };
        let j = if pinpointed > 0 {
            self.j_supported
        } else {
            self.j_unsupported
        };
        let p = if input.has_alternative() {
            self.p_with_alternative
        } else {
            self.p_without_alternative
        };
        EeeScore::new(t, j, p)
    }
}

impl EeeScorer for HeuristicScorer {
    fn score(&self, input: ScoringInput<'_>) -> Outcome<EeeScore> {
        let eee = self.compute(input);
        if [eee.t, eee.j, eee.p].iter().all(|v| v.is_finite()) {
            Outcome::Success(eee)
        } else {
            Outcome::Invalid(format!("non-finite EEE score {eee:?}"))
        }
    }
}

/// Label an analysis against the EEE thresholds and the citation minimum.
///
/// On failure the reason lists every shortfall.
pub fn gate(eee: &EeeScore, citation_total: usize, policy: &Policy) -> GateResult {
    let th = &policy.eee_gate;
    let min_citations = policy.min_citations();

    let mut shortfalls = Vec::new();
    for (axis, value, min) in [("T", eee.t, th.min_t), ("J", eee.j, th.min_j), ("P", eee.p, th.min_p)] {
        if value.is_nan() || value < min {
            shortfalls.push(format!("{axis} {value:.2} < {min:.2}"));
        }
    }
    if citation_total < min_citations {
        shortfalls.push(format!("citations {citation_total} < {min_citations}"));
    }

    if shortfalls.is_empty() {
        GateResult::pass()
    } else {
        GateResult::inconclusive(format!(
            "EEE/T or evidence insufficient: total citations={citation_total}, minimum={min_citations} ({})",
            shortfalls.join(", ")
        ))
    }
}

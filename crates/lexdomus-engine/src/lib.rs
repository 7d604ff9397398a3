//! Source-required analysis of copyright clauses.
//!
//! Every conclusion the engine reaches is backed by citations from an
//! admissible corpus, or it says so: nodes without enough evidence are
//! labelled `NO_EVIDENCE`/`NO_CONCLUYENTE` rather than answered.

pub mod collaborators;
pub mod drafting;
pub mod eee;
pub mod evidence;
pub mod filter;
pub mod flags;
mod pipeline;

#[cfg(test)]
mod testing;

pub use collaborators::{
    AlternativeProposer, Decomposer, EeeScorer, EvidenceSource, FlagDetector, OpinionDrafter,
    Outcome, ScoringInput,
};
pub use drafting::{TemplateDecomposer, TemplateProposer};
pub use eee::{HeuristicScorer, gate};
pub use evidence::{EvidenceGate, INSUFFICIENT_EVIDENCE};
pub use flags::{PatternFlagDetector, detect_flags};
pub use pipeline::{AnalysisError, Pipeline};

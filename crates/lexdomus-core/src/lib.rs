pub mod analysis;
pub mod candidate;
mod error;
pub mod inquiry;
pub mod model;
pub mod policy;
pub mod provision;
pub mod schema;
pub mod verdict;

pub use analysis::{
    AnalysisRequest, AnalysisResult, DraftingInput, EvidenceSummary, NodeEvidence, Opinion,
};
pub use candidate::{Candidate, RetrievalResult, RetrievalStatus};
pub use error::CoreError;
pub use inquiry::{InquiryNode, Jurisdiction};
pub use model::{RelevanceModel, TextEncoder};
pub use policy::{Policy, RetrievalSettings};
pub use provision::{Provision, is_pinpoint, resolve_ref_label};
pub use schema::corpus;
pub use verdict::{EeeScore, Flag, GateResult, GateStatus};

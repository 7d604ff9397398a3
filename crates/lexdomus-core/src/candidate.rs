//! Citable corpus chunks and the per-question retrieval verdict.

use serde::{Deserialize, Serialize};

/// One citable chunk of a source document.
///
/// This is both the on-disk corpus record (one JSON object per line in
/// `chunks.jsonl`) and the citation handed to callers once retrieval has
/// selected it. Ingestion writes `ref`/`url`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub doc_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub family: String,
    #[serde(default, alias = "ref")]
    pub ref_label: String,
    #[serde(default, alias = "url")]
    pub ref_url: String,
    #[serde(default)]
    pub pinpoint: bool,
    #[serde(default)]
    pub line_start: u64,
    #[serde(default)]
    pub line_end: u64,
    #[serde(default)]
    pub text: String,
    /// Declares biometric or other personal data inside `text`.
    #[serde(default, alias = "biometric")]
    pub personal_data: bool,
}

impl Candidate {
    /// Short human label: `title · source/jurisdiction ref`.
    pub fn cite_label(&self) -> String {
        let mut label = format!("{} · {}/{}", self.title, self.source, self.jurisdiction);
        if !self.ref_label.is_empty() {
            label.push(' ');
            label.push_str(&self.ref_label);
        }
        label
    }
}

/// Outcome of source-required answering for a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO_EVIDENCE")]
    NoEvidence,
    #[serde(rename = "NO_CONCLUYENTE")]
    Inconclusive,
}

impl RetrievalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoEvidence => "NO_EVIDENCE",
            Self::Inconclusive => "NO_CONCLUYENTE",
        }
    }
}

/// Evidence gathered for one inquiry node.
///
/// Constructors uphold the invariants: `NoEvidence` never carries citations,
/// `Ok` always carries at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub status: RetrievalStatus,
    pub citations: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_reason: Option<String>,
}

impl RetrievalResult {
    pub fn no_evidence() -> Self {
        Self {
            status: RetrievalStatus::NoEvidence,
            citations: Vec::new(),
            missing_reason: Some("no admissible citations".into()),
        }
    }

    /// Citations exist but fall short of the policy minimum.
    ///
    /// An empty list degrades to [`RetrievalResult::no_evidence`].
    pub fn inconclusive(citations: Vec<Candidate>, reason: impl Into<String>) -> Self {
        if citations.is_empty() {
            return Self::no_evidence();
        }
        Self {
            status: RetrievalStatus::Inconclusive,
            citations,
            missing_reason: Some(reason.into()),
        }
    }

    /// Sufficient evidence. An empty list degrades to `no_evidence`.
    pub fn ok(citations: Vec<Candidate>) -> Self {
        if citations.is_empty() {
            return Self::no_evidence();
        }
        Self {
            status: RetrievalStatus::Ok,
            citations,
            missing_reason: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RetrievalStatus::Ok
    }

    pub fn has_pinpoint(&self) -> bool {
        self.citations.iter().any(|c| c.pinpoint)
    }
}

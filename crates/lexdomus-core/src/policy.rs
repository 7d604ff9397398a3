//! Admissibility policy: allowed sources, privacy, retrieval, drafting and
//! gate thresholds.
//!
//! The policy is loaded once from YAML (`policies/policy.yaml`) and then
//! shared read-only. Every key is optional; anything missing takes the
//! documented default, and a missing file yields [`Policy::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::CoreError;

/// Sources admitted when no policy file is present.
pub const DEFAULT_ALLOWED_SOURCES: &[&str] = &["BOE", "EUR-Lex", "WIPO", "USC"];

/// Bounds for the reranked prefix of the fused ranking.
pub const RERANK_DEPTH_RANGE: (usize, usize) = (15, 32);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub sources: SourcePolicy,
    pub privacy: PrivacyPolicy,
    pub rag: RagPolicy,
    pub drafting: DraftingPolicy,
    pub eee_gate: EeeThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePolicy {
    /// Empty means every source is admissible.
    pub allowed: Vec<String>,
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPolicy {
    pub block_biometrics: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            block_biometrics: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPolicy {
    pub retrieval: RetrievalSettings,
    pub thresholds: CitationThresholds,
}

/// Retrieval depth plus the hybrid ranking knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Lexical weight in the linear fusion; vector weight is `1 - alpha`.
    pub alpha: f32,
    pub rerank_depth: usize,
    pub rerank_timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            alpha: 0.7,
            rerank_depth: 24,
            rerank_timeout_ms: 2000,
        }
    }
}

impl RetrievalSettings {
    pub fn alpha(&self) -> f32 {
        if self.alpha.is_finite() {
            self.alpha.clamp(0.0, 1.0)
        } else {
            0.7
        }
    }

    pub fn rerank_depth(&self) -> usize {
        let (lo, hi) = RERANK_DEPTH_RANGE;
        self.rerank_depth.clamp(lo, hi)
    }

    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationThresholds {
    pub min_citations: usize,
    /// Count only pinpoint citations towards `min_citations`.
    pub require_pinpoint: bool,
}

impl Default for CitationThresholds {
    fn default() -> Self {
        Self {
            min_citations: 2,
            require_pinpoint: false,
        }
    }
}

/// Bounds on the optional opinion drafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingPolicy {
    pub timeout_ms: u64,
}

impl Default for DraftingPolicy {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EeeThresholds {
    #[serde(rename = "min_T")]
    pub min_t: f32,
    #[serde(rename = "min_J")]
    pub min_j: f32,
    #[serde(rename = "min_P")]
    pub min_p: f32,
}

impl Default for EeeThresholds {
    fn default() -> Self {
        Self {
            min_t: 4.5,
            min_j: 4.0,
            min_p: 4.0,
        }
    }
}

impl Policy {
    /// Parse a policy from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load a policy file. A missing file is not an error: the default
    /// policy is returned and the gap is logged.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            warn!(path = %path.display(), "policy file not found, using default policy");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let policy = Self::from_yaml_str(&text).map_err(|source| CoreError::PolicyParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            sources = policy.sources.allowed.len(),
            top_k = policy.rag.retrieval.top_k,
            min_citations = policy.rag.thresholds.min_citations,
            "loaded policy"
        );
        Ok(policy)
    }

    /// Like [`Policy::load`], but any failure degrades to the default policy.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(error = %e, "unreadable policy, using default policy");
                Self::default()
            }
        }
    }

    pub fn allowed_sources(&self) -> &[String] {
        &self.sources.allowed
    }

    pub fn top_k(&self) -> usize {
        self.rag.retrieval.top_k
    }

    pub fn min_citations(&self) -> usize {
        self.rag.thresholds.min_citations
    }

    pub fn require_pinpoint(&self) -> bool {
        self.rag.thresholds.require_pinpoint
    }

    pub fn drafting_timeout(&self) -> Duration {
        Duration::from_millis(self.drafting.timeout_ms)
    }
}

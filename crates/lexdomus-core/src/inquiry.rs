//! Inquiry nodes and the jurisdictions an analysis may target.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// One decomposed sub-question of a clause.
///
/// Each node needs its own evidence; nodes are read-only once decomposition
/// has produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryNode {
    pub question: String,
    /// Structural anchor the question is expected to resolve against,
    /// e.g. `LPI art. 14; Berna art. 6bis`.
    #[serde(default)]
    pub structural_hint: String,
    #[serde(default)]
    pub principle: String,
    #[serde(default)]
    pub required_evidence: BTreeSet<String>,
    #[serde(default)]
    pub fallback_alternative: String,
}

impl InquiryNode {
    /// The catch-all node used when no decomposition is available.
    pub fn generic() -> Self {
        Self {
            question: "Validity and scope of the clause".into(),
            structural_hint: String::new(),
            principle: String::new(),
            required_evidence: BTreeSet::new(),
            fallback_alternative: String::new(),
        }
    }

    pub fn has_alternative(&self) -> bool {
        !self.fallback_alternative.trim().is_empty()
    }
}

/// Jurisdictions with a curated corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Jurisdiction {
    #[serde(rename = "ES")]
    Es,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "INT")]
    Int,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 4] = [Self::Es, Self::Eu, Self::Us, Self::Int];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "ES",
            Self::Eu => "EU",
            Self::Us => "US",
            Self::Int => "INT",
        }
    }

    /// Territory wording used by drafting templates.
    pub fn territory(&self) -> &'static str {
        match self {
            Self::Es => "España",
            Self::Eu => "UE",
            Self::Us => "Estados Unidos",
            Self::Int => "mundial",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Jurisdiction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ES" => Ok(Self::Es),
            "EU" | "UE" => Ok(Self::Eu),
            "US" => Ok(Self::Us),
            "INT" => Ok(Self::Int),
            _ => Err(CoreError::UnsupportedJurisdiction(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("es".parse::<Jurisdiction>().unwrap(), Jurisdiction::Es);
        assert_eq!(" INT ".parse::<Jurisdiction>().unwrap(), Jurisdiction::Int);
    }

    #[test]
    fn unknown_code_rejected() {
        let err = "FR".parse::<Jurisdiction>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedJurisdiction(code) if code == "FR"));
    }

    #[test]
    fn display_roundtrips() {
        for j in Jurisdiction::ALL {
            assert_eq!(j.to_string().parse::<Jurisdiction>().unwrap(), j);
        }
    }

    #[test]
    fn generic_node_has_no_alternative() {
        assert!(!InquiryNode::generic().has_alternative());
    }
}

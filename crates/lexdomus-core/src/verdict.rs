//! Risk flags, EEE scores, and the final admissibility verdict.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of clause risk tags.
///
/// Variants are declared in label order so that the derived `Ord` sorts a
/// flag set alphabetically by its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "ambiguous territoriality")]
    AmbiguousTerritoriality,
    #[serde(rename = "general moral-rights waiver")]
    GeneralMoralRightsWaiver,
    #[serde(rename = "generic exploitation modalities")]
    GenericModalities,
    #[serde(rename = "generic future-works assignment")]
    GenericFutureWorks,
}

impl Flag {
    pub const ALL: [Flag; 4] = [
        Self::AmbiguousTerritoriality,
        Self::GeneralMoralRightsWaiver,
        Self::GenericModalities,
        Self::GenericFutureWorks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmbiguousTerritoriality => "ambiguous territoriality",
            Self::GeneralMoralRightsWaiver => "general moral-rights waiver",
            Self::GenericModalities => "generic exploitation modalities",
            Self::GenericFutureWorks => "generic future-works assignment",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traceability, Justification, Proportionality; each nominally in `[0, 5]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EeeScore {
    #[serde(rename = "T")]
    pub t: f32,
    #[serde(rename = "J")]
    pub j: f32,
    #[serde(rename = "P")]
    pub p: f32,
}

impl EeeScore {
    pub fn new(t: f32, j: f32, p: f32) -> Self {
        Self { t, j, p }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO_CONCLUYENTE")]
    Inconclusive,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Inconclusive => "NO_CONCLUYENTE",
        }
    }
}

/// Final label for a whole analysis. It never alters the analysis itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub status: GateStatus,
    pub reason: Option<String>,
}

impl GateResult {
    pub fn pass() -> Self {
        Self {
            status: GateStatus::Ok,
            reason: None,
        }
    }

    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self {
            status: GateStatus::Inconclusive,
            reason: Some(reason.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == GateStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn flag_order_follows_labels() {
        let mut labels: Vec<&str> = Flag::ALL.iter().map(|f| f.as_str()).collect();
        labels.sort();
        let ordered: Vec<&str> = Flag::ALL
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .iter()
            .map(|f| f.as_str())
            .collect();
        assert_eq!(labels, ordered);
    }

    #[test]
    fn flag_serializes_as_label() {
        let json = serde_json::to_string(&Flag::GeneralMoralRightsWaiver).unwrap();
        assert_eq!(json, "\"general moral-rights waiver\"");
    }

    #[test]
    fn eee_uses_single_letter_keys() {
        let json = serde_json::to_string(&EeeScore::new(2.5, 4.0, 2.0)).unwrap();
        assert_eq!(json, r#"{"T":2.5,"J":4.0,"P":2.0}"#);
    }

    #[test]
    fn gate_result_wire_shape() {
        let json = serde_json::to_string(&GateResult::pass()).unwrap();
        assert_eq!(json, r#"{"status":"OK","reason":null}"#);
    }
}

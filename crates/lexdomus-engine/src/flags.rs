//! Pattern-based risk flags over raw clause text.
//!
//! Independent of retrieval: the same clause and jurisdiction always yield
//! the same sorted, deduplicated flag list.

use std::sync::LazyLock;

use lexdomus_core::{Flag, Jurisdiction};
use regex::Regex;

use crate::collaborators::{FlagDetector, Outcome};

macro_rules! flag_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── General moral-rights waiver ────────────────────────────────────────────
flag_pattern!(
    RE_WAIVER_ES,
    r"(?i)renunci[ae]\s+a\s+todos?\s+sus\s+derechos\s+morales"
);
flag_pattern!(RE_WAIVER_EN, r"(?i)waiv(e|er).*(moral rights)");

// ── Ambiguous territoriality ───────────────────────────────────────────────
flag_pattern!(RE_WORLDWIDE, r"(?i)\bworldwide\b");
flag_pattern!(
    RE_MAX_TERM_ANY_COUNTRY,
    r"(?i)duración máxima permitida en cualquier país"
);
flag_pattern!(RE_ANY_COUNTRY, r"(?i)en\s+cualquier\s+país");

// ── Generic exploitation modalities ────────────────────────────────────────
flag_pattern!(
    RE_ANY_MEDIA_ES,
    r"(?i)cualquier\s+soporte\s+conocido\s+o\s+por\s+conocerse"
);
flag_pattern!(
    RE_ANY_MEDIA_EN,
    r"(?i)any\s+media\s+now\s+known\s+or\s+hereafter\s+devised"
);

// ── Generic future-works assignment ────────────────────────────────────────
flag_pattern!(RE_FUTURE_WORKS_ES, r"(?i)obras?\s+futuras?\s+del\s+autor");
flag_pattern!(RE_FUTURE_WORKS_EN, r"(?i)future\s+works");

static PATTERNS: &[(Flag, &LazyLock<Option<Regex>>)] = &[
    (Flag::GeneralMoralRightsWaiver, &RE_WAIVER_ES),
    (Flag::GeneralMoralRightsWaiver, &RE_WAIVER_EN),
    (Flag::AmbiguousTerritoriality, &RE_WORLDWIDE),
    (Flag::AmbiguousTerritoriality, &RE_MAX_TERM_ANY_COUNTRY),
    (Flag::AmbiguousTerritoriality, &RE_ANY_COUNTRY),
    (Flag::GenericModalities, &RE_ANY_MEDIA_ES),
    (Flag::GenericModalities, &RE_ANY_MEDIA_EN),
    (Flag::GenericFutureWorks, &RE_FUTURE_WORKS_ES),
    (Flag::GenericFutureWorks, &RE_FUTURE_WORKS_EN),
];

// Qualifiers that make a Spanish waiver partial rather than general.
// Whole words only: "ilimitada" and "unlimited" do not qualify.
flag_pattern!(
    RE_WAIVER_QUALIFIER,
    r"(?i)\b(parcial|limitada|partial|limited)\b"
);

pub fn detect_flags(clause: &str, jurisdiction: Jurisdiction) -> Vec<Flag> {
    let text = clause.to_lowercase();
    let mut found: Vec<Flag> = PATTERNS
        .iter()
        .filter(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(&text)))
        .map(|(flag, _)| *flag)
        .collect();

    if jurisdiction == Jurisdiction::Es
        && text.contains("renuncia")
        && text.contains("morales")
        && !RE_WAIVER_QUALIFIER
            .as_ref()
            .is_some_and(|re| re.is_match(&text))
    {
        found.push(Flag::GeneralMoralRightsWaiver);
    }

    found.sort();
    found.dedup();
    found
}

/// [`FlagDetector`] over the built-in pattern table.
pub struct PatternFlagDetector;

impl FlagDetector for PatternFlagDetector {
    fn detect(&self, clause: &str, jurisdiction: Jurisdiction) -> Outcome<Vec<Flag>> {
        Outcome::Success(detect_flags(clause, jurisdiction))
    }
}

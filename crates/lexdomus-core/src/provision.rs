//! Pinpoint resolution for citation reference labels.
//!
//! A reference label is the free-text anchor ingestion stores with a chunk,
//! e.g. `LPI art. 14`, `Berna art. 6bis`, `17 U.S.C. §106` or a bare
//! document title such as `Directiva 2001/29/CE`. A label is a *pinpoint*
//! when it names a specific structural unit (article, section, paragraph,
//! annex) rather than the whole document.
//!
//! # Numbering conventions
//!
//! - Plain numeric: art. 1, art. 2, ..., art. 10
//! - Letter suffix (amendment insertion): s.3A between s.3 and s.4
//! - Latin suffix: art. 6bis, art. 6ter sort as 6A, 6B
//! - Z-prefix (pre-insertion): s.3ZA between s.3 and s.3A

use std::cmp::Ordering;
use std::fmt;

/// Structural unit kinds recognised in reference labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    Article,
    Section,
    Paragraph,
    Annex,
}

impl Unit {
    pub fn abbrev(&self) -> &'static str {
        match self {
            Self::Article => "art.",
            Self::Section => "§",
            Self::Paragraph => "para.",
            Self::Annex => "annex",
        }
    }
}

/// Longest markers first so `artículo` wins over `art`.
const MARKERS: &[(&str, Unit)] = &[
    ("artículo", Unit::Article),
    ("articulo", Unit::Article),
    ("article", Unit::Article),
    ("arts.", Unit::Article),
    ("art.", Unit::Article),
    ("art ", Unit::Article),
    ("section", Unit::Section),
    ("sec.", Unit::Section),
    ("s.", Unit::Section),
    ("§§", Unit::Section),
    ("§", Unit::Section),
    ("apartado", Unit::Paragraph),
    ("paragraph", Unit::Paragraph),
    ("para.", Unit::Paragraph),
    ("anexo", Unit::Annex),
    ("annex", Unit::Annex),
    ("schedule", Unit::Annex),
    ("sch.", Unit::Annex),
];

const LATIN_SUFFIXES: &[&str] = &["bis", "ter", "quater", "quinquies", "sexies"];

/// A resolved structural unit, e.g. article `6bis`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provision {
    pub unit: Unit,
    /// Number as written, lower-cased (`14`, `6bis`, `106a`).
    pub number: String,
}

impl Provision {
    /// Sortable key: unit, then the normalised provision number.
    pub fn sort_key(&self) -> String {
        format!("{:?}~{}", self.unit, normalize_provision(&latin_to_letter(&self.number)))
    }
}

impl Ord for Provision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.number.cmp(&other.number))
    }
}

impl PartialOrd for Provision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Provision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Section => write!(f, "§{}", self.number),
            unit => write!(f, "{} {}", unit.abbrev(), self.number),
        }
    }
}

/// Resolve a reference label to its first structural unit.
///
/// Returns `None` for document-level references (no unit marker followed
/// by a number).
pub fn resolve_ref_label(label: &str) -> Option<Provision> {
    let lower = label.to_lowercase();
    for (i, _) in lower.char_indices() {
        let rest = &lower[i..];
        for &(marker, unit) in MARKERS {
            if !rest.starts_with(marker) || !at_word_start(&lower, i, marker) {
                continue;
            }
            if let Some(number) = parse_number(&rest[marker.len()..]) {
                return Some(Provision { unit, number });
            }
        }
    }
    None
}

/// Whether a label pinpoints a structural unit.
pub fn is_pinpoint(label: &str) -> bool {
    resolve_ref_label(label).is_some()
}

/// Alphabetic markers must not start mid-word (`parts.` is not `arts.`).
fn at_word_start(text: &str, idx: usize, marker: &str) -> bool {
    if !marker.starts_with(|c: char| c.is_alphabetic()) {
        return true;
    }
    text[..idx]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric())
}

/// Parse `[ .]*<digits><letters>` at the start of `s`.
fn parse_number(s: &str) -> Option<String> {
    let s = s.trim_start_matches(|c: char| c == '.' || c.is_whitespace());
    let digit_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if digit_end == 0 {
        return None;
    }
    let suffix_end = s[digit_end..]
        .char_indices()
        .find(|(_, c)| !c.is_ascii_lowercase())
        .map(|(i, _)| digit_end + i)
        .unwrap_or(s.len());
    Some(s[..suffix_end].to_string())
}

/// Map Latin insertion suffixes onto letters: `6bis` → `6A`, `6ter` → `6B`.
fn latin_to_letter(number: &str) -> String {
    let digit_end = number
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(number.len());
    let (digits, suffix) = number.split_at(digit_end);
    match LATIN_SUFFIXES.iter().position(|s| *s == suffix) {
        Some(pos) => format!("{digits}{}", (b'A' + pos as u8) as char),
        None => number.to_string(),
    }
}

/// Normalise a provision number into a lexicographically-sortable string.
///
/// Input: bare number like "3", "3A", "41ZA", "19DZA"
/// Output: "003.000.000", "003.010.000", "041.001.000", "019.040.001"
///
/// 1. Extract leading ASCII digits → base number (zero-padded to 3 digits)
/// 2. Parse remaining uppercase letters into up to 2 suffix groups:
///    - Z-prefix group: ZA=001, ZB=002, ..., ZZ=026 (sorts before plain letters)
///    - Plain letter: A=010, B=020, ..., Z=260
/// 3. Pad to exactly 3 segments with "000"
pub fn normalize_provision(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return "000.000.000".to_string();
    }

    let upper = s.to_ascii_uppercase();
    let bytes = upper.as_bytes();

    let digit_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    let base: u32 = if digit_end > 0 {
        upper[..digit_end].parse().unwrap_or(0)
    } else {
        0
    };

    let suffix = &bytes[digit_end..];
    let mut segments: Vec<u32> = vec![base];
    let mut i = 0;

    while i < suffix.len() && segments.len() < 3 {
        if suffix[i] == b'Z' && i + 1 < suffix.len() && suffix[i + 1].is_ascii_uppercase() {
            segments.push((suffix[i + 1] - b'A') as u32 + 1);
            i += 2;
        } else if suffix[i].is_ascii_uppercase() {
            segments.push(((suffix[i] - b'A') as u32 + 1) * 10);
            i += 1;
        } else {
            break;
        }
    }

    while segments.len() < 3 {
        segments.push(0);
    }

    format!("{:03}.{:03}.{:03}", segments[0], segments[1], segments[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(label: &str) -> (Unit, String) {
        let p = resolve_ref_label(label).unwrap_or_else(|| panic!("{label:?} did not resolve"));
        (p.unit, p.number)
    }

    #[test]
    fn spanish_article_labels() {
        assert_eq!(resolved("LPI art. 14"), (Unit::Article, "14".into()));
        assert_eq!(resolved("LPI art. 17-23"), (Unit::Article, "17".into()));
        assert_eq!(resolved("Artículo 43"), (Unit::Article, "43".into()));
    }

    #[test]
    fn berne_latin_suffix() {
        assert_eq!(resolved("Berna art. 6bis"), (Unit::Article, "6bis".into()));
    }

    #[test]
    fn us_code_section() {
        assert_eq!(resolved("17 U.S.C. §106"), (Unit::Section, "106".into()));
        assert_eq!(resolved("17 U.S.C. § 106A"), (Unit::Section, "106a".into()));
    }

    #[test]
    fn first_unit_wins() {
        assert_eq!(
            resolved("LPI art. 14; Berna art. 6bis"),
            (Unit::Article, "14".into())
        );
    }

    #[test]
    fn document_level_labels_do_not_resolve() {
        assert!(!is_pinpoint(""));
        assert!(!is_pinpoint("LPI"));
        assert!(!is_pinpoint("Directiva 2001/29/CE (InfoSoc)"));
        assert!(!is_pinpoint("Convenio de Berna, parts. generales"));
    }

    #[test]
    fn marker_without_number_does_not_resolve() {
        assert!(!is_pinpoint("see the article on moral rights"));
    }

    #[test]
    fn latin_suffixes_sort_between_numbers() {
        let p = |n: &str| Provision {
            unit: Unit::Article,
            number: n.into(),
        };
        let mut v = vec![p("7"), p("6ter"), p("6"), p("6bis")];
        v.sort();
        let numbers: Vec<&str> = v.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, ["6", "6bis", "6ter", "7"]);
    }

    #[test]
    fn display_forms() {
        assert_eq!(resolve_ref_label("LPI art. 14").unwrap().to_string(), "art. 14");
        assert_eq!(resolve_ref_label("17 U.S.C. §106").unwrap().to_string(), "§106");
    }

    #[test]
    fn normalize_exact_values() {
        assert_eq!(normalize_provision("3"), "003.000.000");
        assert_eq!(normalize_provision("3ZA"), "003.001.000");
        assert_eq!(normalize_provision("3A"), "003.010.000");
        assert_eq!(normalize_provision("3AB"), "003.010.020");
        assert_eq!(normalize_provision("19DZA"), "019.040.001");
        assert_eq!(normalize_provision(""), "000.000.000");
    }

    #[test]
    fn normalize_orders_insertions() {
        let inputs = ["3", "3ZA", "3ZB", "3A", "3B", "4"];
        let keys: Vec<String> = inputs.iter().map(|s| normalize_provision(s)).collect();
        for w in keys.windows(2) {
            assert!(w[0] < w[1], "{} !< {}", w[0], w[1]);
        }
    }
}

//! Admissibility of retrieved candidates under a [`Policy`].

use lexdomus_core::{Candidate, Policy};

/// Leading identifier token of a source name, lower-cased.
///
/// `"WIPO/OMPI"` → `"wipo"`, `"USC (Cornell/LII)"` → `"usc"`,
/// `"EUR-Lex"` → `"eur-lex"`.
pub fn normalize_source(source: &str) -> String {
    source
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether a candidate may be cited under `policy`.
pub fn admit(candidate: &Candidate, policy: &Policy) -> bool {
    let allowed = policy.allowed_sources();
    if !allowed.is_empty() {
        let source = normalize_source(&candidate.source);
        if source.is_empty() || !allowed.iter().any(|a| normalize_source(a) == source) {
            return false;
        }
    }
    !(policy.privacy.block_biometrics && candidate.personal_data)
}

/// Keep the admissible candidates, in order.
pub fn filter(candidates: Vec<Candidate>, policy: &Policy) -> Vec<Candidate> {
    candidates.into_iter().filter(|c| admit(c, policy)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::cite;

    #[test]
    fn source_names_normalize_to_leading_token() {
        assert_eq!(normalize_source("WIPO/OMPI"), "wipo");
        assert_eq!(normalize_source("USC (Cornell/LII)"), "usc");
        assert_eq!(normalize_source("EUR-Lex"), "eur-lex");
        assert_eq!(normalize_source("  BOE "), "boe");
        assert_eq!(normalize_source(""), "");
    }

    #[test]
    fn default_allow_list() {
        let policy = Policy::default();
        for source in ["BOE", "EUR-Lex", "WIPO/OMPI", "USC (Cornell/LII)"] {
            assert!(admit(&cite("a", source, "LPI art. 14"), &policy), "{source}");
        }
        assert!(!admit(&cite("a", "Wikipedia", ""), &policy));
        assert!(!admit(&cite("a", "", ""), &policy));
    }

    #[test]
    fn empty_allow_list_admits_everything() {
        let mut policy = Policy::default();
        policy.sources.allowed.clear();
        assert!(admit(&cite("a", "Wikipedia", ""), &policy));
        assert!(admit(&cite("a", "", ""), &policy));
    }

    #[test]
    fn personal_data_blocked_when_configured() {
        let mut c = cite("a", "BOE", "");
        c.personal_data = true;
        let mut policy = Policy::default();
        assert!(!admit(&c, &policy));
        policy.privacy.block_biometrics = false;
        assert!(admit(&c, &policy));
    }

    #[test]
    fn filter_preserves_order() {
        let kept = filter(
            vec![
                cite("a", "BOE", ""),
                cite("b", "blog", ""),
                cite("c", "WIPO", ""),
            ],
            &Policy::default(),
        );
        let ids: Vec<&str> = kept.iter().map(|c| c.doc_id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }
}

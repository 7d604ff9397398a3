//! Template decomposition and counter-proposal for copyright assignment clauses.

use std::collections::BTreeSet;

use lexdomus_core::{Flag, InquiryNode, Jurisdiction};

use crate::collaborators::{AlternativeProposer, Decomposer, Outcome};

fn evidence(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The two canonical questions of an assignment: which economic rights move,
/// and whether moral rights survive.
pub struct TemplateDecomposer;

impl Decomposer for TemplateDecomposer {
    fn decompose(&self, clause: &str, _jurisdiction: Jurisdiction) -> Outcome<Vec<InquiryNode>> {
        if clause.trim().is_empty() {
            return Outcome::Invalid("empty clause".into());
        }
        Outcome::Success(vec![
            InquiryNode {
                question: "¿Qué derechos patrimoniales se transfieren?".into(),
                structural_hint: "LPI art. 17-23".into(),
                principle: "seguridad jurídica".into(),
                required_evidence: evidence(&["Texto cláusula", "Art. concretos"]),
                fallback_alternative: "Licencia no exclusiva limitada a soportes listados".into(),
            },
            InquiryNode {
                question: "¿Se respetan los derechos morales?".into(),
                structural_hint: "LPI art. 14; Berna art. 6bis".into(),
                principle: "favor auctoris".into(),
                required_evidence: evidence(&["Referencia expresa a paternidad e integridad"]),
                fallback_alternative: "Prever autorización previa para modificaciones sustanciales"
                    .into(),
            },
        ])
    }
}

/// Fixed non-exclusive licence counter-proposal, parametrised by territory.
pub struct TemplateProposer;

impl AlternativeProposer for TemplateProposer {
    fn propose(&self, _clause: &str, jurisdiction: Jurisdiction, _flags: &[Flag]) -> Outcome<String> {
        Outcome::Success(format!(
            "El Titular cede a la Entidad, con carácter no exclusivo, los derechos de \
             reproducción y distribución sobre la Obra identificada, para el territorio {}, \
             por un plazo de 3 años, y para las modalidades de explotación descritas en \
             Anexo I. Se respetarán los derechos morales (LPI art. 14; Berna art. 6bis).",
            jurisdiction.territory()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_canonical_nodes() {
        let Outcome::Success(nodes) = TemplateDecomposer.decompose("cesión", Jurisdiction::Es) else {
            panic!("template decomposition must succeed");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].structural_hint, "LPI art. 14; Berna art. 6bis");
        assert!(nodes.iter().all(InquiryNode::has_alternative));
        assert_eq!(nodes[0].required_evidence.len(), 2);
    }

    #[test]
    fn blank_clause_is_invalid() {
        assert!(matches!(
            TemplateDecomposer.decompose("  ", Jurisdiction::Es),
            Outcome::Invalid(_)
        ));
    }

    #[test]
    fn proposal_names_territory() {
        let Outcome::Success(text) = TemplateProposer.propose("x", Jurisdiction::Us, &[]) else {
            panic!("template proposal must succeed");
        };
        assert!(text.contains("para el territorio Estados Unidos, por un plazo de 3 años"));
        assert!(text.ends_with("(LPI art. 14; Berna art. 6bis)."));
    }
}

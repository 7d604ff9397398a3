//! Human-readable cards for analysis results and search hits.
//!
//! Everything renders into a `String` so the layout can be checked without
//! capturing stdout; `main` prints the result.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use lexdomus_core::{AnalysisResult, Candidate, NodeEvidence, Provision, resolve_ref_label};

const MAX_LIST_ITEMS: usize = 10;
const SNIPPET_CHARS: usize = 160;

// ── Public API ──

/// Render an analysis as a vertical card: verdict first, then evidence per node.
pub fn analysis_card(result: &AnalysisResult) -> String {
    AnalysisCard(result).to_string()
}

/// Render ranked search hits, one block per chunk.
pub fn search_hits(query: &str, hits: &[Candidate]) -> String {
    SearchHits { query, hits }.to_string()
}

// ── Sections ──

struct AnalysisCard<'a>(&'a AnalysisResult);

impl Display for AnalysisCard<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "=== Analysis ({}) ===", result.jurisdiction)?;
        writeln!(f, "{}", shorten(&result.clause, 120))?;
        writeln!(f)?;

        writeln!(f, "Verdict")?;
        field(f, "gate", result.gate.status.as_str())?;
        if let Some(reason) = &result.gate.reason {
            field(f, "reason", reason)?;
        }
        field(
            f,
            "EEE",
            &format!(
                "T {:.2}  J {:.2}  P {:.2}",
                result.eee.t, result.eee.j, result.eee.p
            ),
        )?;
        field(f, "evidence", result.evidence.status.as_str())?;
        field(
            f,
            "citations (OK nodes)",
            &result.evidence.citation_total.to_string(),
        )?;
        field(
            f,
            "nodes OK",
            &format!("{}/{}", result.evidence.nodes_ok, result.per_node.len()),
        )?;
        if result.flags.is_empty() {
            field(f, "flags", "none")?;
        } else {
            let flags: Vec<&str> = result.flags.iter().map(|flag| flag.as_str()).collect();
            field(f, "flags", &flags.join(", "))?;
        }
        writeln!(f)?;

        for (i, node) in result.per_node.iter().enumerate() {
            node_section(f, i + 1, node)?;
        }

        let provisions = cited_provisions(&result.per_node);
        if !provisions.is_empty() {
            let labels: Vec<String> = provisions.iter().map(Provision::to_string).collect();
            writeln!(f, "Cited provisions")?;
            writeln!(f, "  {}", labels.join(", "))?;
            writeln!(f)?;
        }

        if let Some(alt) = &result.alternative_clause {
            writeln!(f, "Alternative clause")?;
            writeln!(f, "  {alt}")?;
            writeln!(f)?;
        }

        if let Some(opinion) = &result.opinion {
            writeln!(f, "Opinion")?;
            writeln!(f, "{}", opinion.analysis_md)?;
            for pro in &opinion.pros {
                writeln!(f, "  + {pro}")?;
            }
            for con in &opinion.cons {
                writeln!(f, "  - {con}")?;
            }
        }
        Ok(())
    }
}

struct SearchHits<'a> {
    query: &'a str,
    hits: &'a [Candidate],
}

impl Display for SearchHits<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Search: {} ===", self.query)?;
        if self.hits.is_empty() {
            return writeln!(f, "  (no results)");
        }
        for (rank, hit) in self.hits.iter().enumerate() {
            writeln!(f, "  {:>2}. {}", rank + 1, hit.cite_label())?;
            writeln!(f, "      {}", shorten(&hit.text, SNIPPET_CHARS))?;
            if !hit.ref_url.is_empty() {
                writeln!(f, "      {}", hit.ref_url)?;
            }
        }
        Ok(())
    }
}

fn node_section(f: &mut Formatter<'_>, n: usize, item: &NodeEvidence) -> fmt::Result {
    let retrieval = &item.retrieval;
    writeln!(f, "Node {n}: {}", item.node.question)?;
    if !item.node.structural_hint.is_empty() {
        field(f, "anchor", &item.node.structural_hint)?;
    }
    field(f, "status", retrieval.status.as_str())?;
    if let Some(reason) = &retrieval.missing_reason {
        field(f, "missing", reason)?;
    }

    let len = retrieval.citations.len();
    if len > 0 {
        writeln!(f, "  citations ({len}):")?;
        for c in retrieval.citations.iter().take(MAX_LIST_ITEMS) {
            let marker = if c.pinpoint { "*" } else { " " };
            write!(f, "   {marker} {:<40}", shorten(&c.cite_label(), 40))?;
            if c.line_end > 0 {
                write!(f, "  L{}-{}", c.line_start, c.line_end)?;
            }
            writeln!(f)?;
        }
        if len > MAX_LIST_ITEMS {
            writeln!(f, "    ... and {} more", len - MAX_LIST_ITEMS)?;
        }
    }
    writeln!(f)
}

// ── Helpers ──

fn field(f: &mut Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    writeln!(f, "  {name:<26} {value}")
}

/// Distinct pinpointed provisions across all nodes, in structural order.
fn cited_provisions(per_node: &[NodeEvidence]) -> BTreeSet<Provision> {
    per_node
        .iter()
        .flat_map(|n| &n.retrieval.citations)
        .filter_map(|c| resolve_ref_label(&c.ref_label))
        .collect()
}

fn shorten(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let head: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdomus_core::{
        EeeScore, EvidenceSummary, Flag, GateResult, InquiryNode, Jurisdiction, RetrievalResult,
    };

    fn chunk(id: &str, ref_label: &str, pinpoint: bool) -> Candidate {
        Candidate {
            doc_id: id.into(),
            source: "BOE".into(),
            jurisdiction: "ES".into(),
            title: "LPI".into(),
            family: String::new(),
            ref_label: ref_label.into(),
            ref_url: String::new(),
            pinpoint,
            line_start: 10,
            line_end: 14,
            text: "Corresponden al autor los siguientes derechos irrenunciables e inalienables."
                .into(),
            personal_data: false,
        }
    }

    fn result() -> AnalysisResult {
        let per_node = vec![NodeEvidence {
            node: InquiryNode::generic(),
            retrieval: RetrievalResult::ok(vec![
                chunk("a", "art. 14", true),
                chunk("b", "Berna art. 6bis", true),
                chunk("c", "art. 14", true),
            ]),
        }];
        AnalysisResult {
            clause: "El autor renuncia a todos sus derechos morales.".into(),
            jurisdiction: Jurisdiction::Es,
            evidence: EvidenceSummary::from_nodes(&per_node),
            per_node,
            flags: vec![Flag::GeneralMoralRightsWaiver],
            eee: EeeScore::new(5.0, 4.0, 2.0),
            gate: GateResult::inconclusive("P 2.00 < 4.00"),
            alternative_clause: None,
            opinion: None,
        }
    }

    #[test]
    fn card_shows_verdict_and_nodes() {
        let card = analysis_card(&result());
        assert!(card.starts_with("=== Analysis (ES) ==="));
        assert!(card.contains("NO_CONCLUYENTE"));
        assert!(card.contains("T 5.00  J 4.00  P 2.00"));
        assert!(card.contains("general moral-rights waiver"));
        assert!(card.contains("citations (3):"));
        assert!(card.contains("L10-14"));
        assert!(!card.contains("Alternative clause"));
    }

    #[test]
    fn provisions_are_deduplicated_and_ordered() {
        let card = analysis_card(&result());
        assert!(card.contains("art. 6bis, art. 14"));
    }

    #[test]
    fn empty_search() {
        assert!(search_hits("x", &[]).contains("(no results)"));
    }

    #[test]
    fn shorten_respects_char_boundaries() {
        let s = shorten("cesión de derechos de explotación", 10);
        assert_eq!(s, "cesión ...");
    }
}

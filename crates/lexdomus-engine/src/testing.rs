//! Fixtures shared by the engine's unit tests.

use std::sync::Arc;

use lexdomus_core::Candidate;
use lexdomus_store::{Corpus, HybridRetriever};

/// A chunk about moral rights from `source`, cited as `ref_label`.
pub(crate) fn cite(id: &str, source: &str, ref_label: &str) -> Candidate {
    Candidate {
        doc_id: id.to_string(),
        source: source.to_string(),
        jurisdiction: "ES".to_string(),
        title: "LPI".to_string(),
        family: String::new(),
        ref_label: ref_label.to_string(),
        ref_url: String::new(),
        pinpoint: false,
        line_start: 0,
        line_end: 0,
        text: format!("{ref_label}: derechos morales del autor"),
        personal_data: false,
    }
}

/// Lexical-only retriever over `chunks`.
pub(crate) fn retriever(chunks: Vec<Candidate>) -> HybridRetriever {
    HybridRetriever::new(Arc::new(Corpus::from_chunks(chunks)))
}

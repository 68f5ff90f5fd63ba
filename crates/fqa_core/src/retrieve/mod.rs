use serde::{Deserialize, Serialize};

use crate::canonicalize::canonicalize_query;
use crate::chunking::Chunk;
use crate::index::LexicalIndex;

/// A ranked chunk returned for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub chunk_id: usize,
    pub score: f64,
    pub text: String,
}

impl Evidence {
    /// First `max_chars` characters, with `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut it = self.text.chars();
        let head: String = it.by_ref().take(max_chars).collect();
        if it.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Source label for the evidence at 1-based `rank` (`S1`, `S2`, ...).
pub fn source_label(rank: usize) -> String {
    format!("S{rank}")
}

/// Canonicalise the question, then rank chunks against the resulting keyword.
pub fn retrieve_top_k(
    index: &LexicalIndex,
    chunks: &[Chunk],
    question: &str,
    k: usize,
) -> Vec<Evidence> {
    let query = canonicalize_query(question);
    log::debug!("retrieving top {k}: question={question:?} query={query:?}");
    index.top_k(chunks, &query, k)
}

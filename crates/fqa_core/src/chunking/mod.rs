use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ChunkingConfig;
use crate::normalize::normalize_newlines;

/// A contiguous span of document text. `chunk_id` equals its position in the chunk list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Line-start section markers: Roman numeral glyphs (Ⅰ..Ⅹ) or a decimal number, then `.` and whitespace.
static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:[ⅠⅡⅢⅣⅤⅥⅦⅧⅨⅩ]|\d+)\.\s").expect("static regex"));

/// Split at every section marker, keeping the marker at the head of its segment.
///
/// Segments are trimmed; empty ones are dropped. Text without markers comes back
/// as a single segment.
pub fn split_by_markers(text: &str) -> Vec<String> {
    let mut cuts: Vec<usize> = SECTION_MARKER.find_iter(text).map(|m| m.start()).collect();
    if cuts.first() != Some(&0) {
        cuts.insert(0, 0);
    }
    cuts.push(text.len());

    cuts.windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Re-split a segment longer than `max_chars` into overlapping windows.
///
/// Windows advance by `max_chars - overlap` characters and the last window ends
/// exactly at the end of the segment.
pub fn split_by_length(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let t = text.trim();
    let chars: Vec<char> = t.chars().collect();
    if chars.len() <= max_chars {
        return vec![t.to_string()];
    }
    let max_chars = max_chars.max(1);
    let overlap = overlap.min(max_chars - 1);

    let mut out = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + max_chars).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }
    out
}

/// Structural split followed by length-bounded split, numbered in reading order.
pub fn build_chunks(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
    let text = normalize_newlines(text);
    let chunks: Vec<Chunk> = split_by_markers(&text)
        .iter()
        .flat_map(|segment| split_by_length(segment, cfg.max_chars, cfg.overlap))
        .enumerate()
        .map(|(chunk_id, text)| Chunk { chunk_id, text })
        .collect();
    log::debug!(
        "chunked document: chars={} chunks={}",
        text.chars().count(),
        chunks.len()
    );
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_roman_and_decimal_markers() {
        let text = "머리말\nⅠ. 개요\n내용\n1. 세부\n2. 세부2\nⅡ. 조건\n끝";
        assert_eq!(
            split_by_markers(text),
            vec!["머리말", "Ⅰ. 개요\n내용", "1. 세부", "2. 세부2", "Ⅱ. 조건\n끝"]
        );
    }

    #[test]
    fn markers_only_count_at_line_start() {
        let text = "금리는 연 3. 5% 수준\n상환 2. 조건";
        assert_eq!(split_by_markers(text), vec![text.to_string()]);
    }

    #[test]
    fn marker_requires_whitespace_after_dot() {
        assert_eq!(split_by_markers("Ⅰ.개요\n2026.01.01"), vec!["Ⅰ.개요\n2026.01.01"]);
    }

    #[test]
    fn whitespace_only_input_has_no_segments() {
        assert!(split_by_markers("  \n\t ").is_empty());
        assert!(build_chunks("   ", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn short_segment_is_returned_unchanged() {
        assert_eq!(split_by_length("  abc  ", 10, 3), vec!["abc"]);
        assert_eq!(split_by_length("abcdefghij", 10, 3), vec!["abcdefghij"]);
    }

    #[test]
    fn long_segment_windows_overlap_and_reach_the_end() {
        let windows = split_by_length("abcdefghijkl", 5, 2);
        assert_eq!(windows, vec!["abcde", "defgh", "ghijk", "jkl"]);
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let text = "가".repeat(10);
        let windows = split_by_length(&text, 4, 1);
        assert!(windows.iter().all(|w| w.chars().count() <= 4));
        assert_eq!(windows.len(), 3);
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let windows = split_by_length("abcdef", 2, 5);
        assert_eq!(windows, vec!["ab", "bc", "cd", "de", "ef"]);
    }

    #[test]
    fn chunk_ids_are_dense_and_zero_based() {
        let body = "가".repeat(2000);
        let text = format!("Ⅰ. 개요\n{body}\nⅡ. 조건\n짧은 내용");
        let chunks = build_chunks(&text, &ChunkingConfig::default());
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_id, i);
        }
        assert!(chunks.len() > 2);
        assert_eq!(chunks.last().map(|c| c.text.as_str()), Some("Ⅱ. 조건\n짧은 내용"));
    }

    #[test]
    fn crlf_documents_still_split_on_markers() {
        let chunks = build_chunks("Ⅰ. 개요\r\n본문\r\nⅡ. 조건\r\n끝", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "Ⅱ. 조건\n끝");
    }
}

//! BM25 ranking over one document's chunks.
//!
//! Built once per document and never mutated; a changed text means a new index.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::chunking::Chunk;
use crate::retrieve::Evidence;
use crate::tokenize::analyze;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;

/// Build a ranking structure over `chunks`. An empty slice gives an empty, queryable index.
pub fn build_index(chunks: &[Chunk]) -> LexicalIndex {
    LexicalIndex::build(chunks)
}

#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<usize>,
    doc_freqs: HashMap<String, u32>,
    avg_doc_length: f64,
}

impl LexicalIndex {
    pub fn build(chunks: &[Chunk]) -> Self {
        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_lengths = Vec::with_capacity(chunks.len());
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();

        for chunk in chunks {
            let tokens = analyze(&chunk.text);
            doc_lengths.push(tokens.len());
            let mut tf: HashMap<String, u32> = HashMap::new();
            for t in tokens {
                *tf.entry(t).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(tf);
        }

        let total: usize = doc_lengths.iter().sum();
        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            total as f64 / doc_lengths.len() as f64
        };

        log::debug!(
            "built lexical index: chunks={} vocabulary={} avg_len={:.1}",
            doc_lengths.len(),
            doc_freqs.len(),
            avg_doc_length
        );

        Self {
            term_freqs,
            doc_lengths,
            doc_freqs,
            avg_doc_length,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.doc_freqs.len()
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.len() as f64;
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f64;
        // Always positive, unlike the classic Robertson form, so a term found in
        // half the chunks still counts.
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// One score per chunk, in chunk order.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.len()];
        if self.avg_doc_length == 0.0 {
            return scores;
        }
        for term in query_tokens {
            if !self.doc_freqs.contains_key(term) {
                continue;
            }
            let idf = self.idf(term);
            for (i, tf_map) in self.term_freqs.iter().enumerate() {
                let tf = match tf_map.get(term) {
                    Some(&tf) => tf as f64,
                    None => continue,
                };
                let dl = self.doc_lengths[i] as f64;
                let norm = 1.0 - BM25_B + BM25_B * dl / self.avg_doc_length;
                scores[i] += idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * norm);
            }
        }
        scores
    }

    /// Rank chunks for `query_text`, highest score first, ties by lower chunk id.
    ///
    /// `chunks` must be the slice the index was built from. Zero-score chunks still
    /// fill `k`; `k` larger than the corpus returns every chunk.
    pub fn top_k(&self, chunks: &[Chunk], query_text: &str, k: usize) -> Vec<Evidence> {
        let query_tokens = analyze(query_text);
        let scores = self.score(&query_tokens);

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        ranked
            .into_iter()
            .filter_map(|(i, score)| {
                chunks.get(i).map(|c| Evidence {
                    chunk_id: c.chunk_id,
                    score,
                    text: c.text.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(chunk_id, t)| Chunk {
                chunk_id,
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn empty_corpus_scores_nothing() {
        let idx = LexicalIndex::build(&[]);
        assert!(idx.is_empty());
        assert!(idx.score(&["발행금액".to_string()]).is_empty());
        assert!(idx.top_k(&[], "발행금액", 3).is_empty());
    }

    #[test]
    fn unique_term_ranks_its_chunk_first() {
        let c = chunks(&["인수기관 대신증권", "상환기일 2026년", "신용평가등급 AA"]);
        let idx = LexicalIndex::build(&c);
        let scores = idx.score(&["상환기일".to_string()]);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn higher_term_frequency_scores_higher() {
        let c = chunks(&["채권 채권 채권 발행", "채권 발행 조건 상세 설명"]);
        let idx = LexicalIndex::build(&c);
        let hits = idx.top_k(&c, "채권", 2);
        assert_eq!(hits[0].chunk_id, 0);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn ties_keep_chunk_order() {
        let c = chunks(&["같은 내용", "같은 내용", "같은 내용"]);
        let idx = LexicalIndex::build(&c);
        let ids: Vec<usize> = idx.top_k(&c, "내용", 3).iter().map(|e| e.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let c = chunks(&["하나 내용", "둘째 내용"]);
        let idx = LexicalIndex::build(&c);
        assert_eq!(idx.top_k(&c, "없는질의", 10).len(), 2);
    }
}

//! Per-document artifacts cached across requests.
//!
//! The core functions stay stateless; this cache is what a service layer holds so
//! repeated questions against one filing reuse a single chunk list and index.
//! Unbounded, with manual invalidation: documents are few and explicitly loaded.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::chunking::{build_chunks, Chunk};
use crate::config::ChunkingConfig;
use crate::domain::DocumentMeta;
use crate::index::LexicalIndex;
use crate::retrieve::{retrieve_top_k, Evidence};

/// One document's immutable retrieval state.
#[derive(Debug)]
pub struct IndexedDocument {
    pub meta: DocumentMeta,
    pub text_sha256: String,
    pub chunking: ChunkingConfig,
    pub chunks: Vec<Chunk>,
    pub index: LexicalIndex,
}

impl IndexedDocument {
    pub fn build(meta: DocumentMeta, text: &str, chunking: ChunkingConfig) -> Self {
        let chunks = build_chunks(text, &chunking);
        let index = LexicalIndex::build(&chunks);
        Self {
            meta,
            text_sha256: text_sha256(text),
            chunking,
            chunks,
            index,
        }
    }

    pub fn retrieve(&self, question: &str, k: usize) -> Vec<Evidence> {
        retrieve_top_k(&self.index, &self.chunks, question, k)
    }
}

pub fn text_sha256(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub rcept_nos: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DocumentIndexCache {
    entries: Mutex<BTreeMap<String, Arc<IndexedDocument>>>,
}

impl DocumentIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rcept_no: &str) -> Option<Arc<IndexedDocument>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(rcept_no).cloned()
    }

    /// Reuse the cached document when its text and chunking are unchanged, otherwise rebuild.
    pub fn get_or_build(
        &self,
        meta: DocumentMeta,
        text: &str,
        chunking: ChunkingConfig,
    ) -> Arc<IndexedDocument> {
        let hash = text_sha256(text);
        if let Some(doc) = self.get(&meta.rcept_no) {
            if doc.text_sha256 == hash && doc.chunking == chunking && doc.meta == meta {
                log::debug!("index cache hit: rcept_no={}", meta.rcept_no);
                return doc;
            }
        }
        self.insert(IndexedDocument::build(meta, text, chunking))
    }

    /// Replace whatever is cached for the document wholesale.
    pub fn insert(&self, doc: IndexedDocument) -> Arc<IndexedDocument> {
        let doc = Arc::new(doc);
        log::info!(
            "indexed document: rcept_no={} chunks={}",
            doc.meta.rcept_no,
            doc.chunks.len()
        );
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(doc.meta.rcept_no.clone(), Arc::clone(&doc));
        doc
    }

    pub fn invalidate(&self, rcept_no: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(rcept_no).is_some()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            entries: entries.len(),
            rcept_nos: entries.keys().cloned().collect(),
        }
    }
}

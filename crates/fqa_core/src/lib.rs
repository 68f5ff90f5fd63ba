pub mod canonicalize;
pub mod chunking;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod ingest;
pub mod normalize;
pub mod report;
pub mod retrieve;
pub mod session;
pub mod store;
pub mod tokenize;

pub use chunking::{build_chunks, Chunk};
pub use index::{build_index, LexicalIndex};
pub use retrieve::{retrieve_top_k, Evidence};

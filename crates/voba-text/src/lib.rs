//! voba-text
//!
//! BM25 lexical retrieval over an append-only JSONL token log. The log is the
//! durable state; the tantivy index is rebuilt in memory from it on open.
pub mod tantivy_utils;
pub mod tokenize;
pub mod lexical;

pub use lexical::{LexicalIndex, LogRecord};
pub use tokenize::tokenize;

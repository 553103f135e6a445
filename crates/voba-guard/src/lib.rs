//! voba-guard
//!
//! Guardrails applied around retrieval: prompt-injection detection, redaction
//! of secrets, personal data and addresses, a coarse topical gate and the
//! citation heuristic used when post-processing answers.
pub mod patterns;
pub mod filter;

pub use filter::{has_citation, in_scope, looks_suspicious, redact, ContentFilter, Redaction, SanitizedChunks, UNCITED_NOTE};

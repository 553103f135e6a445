use regex::Regex;

use voba_core::config::GuardrailsConfig;
use voba_core::types::Chunk;

use crate::patterns::{
    ADDRESSES, ADDRESS_PLACEHOLDER, CODE_MARKERS, JWT, JWT_PLACEHOLDER, MIN_QUERY_LEN, PII, PII_PLACEHOLDER, SECRETS,
    SECRET_PLACEHOLDER, SUSPICIOUS_MARKER, SUSPICIOUS_PHRASES, TECH_KEYWORDS,
};

pub const UNCITED_NOTE: &str = "\n\n_Note: no source snippets were cited for this answer._";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub text: String,
    pub was_redacted: bool,
}

/// Chunks ready to be placed in a prompt, plus what happened to them.
#[derive(Debug, Clone, Default)]
pub struct SanitizedChunks {
    pub chunks: Vec<Chunk>,
    pub any_redacted: bool,
    pub any_suspicious: bool,
}

pub fn looks_suspicious(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SUSPICIOUS_PHRASES.iter().any(|p| lowered.contains(p))
}

/// Upper bound on redaction passes. A placeholder can open a fresh word
/// boundary for a later rule, so passes repeat until the text is stable.
const MAX_REDACT_PASSES: usize = 8;

fn redact_pass(text: &str) -> String {
    let mut out = text.to_string();
    let mut apply = |rx: &Regex, placeholder: &str| {
        if rx.is_match(&out) { out = rx.replace_all(&out, placeholder).into_owned(); }
    };
    apply(&JWT, JWT_PLACEHOLDER);
    for rx in SECRETS.iter() { apply(rx, SECRET_PLACEHOLDER); }
    for rx in PII.iter() { apply(rx, PII_PLACEHOLDER); }
    for rx in ADDRESSES.iter() { apply(rx, ADDRESS_PLACEHOLDER); }
    out
}

/// JWT, then secrets, then PII, then addresses, repeated until nothing more
/// matches. Redacting the output again returns it unchanged.
pub fn redact(text: &str) -> Redaction {
    let mut out = text.to_string();
    let mut was_redacted = false;
    for _ in 0..MAX_REDACT_PASSES {
        let next = redact_pass(&out);
        if next == out { break; }
        was_redacted = true;
        out = next;
    }
    Redaction { text: out, was_redacted }
}

/// Coarse technical/scientific allow-list. Always true when the gate is off.
pub fn in_scope(query: &str, gate_enabled: bool) -> bool { in_scope_with(query, gate_enabled, MIN_QUERY_LEN) }

fn in_scope_with(query: &str, gate_enabled: bool, min_len: usize) -> bool {
    if !gate_enabled { return true; }
    if query.chars().count() < min_len { return false; }
    let lowered = query.to_lowercase();
    if CODE_MARKERS.iter().any(|m| lowered.contains(m)) { return true; }
    TECH_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// `[file#chunk]`-style marker heuristic.
pub fn has_citation(text: &str) -> bool { text.contains('[') && text.contains('#') && text.contains(']') }

/// Guardrails bound to one configuration.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    block_private: bool,
    allow_only_tech: bool,
    min_query_len: usize,
}

impl Default for ContentFilter {
    fn default() -> Self { Self::from_config(&GuardrailsConfig::default()) }
}

impl ContentFilter {
    pub fn from_config(cfg: &GuardrailsConfig) -> Self {
        Self { block_private: cfg.block_private, allow_only_tech: cfg.allow_only_tech, min_query_len: cfg.min_query_len }
    }

    pub fn in_scope(&self, query: &str) -> bool { in_scope_with(query, self.allow_only_tech, self.min_query_len) }

    /// Redacts (when enabled), then checks the redacted text for injection
    /// phrases. Suspicious chunks keep their metadata but lose their text.
    pub fn sanitize_chunks(&self, chunks: &[Chunk]) -> SanitizedChunks {
        let mut out = SanitizedChunks { chunks: Vec::with_capacity(chunks.len()), ..Default::default() };
        for chunk in chunks {
            let mut chunk = chunk.clone();
            if self.block_private {
                let r = redact(&chunk.text);
                if r.was_redacted {
                    out.any_redacted = true;
                    tracing::debug!(chunk = %chunk.label(), "redacted private data in context chunk");
                }
                chunk.text = r.text;
            }
            if looks_suspicious(&chunk.text) {
                out.any_suspicious = true;
                tracing::warn!(chunk = %chunk.label(), "context chunk looks like prompt injection, withholding");
                chunk.text = SUSPICIOUS_MARKER.to_string();
            }
            out.chunks.push(chunk);
        }
        out
    }

    /// Appends a note when the answer cites nothing.
    pub fn post_process(&self, answer: &str) -> String {
        if has_citation(answer) { answer.to_string() } else { format!("{answer}{UNCITED_NOTE}") }
    }
}

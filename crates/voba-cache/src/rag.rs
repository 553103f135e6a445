//! Retrieval-aware lookup for RAG answers.
//!
//! A cached answer is only reused when the context retrieved for the new
//! request overlaps the context recorded with the answer by at least `tau`.

use serde_json::{Map, Value};
use std::time::Duration;

use voba_core::types::ContextFingerprint;

use crate::invalidate::{is_fresh, DEFAULT_TAU};
use crate::store::{Lookup, ResponseCache};

pub const FINGERPRINT_META_KEY: &str = "fingerprint";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagOutcome {
    /// Nothing usable was cached; generated and stored.
    Miss,
    /// Served from cache without generating.
    HitFresh,
    /// Cached under different context; regenerated and overwritten.
    HitStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagAnswer {
    pub answer: String,
    pub outcome: RagOutcome,
}

pub struct RagCache {
    cache: ResponseCache,
    tau: f64,
    ttl: Option<Duration>,
}

impl RagCache {
    pub fn new(cache: ResponseCache, tau: f64) -> Self {
        Self { cache, tau: tau.clamp(0.0, 1.0), ttl: None }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self { self.ttl = ttl; self }

    pub fn tau(&self) -> f64 { self.tau }

    pub fn cache(&self) -> &ResponseCache { &self.cache }

    /// Resolves one request to exactly one of the three outcomes. Errors from
    /// `generate` propagate; failing to store the fresh answer does not.
    pub fn answer<F>(&self, query: &str, fingerprint: &ContextFingerprint, generate: F) -> anyhow::Result<RagAnswer>
    where
        F: FnOnce() -> anyhow::Result<String>,
    {
        let outcome = match self.cache.get(query) {
            Lookup::Hit(hit) => {
                let cached = stored_fingerprint(hit.extra_meta.as_ref());
                if is_fresh(fingerprint, &cached, self.tau) {
                    tracing::debug!(query, "rag cache hit, context unchanged");
                    return Ok(RagAnswer { answer: hit.payload, outcome: RagOutcome::HitFresh });
                }
                tracing::debug!(query, "rag cache hit, context drifted");
                RagOutcome::HitStale
            }
            Lookup::Miss(reason) => {
                tracing::debug!(query, ?reason, "rag cache miss");
                RagOutcome::Miss
            }
        };

        let answer = generate()?;
        let mut meta = Map::new();
        meta.insert(FINGERPRINT_META_KEY.to_string(), serde_json::to_value(fingerprint)?);
        if let Err(e) = self.cache.add(query, &answer, self.ttl, Some(meta)) {
            tracing::warn!(error = %e, "answer generated but not cached");
        }
        Ok(RagAnswer { answer, outcome })
    }
}

impl From<ResponseCache> for RagCache {
    fn from(cache: ResponseCache) -> Self { Self::new(cache, DEFAULT_TAU) }
}

/// Entries written without a fingerprint compare as empty context.
fn stored_fingerprint(meta: Option<&Map<String, Value>>) -> ContextFingerprint {
    meta.and_then(|m| m.get(FINGERPRINT_META_KEY))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

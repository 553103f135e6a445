//! Request pipeline: topical gate, retrieval, sanitising, cached generation
//! and post-processing.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use voba_cache::{RagCache, RagOutcome, ResponseCache};
use voba_core::traits::{Generator, VectorIndex};
use voba_core::types::{Chunk, ContextFingerprint, FusedResult};
use voba_guard::ContentFilter;

use crate::prompt::{build_chat_messages, build_rag_messages};
use crate::retriever::HybridRetriever;

pub const OUT_OF_SCOPE_REPLY: &str = "I can only help with technical or scientific questions.";

/// Display record for one chunk that fed an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub source_file: String,
    pub chunk_index: i64,
    pub page: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
}

impl From<&FusedResult> for Source {
    fn from(r: &FusedResult) -> Self {
        Self {
            source_file: r.chunk.source_file.clone(),
            chunk_index: r.chunk.chunk_index,
            page: r.chunk.page,
            kind: r.chunk.kind.clone(),
            score: r.normalized_score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    /// `None` when no RAG cache is configured or the request was refused.
    pub outcome: Option<RagOutcome>,
    pub refused: bool,
    pub any_redacted: bool,
    pub any_suspicious: bool,
}

impl PipelineResponse {
    fn refused() -> Self {
        Self { answer: OUT_OF_SCOPE_REPLY.to_string(), sources: vec![], outcome: None, refused: true, any_redacted: false, any_suspicious: false }
    }
}

pub struct RagPipeline<V> where V: VectorIndex {
    retriever: HybridRetriever<V>,
    generator: Box<dyn Generator>,
    filter: ContentFilter,
    rag_cache: Option<RagCache>,
    chat_cache: Option<ResponseCache>,
    chat_ttl: Option<Duration>,
}

impl<V> RagPipeline<V> where V: VectorIndex {
    pub fn new(retriever: HybridRetriever<V>, generator: Box<dyn Generator>, filter: ContentFilter) -> Self {
        Self { retriever, generator, filter, rag_cache: None, chat_cache: None, chat_ttl: None }
    }

    pub fn with_rag_cache(mut self, cache: RagCache) -> Self { self.rag_cache = Some(cache); self }

    pub fn with_chat_cache(mut self, cache: ResponseCache, ttl: Option<Duration>) -> Self {
        self.chat_cache = Some(cache);
        self.chat_ttl = ttl;
        self
    }

    pub fn retriever(&self) -> &HybridRetriever<V> { &self.retriever }

    pub fn retriever_mut(&mut self) -> &mut HybridRetriever<V> { &mut self.retriever }

    pub fn rag_cache(&self) -> Option<&RagCache> { self.rag_cache.as_ref() }

    pub fn chat_cache(&self) -> Option<&ResponseCache> { self.chat_cache.as_ref() }

    /// Answers `question` from retrieved context. Out-of-scope questions are
    /// refused without calling the generator.
    pub fn ask(&self, question: &str) -> Result<PipelineResponse> {
        if !self.filter.in_scope(question) {
            tracing::info!(question, "question rejected by topical gate");
            return Ok(PipelineResponse::refused());
        }

        let fused = self.retriever.retrieve(question)?;
        let chunks: Vec<Chunk> = fused.iter().map(|r| r.chunk.clone()).collect();
        let sanitized = self.filter.sanitize_chunks(&chunks);
        let fingerprint = ContextFingerprint::from_chunks(&sanitized.chunks);
        let messages = build_rag_messages(question, &sanitized.chunks);
        let generate = || self.generator.generate(&messages);

        let (raw, outcome) = match &self.rag_cache {
            Some(cache) => {
                let r = cache.answer(question, &fingerprint, generate)?;
                (r.answer, Some(r.outcome))
            }
            None => (generate()?, None),
        };
        tracing::info!(question, sources = fused.len(), context = fingerprint.len(), ?outcome, redacted = sanitized.any_redacted, suspicious = sanitized.any_suspicious, "answered");

        Ok(PipelineResponse {
            answer: self.filter.post_process(&raw),
            sources: fused.iter().map(Source::from).collect(),
            outcome,
            refused: false,
            any_redacted: sanitized.any_redacted,
            any_suspicious: sanitized.any_suspicious,
        })
    }

    /// Plain chat without retrieval, cached by normalised message text.
    pub fn chat(&self, message: &str) -> Result<String> {
        if !self.filter.in_scope(message) {
            return Ok(OUT_OF_SCOPE_REPLY.to_string());
        }
        if let Some(answer) = self.chat_cache.as_ref().and_then(|c| c.get_payload(message)) {
            tracing::debug!("chat cache hit");
            return Ok(answer);
        }
        let answer = self.generator.generate(&build_chat_messages(message))?;
        if !self.generator.answers_chat() { return Ok(answer); }
        if let Some(cache) = &self.chat_cache {
            if let Err(e) = cache.add(message, &answer, self.chat_ttl, None) {
                tracing::warn!(error = %e, "chat answer generated but not cached");
            }
        }
        Ok(answer)
    }
}

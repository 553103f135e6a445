use anyhow::{ensure, Result};

use voba_core::config::RetrievalConfig;
use voba_core::traits::{Embedder, VectorIndex};
use voba_core::types::{Chunk, FusedResult, RankedHit};
use voba_text::LexicalIndex;

use crate::fusion::fuse;
use crate::normalize::score_fused;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    pub skipped: usize,
}

/// Dense and lexical search over the same chunk corpus, fused with RRF.
pub struct HybridRetriever<V> where V: VectorIndex {
    embedder: Box<dyn Embedder>,
    vectors: V,
    lexical: LexicalIndex,
    settings: RetrievalConfig,
}

impl<V> HybridRetriever<V> where V: VectorIndex {
    pub fn new(embedder: Box<dyn Embedder>, vectors: V, lexical: LexicalIndex, settings: RetrievalConfig) -> Self {
        Self { embedder, vectors, lexical, settings }
    }

    pub fn settings(&self) -> &RetrievalConfig { &self.settings }

    pub fn vectors(&self) -> &V { &self.vectors }

    pub fn lexical(&self) -> &LexicalIndex { &self.lexical }

    /// Adds chunks to both indexes. Ids the lexical log already holds are
    /// skipped, so re-ingesting a folder is cheap.
    pub fn index(&mut self, chunks: &[Chunk]) -> Result<IngestReport> {
        let fresh: Vec<&Chunk> = chunks.iter().filter(|c| !self.lexical.contains(&c.id)).collect();
        let report = IngestReport { added: fresh.len(), skipped: chunks.len() - fresh.len() };
        if fresh.is_empty() { return Ok(report); }

        let texts: Vec<String> = fresh.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        ensure!(embeddings.len() == texts.len(), "embedder returned {} vectors for {} texts", embeddings.len(), texts.len());
        for e in &embeddings { ensure!(e.len() == self.embedder.dim(), "embedding dim {} != {}", e.len(), self.embedder.dim()); }

        let owned: Vec<Chunk> = fresh.into_iter().cloned().collect();
        self.vectors.add(&owned, &embeddings)?;
        let ids: Vec<String> = owned.iter().map(|c| c.id.clone()).collect();
        self.lexical.add(&ids, &texts)?;
        tracing::info!(added = report.added, skipped = report.skipped, "chunks indexed");
        Ok(report)
    }

    /// Dense hits carry their chunk and distance; lexical hits carry their
    /// BM25 score only.
    pub fn candidates(&self, query: &str) -> Result<(Vec<RankedHit>, Vec<RankedHit>)> {
        let k = self.settings.candidate_k;
        let q_vec = self.embedder.embed_batch(&[query.to_string()])?.into_iter().next().ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))?;
        let dense: Vec<RankedHit> = self
            .vectors
            .query(&q_vec, k)?
            .into_iter()
            .enumerate()
            .map(|(rank, h)| RankedHit { chunk_id: h.chunk.id.clone(), rank, raw_score: h.distance, chunk: Some(h.chunk) })
            .collect();
        let lexical: Vec<RankedHit> = self
            .lexical
            .search(query, k)?
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk_id, score))| RankedHit { chunk_id, rank, raw_score: score, chunk: None })
            .collect();
        tracing::debug!(query, dense = dense.len(), lexical = lexical.len(), "retrieval candidates");
        Ok((dense, lexical))
    }

    /// Top `top_k` fused results with blended quality scores.
    pub fn retrieve(&self, query: &str) -> Result<Vec<FusedResult>> {
        let (dense, lexical) = self.candidates(query)?;
        let s = &self.settings;
        let mut fused = fuse(&dense, &lexical, s.top_k, s.rrf_k, &self.vectors);
        score_fused(&mut fused, &dense, &lexical, &s.dense_metric, s.alpha);
        Ok(fused)
    }
}

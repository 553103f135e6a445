// Reciprocal Rank Fusion (RRF) with explicit hydration

use std::collections::HashMap;

use voba_core::traits::VectorIndex;
use voba_core::types::{Chunk, ChunkId, FusedResult, RankedHit};

/// RRF constant from Cormack, Clarke and Buettcher (SIGIR 2009). Larger values
/// flatten the contribution of deep ranks.
pub const DEFAULT_RRF_K: usize = 60;

struct Candidate<'a> {
    id: &'a str,
    score: f64,
    dense: Option<&'a RankedHit>,
    lexical: Option<&'a RankedHit>,
}

impl Candidate<'_> {
    fn tie_key(&self) -> (usize, usize) {
        (self.dense.map_or(usize::MAX, |h| h.rank), self.lexical.map_or(usize::MAX, |h| h.rank))
    }
}

fn contribution(rrf_k: usize, rank: usize) -> f64 { 1.0 / (rrf_k + rank).max(1) as f64 }

/// Fuses a dense and a lexical ranked list.
///
/// `score(id) = Σ 1 / (rrf_k + rank)` over the lists containing the id, with
/// 0-based ranks. Results are ordered by descending score; ties go to the
/// better dense rank, then the better lexical rank. The first `top_k` are
/// hydrated: chunks already carried by a hit are used directly, the rest are
/// fetched with a single `get` on `hydrator`. Ids that still have no chunk
/// are dropped, and nothing is backfilled in their place.
///
/// `normalized_score` is left at zero; see [`crate::normalize::score_fused`].
pub fn fuse(dense: &[RankedHit], lexical: &[RankedHit], top_k: usize, rrf_k: usize, hydrator: &dyn VectorIndex) -> Vec<FusedResult> {
    let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(dense.len() + lexical.len());
    let mut by_id: HashMap<&str, usize> = HashMap::new();

    for hit in dense {
        if by_id.contains_key(hit.chunk_id.as_str()) { continue; }
        by_id.insert(&hit.chunk_id, candidates.len());
        candidates.push(Candidate { id: &hit.chunk_id, score: contribution(rrf_k, hit.rank), dense: Some(hit), lexical: None });
    }
    for hit in lexical {
        match by_id.get(hit.chunk_id.as_str()) {
            Some(&i) => {
                let c = &mut candidates[i];
                if c.lexical.is_none() {
                    c.score += contribution(rrf_k, hit.rank);
                    c.lexical = Some(hit);
                }
            }
            None => {
                by_id.insert(&hit.chunk_id, candidates.len());
                candidates.push(Candidate { id: &hit.chunk_id, score: contribution(rrf_k, hit.rank), dense: None, lexical: Some(hit) });
            }
        }
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tie_key().cmp(&b.tie_key())));
    candidates.truncate(top_k);
    tracing::debug!(dense = dense.len(), lexical = lexical.len(), kept = candidates.len(), "rrf fused");

    hydrate(candidates, hydrator)
}

fn hydrate(candidates: Vec<Candidate<'_>>, hydrator: &dyn VectorIndex) -> Vec<FusedResult> {
    // pass 1: whatever the source lists already carry
    let carried: Vec<Option<Chunk>> = candidates
        .iter()
        .map(|c| c.dense.and_then(|h| h.chunk.clone()).or_else(|| c.lexical.and_then(|h| h.chunk.clone())))
        .collect();

    // pass 2: one lookup for the remainder
    let missing: Vec<ChunkId> = candidates.iter().zip(&carried).filter(|(_, ch)| ch.is_none()).map(|(c, _)| c.id.to_string()).collect();
    let mut fetched: HashMap<ChunkId, Chunk> = HashMap::new();
    if !missing.is_empty() {
        match hydrator.get(&missing) {
            Ok(chunks) => fetched.extend(chunks.into_iter().map(|c| (c.id.clone(), c))),
            Err(e) => tracing::warn!(ids = missing.len(), error = %e, "hydration lookup failed, dropping unhydrated results"),
        }
    }

    candidates
        .into_iter()
        .zip(carried)
        .filter_map(|(c, chunk)| {
            let chunk = chunk.or_else(|| fetched.remove(c.id));
            if chunk.is_none() { tracing::warn!(id = c.id, "no document for fused id, dropping"); }
            Some(FusedResult {
                chunk_id: c.id.to_string(),
                fused_score: c.score,
                chunk: chunk?,
                normalized_score: 0.0,
                dense_rank: c.dense.map(|h| h.rank),
                lexical_rank: c.lexical.map(|h| h.rank),
            })
        })
        .collect()
}

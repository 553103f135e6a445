//! voba-embed
//!
//! Deterministic feature-hashing embedder. Words are hashed into a fixed
//! number of buckets and the vector is L2-normalised, so texts sharing words
//! land close together. No model weights, no tokenizer files.
use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use voba_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 384;

pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if (h >> 63) == 1 { -1.0 } else { 1.0 };
            v[idx] += sign * (0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32) * 0.5);
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt();
        if norm > 1e-6 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Default for HashEmbedder { fn default() -> Self { Self::new(DEFAULT_DIM) } }

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::trace!(count = texts.len(), dim = self.dim, "hash embedding batch");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

//! Seams to the external collaborators: embedding model, vector index and
//! language model. The core only calls through these traits.

use crate::types::{ChatMessage, Chunk, ChunkId, DenseHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// One vector per input text, order-preserving.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

pub trait VectorIndex: Send + Sync {
    fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
    /// Nearest neighbours ordered by ascending distance.
    fn query(&self, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<DenseHit>>;
    /// Hydration lookup. Unknown ids are omitted from the answer, not errors.
    fn get(&self, ids: &[ChunkId]) -> anyhow::Result<Vec<Chunk>>;
}

pub trait Generator: Send + Sync {
    fn generate(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
    /// False when plain chat gets a canned reply instead of a model answer;
    /// such replies are not cached.
    fn answers_chat(&self) -> bool { true }
}

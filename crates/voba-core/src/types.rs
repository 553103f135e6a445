//! Domain types shared by the lexical index, fusion, filtering and cache layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type ChunkId = String;

/// A retrievable unit of a source document.
///
/// - `id`: stable content hash, unique across the corpus
/// - `source_file`: absolute path of the originating document
/// - `chunk_index`: position within the document, `-1` for non-text artifacts
/// - `page`: page number when known, `-1` otherwise
/// - `kind`: `"text"`, `"image_caption"`, `"picture_annotation"`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source_file: String,
    pub chunk_index: i64,
    pub page: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chunk {
    /// Citation label in `file#chunk` form. Also the fingerprint element.
    pub fn label(&self) -> String {
        format!("{}#{}", self.source_file, self.chunk_index)
    }
}

/// One entry of a single ranked source list.
///
/// `rank` is the 0-based position within its list. `raw_score` is the list's
/// native score: a distance for dense hits (lower is better), a BM25 score for
/// lexical hits (higher is better). `chunk` is present when the source already
/// returned the document.
#[derive(Debug, Clone)]
pub struct RankedHit {
    pub chunk_id: ChunkId,
    pub rank: usize,
    pub raw_score: f32,
    pub chunk: Option<Chunk>,
}

impl RankedHit {
    /// Builds a ranked list from ids in order, without documents.
    pub fn from_ids<I, S>(ids: I) -> Vec<RankedHit>
    where
        I: IntoIterator<Item = S>,
        S: Into<ChunkId>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(rank, id)| RankedHit { chunk_id: id.into(), rank, raw_score: 0.0, chunk: None })
            .collect()
    }
}

/// A nearest-neighbour answer from the dense vector index.
#[derive(Debug, Clone)]
pub struct DenseHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// A fused, hydrated result. Ordered by descending `fused_score` within a batch.
#[derive(Debug, Clone)]
pub struct FusedResult {
    pub chunk_id: ChunkId,
    pub fused_score: f64,
    pub chunk: Chunk,
    pub normalized_score: f64,
    pub dense_rank: Option<usize>,
    pub lexical_rank: Option<usize>,
}

/// The set of `file#chunk` labels that characterises which context produced an
/// answer. Only ever compared, never ranked on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextFingerprint(BTreeSet<String>);

impl ContextFingerprint {
    pub fn from_chunks<'a, I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        Self(chunks.into_iter().map(Chunk::label).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn intersection_len(&self, other: &Self) -> usize {
        self.0.intersection(&other.0).count()
    }

    pub fn union_len(&self, other: &Self) -> usize {
        self.0.union(&other.0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for ContextFingerprint {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Chat message role understood by the generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use voba_core::traits::VectorIndex;
use voba_core::types::{Chunk, ChunkId, DenseHit};

use crate::metric::DistanceMetric;

#[derive(Clone, Serialize, Deserialize)]
struct Row { chunk: Chunk, vector: Vec<f32> }

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    dim: Option<usize>,
    rows: Vec<Row>,
}

pub struct MemoryVectorIndex {
    metric: DistanceMetric,
    path: Option<PathBuf>,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    dim: Option<usize>,
    rows: Vec<Row>,
    by_id: HashMap<ChunkId, usize>,
}

impl State {
    fn upsert(&mut self, row: Row) {
        match self.by_id.get(&row.chunk.id) {
            Some(&i) => self.rows[i] = row,
            None => { self.by_id.insert(row.chunk.id.clone(), self.rows.len()); self.rows.push(row); }
        }
    }
}

impl MemoryVectorIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, path: None, state: RwLock::new(State::default()) }
    }

    /// Index backed by a JSON snapshot at `path`; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>, metric: DistanceMetric) -> Result<Self> {
        let path = path.into();
        let mut state = State::default();
        if path.exists() {
            let snapshot: Snapshot = serde_json::from_slice(&fs::read(&path)?)?;
            state.dim = snapshot.dim;
            for row in snapshot.rows { state.upsert(row); }
            tracing::info!(path = %path.display(), rows = state.rows.len(), "vector snapshot loaded");
        }
        Ok(Self { metric, path: Some(path), state: RwLock::new(state) })
    }

    pub fn metric(&self) -> DistanceMetric { self.metric }

    pub fn len(&self) -> usize { self.read().map(|s| s.rows.len()).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Writes the snapshot through a temp file and rename. No-op without a path.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        let state = self.read()?;
        let snapshot = Snapshot { dim: state.dim, rows: state.rows.clone() };
        drop(state);
        write_atomic(path, &serde_json::to_vec(&snapshot)?)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| anyhow::anyhow!("vector index lock poisoned"))
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() { bail!("chunks ({}) and embeddings ({}) differ in length", chunks.len(), embeddings.len()); }
        let mut state = self.state.write().map_err(|_| anyhow::anyhow!("vector index lock poisoned"))?;
        for (chunk, vector) in chunks.iter().zip(embeddings) {
            let dim = *state.dim.get_or_insert(vector.len());
            if vector.len() != dim { bail!("embedding for {} has dim {}, index expects {}", chunk.id, vector.len(), dim); }
            state.upsert(Row { chunk: chunk.clone(), vector: vector.clone() });
        }
        tracing::debug!(added = chunks.len(), total = state.rows.len(), "vectors added");
        Ok(())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<DenseHit>> {
        let state = self.read()?;
        if top_k == 0 || state.rows.is_empty() { return Ok(vec![]); }
        if let Some(dim) = state.dim { if vector.len() != dim { bail!("query has dim {}, index expects {}", vector.len(), dim); } }
        let mut scored: Vec<(usize, f32)> = state.rows.iter().enumerate().map(|(i, r)| (i, self.metric.distance(vector, &r.vector))).collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(scored.into_iter().take(top_k).map(|(i, distance)| DenseHit { chunk: state.rows[i].chunk.clone(), distance }).collect())
    }

    fn get(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>> {
        let state = self.read()?;
        Ok(ids.iter().filter_map(|id| state.by_id.get(id).map(|&i| state.rows[i].chunk.clone())).collect())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() { Some(p) if !p.as_os_str().is_empty() => p, _ => Path::new(".") };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

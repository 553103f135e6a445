//! Per-namespace byte accounting persisted in `meta.json`.
//!
//! The counter is loaded when the namespace opens, recounted from disk when
//! the file is missing or unreadable, and written back after each purge and
//! on flush.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::error::CacheError;

pub const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMeta {
    pub cache_size: u64,
    pub cache_type: String,
}

/// An entry file found on disk.
#[derive(Debug, Clone)]
pub struct EntryFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

pub struct Namespace {
    name: String,
    dir: PathBuf,
    ext: &'static str,
    bytes: AtomicU64,
}

impl Namespace {
    pub fn open(root: &Path, name: &str, ext: &'static str) -> Result<Self, CacheError> {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        let ns = Self { name: name.to_string(), dir, ext, bytes: AtomicU64::new(0) };
        match ns.read_meta() {
            Some(meta) => ns.bytes.store(meta.cache_size, Ordering::Relaxed),
            None => {
                let counted: u64 = ns.entry_files().iter().map(|f| f.size).sum();
                ns.bytes.store(counted, Ordering::Relaxed);
                tracing::info!(namespace = %ns.name, bytes = counted, "cache namespace meta missing, recounted from disk");
                ns.save()?;
            }
        }
        Ok(ns)
    }

    fn read_meta(&self) -> Option<NamespaceMeta> {
        let raw = fs::read(self.meta_path()).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(namespace = %self.name, error = %e, "unreadable cache meta, will recount");
                None
            }
        }
    }

    pub fn save(&self) -> Result<(), CacheError> {
        let meta = NamespaceMeta { cache_size: self.bytes(), cache_type: self.name.clone() };
        let path = self.meta_path();
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec(&meta)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CacheError::Store { path, source: e.error })?;
        Ok(())
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn meta_path(&self) -> PathBuf { self.dir.join(META_FILE) }

    pub fn bytes(&self) -> u64 { self.bytes.load(Ordering::Relaxed) }

    pub fn add_bytes(&self, n: u64) { self.bytes.fetch_add(n, Ordering::Relaxed); }

    pub fn sub_bytes(&self, n: u64) {
        let _ = self.bytes.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |b| Some(b.saturating_sub(n)));
    }

    /// Entry files live exactly two shard levels below the namespace dir.
    pub fn entry_files(&self) -> Vec<EntryFile> {
        walkdir::WalkDir::new(&self.dir)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some(self.ext))
            .filter_map(|e| {
                let md = e.metadata().ok()?;
                Some(EntryFile { path: e.path().to_path_buf(), size: md.len(), modified: md.modified().ok()? })
            })
            .collect()
    }
}

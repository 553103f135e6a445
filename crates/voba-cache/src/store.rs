use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voba_core::config::CacheConfig;

use crate::clock::{Clock, SystemClock};
use crate::entry::{self, EntryHeader};
use crate::error::CacheError;
use crate::key::hash_key;
use crate::namespace::Namespace;

/// Payload encoding of a namespace; only decides the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Text,
    Json,
}

impl CacheKind {
    pub fn ext(&self) -> &'static str {
        match self { Self::Text => "txt", Self::Json => "json" }
    }
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub max_bytes: u64,
    pub high_water: f64,
    pub low_water: f64,
    pub kind: CacheKind,
}

impl CacheOptions {
    pub fn from_config(cfg: &CacheConfig, kind: CacheKind) -> Self {
        Self { max_bytes: cfg.max_bytes, high_water: cfg.high_water, low_water: cfg.low_water, kind }
    }
}

impl Default for CacheOptions {
    fn default() -> Self { Self::from_config(&CacheConfig::default(), CacheKind::Text) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnswer {
    pub payload: String,
    pub extra_meta: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    NotFound,
    Expired,
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(CachedAnswer),
    Miss(MissReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    pub freed: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub namespace: String,
    pub approx_bytes: u64,
    pub max_bytes: u64,
    pub entries: usize,
}

/// One namespace of the on-disk answer cache.
///
/// Layout is `<root>/<namespace>/<h[0..2]>/<h[2..4]>/<hash>.<ext>`. Safe to
/// share across threads: the byte counter is atomic and purges are serialized.
pub struct ResponseCache {
    ns: Namespace,
    opts: CacheOptions,
    clock: Arc<dyn Clock>,
    purge_lock: Mutex<()>,
}

impl ResponseCache {
    pub fn open(root: impl AsRef<Path>, namespace: &str, opts: CacheOptions) -> Result<Self, CacheError> {
        Self::open_with_clock(root, namespace, opts, Arc::new(SystemClock))
    }

    pub fn open_with_clock(root: impl AsRef<Path>, namespace: &str, opts: CacheOptions, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        let ns = Namespace::open(root.as_ref(), namespace, opts.kind.ext())?;
        tracing::debug!(namespace, bytes = ns.bytes(), max_bytes = opts.max_bytes, "cache namespace opened");
        Ok(Self { ns, opts, clock, purge_lock: Mutex::new(()) })
    }

    pub fn hash_key(&self, key: &str) -> String { hash_key(self.ns.name(), key) }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        let h = self.hash_key(key);
        self.ns.dir().join(&h[..2]).join(&h[2..4]).join(format!("{h}.{}", self.opts.kind.ext()))
    }

    pub fn get(&self, key: &str) -> Lookup {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Lookup::Miss(MissReason::NotFound),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry");
                return Lookup::Miss(MissReason::Malformed);
            }
        };
        let (mut header, payload) = match entry::decode(&bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed cache entry");
                return Lookup::Miss(MissReason::Malformed);
            }
        };
        let now = self.clock.now();
        if header.is_expired(now) {
            tracing::debug!(path = %path.display(), "cache entry expired");
            return Lookup::Miss(MissReason::Expired);
        }

        header.last = now;
        match self.write_entry(&path, &header, &payload) {
            Ok(written) => {
                self.ns.add_bytes(written);
                self.ns.sub_bytes(bytes.len() as u64);
            }
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "could not refresh last-access time"),
        }
        Lookup::Hit(CachedAnswer { payload, extra_meta: header.extra_meta })
    }

    pub fn get_payload(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Lookup::Hit(hit) => Some(hit.payload),
            Lookup::Miss(_) => None,
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry, and returns
    /// the hashed key. May trigger a purge.
    pub fn add(&self, key: &str, payload: &str, ttl: Option<Duration>, extra_meta: Option<Map<String, Value>>) -> Result<String, CacheError> {
        let hashed = self.hash_key(key);
        let path = self.entry_path(&hashed);
        let now = self.clock.now();
        let header = EntryHeader { created: now, last: now, ttl: ttl.map(|d| d.as_secs_f64()), orig_key: key.to_string(), extra_meta };
        let previous = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let written = self.write_entry(&path, &header, payload)?;
        self.ns.add_bytes(written);
        self.ns.sub_bytes(previous);
        tracing::debug!(key = %hashed, bytes = written, total = self.ns.bytes(), "cache entry stored");

        if self.ns.bytes() as f64 >= self.opts.high_water * self.opts.max_bytes as f64 {
            let report = self.purge();
            tracing::info!(namespace = %self.ns.name(), removed = report.removed, freed = report.freed, remaining = report.remaining, "cache purged");
        }
        Ok(hashed)
    }

    /// Deletes oldest-modified entries until the counter is at or below the
    /// low-water mark. Files that cannot be removed are skipped.
    pub fn purge(&self) -> PurgeReport {
        let _guard = self.purge_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let target = (self.opts.low_water * self.opts.max_bytes as f64) as u64;
        let mut report = PurgeReport { removed: 0, freed: 0, remaining: self.ns.bytes() };
        if report.remaining <= target { return report; }

        let mut files = self.ns.entry_files();
        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        for file in files {
            if self.ns.bytes() <= target { break; }
            match fs::remove_file(&file.path) {
                Ok(()) => {
                    self.ns.sub_bytes(file.size);
                    report.removed += 1;
                    report.freed += file.size;
                }
                Err(e) => tracing::warn!(path = %file.path.display(), error = %e, "could not evict cache entry"),
            }
        }
        report.remaining = self.ns.bytes();
        if let Err(e) = self.ns.save() {
            tracing::warn!(namespace = %self.ns.name(), error = %e, "could not save cache meta after purge");
        }
        report
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            namespace: self.ns.name().to_string(),
            approx_bytes: self.ns.bytes(),
            max_bytes: self.opts.max_bytes,
            entries: self.ns.entry_files().len(),
        }
    }

    /// Persists the byte counter. Also runs on drop.
    pub fn flush(&self) -> Result<(), CacheError> { self.ns.save() }

    fn write_entry(&self, path: &Path, header: &EntryHeader, payload: &str) -> Result<u64, CacheError> {
        let bytes = entry::encode(header, payload)?;
        let dir = path.parent().unwrap_or(self.ns.dir());
        fs::create_dir_all(dir)?;
        let store_err = |source: std::io::Error| CacheError::Store { path: path.to_path_buf(), source };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(store_err)?;
        tmp.write_all(&bytes).map_err(store_err)?;
        tmp.as_file().sync_all().map_err(store_err)?;
        tmp.persist(path).map_err(|e| store_err(e.error))?;
        Ok(bytes.len() as u64)
    }
}

impl Drop for ResponseCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(namespace = %self.ns.name(), error = %e, "could not save cache meta on shutdown");
        }
    }
}

//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_RETRIEVAL__TOP_K=8`). Provides helpers to expand `~` and `${VAR}` and to
//! resolve relative paths against the directory the config was loaded from.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: base_dir.to_path_buf() };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view of the whole configuration with paths resolved.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.paths = settings.paths.resolved(&self.base_dir);
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub retrieval: RetrievalConfig,
    pub guardrails: GuardrailsConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub cache_dir: PathBuf,
    pub lexical_log: PathBuf,
    /// JSON snapshot of the reference in-memory vector index.
    pub vector_store: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            lexical_log: PathBuf::from("store/lexical_corpus.jsonl"),
            vector_store: PathBuf::from("store/vectors.json"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PathsConfig {
    fn resolved(self, base: &Path) -> Self {
        Self {
            cache_dir: resolve_with_base(base, self.cache_dir.to_string_lossy()),
            lexical_log: resolve_with_base(base, self.lexical_log.to_string_lossy()),
            vector_store: resolve_with_base(base, self.vector_store.to_string_lossy()),
            data_dir: resolve_with_base(base, self.data_dir.to_string_lossy()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Fused results handed to generation.
    pub top_k: usize,
    /// Candidates requested from each source list before fusion.
    pub candidate_k: usize,
    pub rrf_k: usize,
    /// Lexical weight in the blended quality score.
    pub alpha: f64,
    /// `l2` or `cosine`; anything else falls back to min-max over `-distance`.
    pub dense_metric: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5, candidate_k: 20, rrf_k: 60, alpha: 0.5, dense_metric: "l2".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailsConfig {
    pub allow_only_tech: bool,
    pub block_private: bool,
    pub min_query_len: usize,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self { allow_only_tech: false, block_private: true, min_query_len: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Byte budget per namespace.
    pub max_bytes: u64,
    pub high_water: f64,
    pub low_water: f64,
    /// Minimum Jaccard overlap for a cached RAG answer to be served.
    pub freshness_tau: f64,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_bytes: 2 * 1024 * 1024 * 1024, high_water: 0.9, low_water: 0.7, freshness_tau: 0.8, ttl_secs: None }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if r.candidate_k < r.top_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.candidate_k ({}) must not be below retrieval.top_k ({})",
                r.candidate_k, r.top_k
            )));
        }
        let c = &self.cache;
        if c.max_bytes == 0 {
            return Err(Error::InvalidConfig("cache.max_bytes must be positive".into()));
        }
        if !(0.0 < c.low_water && c.low_water <= c.high_water && c.high_water <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "cache water marks must satisfy 0 < low ({}) <= high ({}) <= 1",
                c.low_water, c.high_water
            )));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use voba_cache::{CacheKind, CacheOptions, RagCache, ResponseCache};
use voba_core::config::Settings;
use voba_core::data_processor::DataProcessor;
use voba_core::traits::Generator;
use voba_embed::HashEmbedder;
use voba_guard::ContentFilter;
use voba_hybrid::{HybridRetriever, IngestReport, RagPipeline};
use voba_text::LexicalIndex;
use voba_vector::{DistanceMetric, MemoryVectorIndex};

pub type Retriever = HybridRetriever<MemoryVectorIndex>;

pub const RAG_NAMESPACE: &str = "rag";
pub const CHAT_NAMESPACE: &str = "chat";

/// Chunks embedded and indexed per step while ingesting.
const INDEX_BATCH: usize = 64;

pub fn open_retriever(settings: &Settings) -> Result<Retriever> {
    let metric = DistanceMetric::parse(&settings.retrieval.dense_metric).unwrap_or_else(|| {
        tracing::warn!(metric = %settings.retrieval.dense_metric, "vector index has no such metric, using l2 distances");
        DistanceMetric::L2
    });
    let vectors = MemoryVectorIndex::open(&settings.paths.vector_store, metric)?;
    let lexical = LexicalIndex::open(&settings.paths.lexical_log)?;
    Ok(HybridRetriever::new(Box::new(HashEmbedder::default()), vectors, lexical, settings.retrieval.clone()))
}

/// The RAG and chat namespaces under `paths.cache_dir`.
pub fn open_caches(settings: &Settings) -> Result<(RagCache, ResponseCache)> {
    let opts = CacheOptions::from_config(&settings.cache, CacheKind::Text);
    let ttl = settings.cache.ttl_secs.map(Duration::from_secs);
    let rag = ResponseCache::open(&settings.paths.cache_dir, RAG_NAMESPACE, opts.clone())?;
    let chat = ResponseCache::open(&settings.paths.cache_dir, CHAT_NAMESPACE, opts)?;
    Ok((RagCache::new(rag, settings.cache.freshness_tau).with_ttl(ttl), chat))
}

pub fn open_pipeline(settings: &Settings, generator: Box<dyn Generator>) -> Result<RagPipeline<MemoryVectorIndex>> {
    let (rag, chat) = open_caches(settings)?;
    let ttl = settings.cache.ttl_secs.map(Duration::from_secs);
    Ok(RagPipeline::new(open_retriever(settings)?, generator, ContentFilter::from_config(&settings.guardrails))
        .with_rag_cache(rag)
        .with_chat_cache(chat, ttl))
}

/// Chunks every `.txt` file under `data_dir`, indexes the new chunks and
/// saves the vector snapshot.
pub fn index_directory(retriever: &mut Retriever, data_dir: &Path, show_progress: bool) -> Result<IngestReport> {
    let chunks = DataProcessor::new().process_directory(data_dir)?;
    let pb = if show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));

    let mut total = IngestReport::default();
    for batch in chunks.chunks(INDEX_BATCH) {
        let report = retriever.index(batch)?;
        total.added += report.added;
        total.skipped += report.skipped;
        pb.inc(batch.len() as u64);
        pb.set_message(format!("{} new", total.added));
    }
    pb.finish_with_message(format!("{} new, {} already indexed", total.added, total.skipped));

    retriever.vectors().save()?;
    tracing::info!(dir = %data_dir.display(), added = total.added, skipped = total.skipped, "directory indexed");
    Ok(total)
}

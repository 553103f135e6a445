use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use voba_cache::{CacheStats, PurgeReport};
use voba_cli::{index_directory, open_caches, open_pipeline, open_retriever, ExtractiveGenerator};
use voba_core::config::Config;
use voba_guard::{looks_suspicious, redact};

#[derive(Parser)]
#[command(name = "voba", version, about = "Offline hybrid retrieval with guarded, cached answers")]
struct Cli {
    /// Directory holding config.toml; relative paths resolve against it
    #[arg(short, long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk and index every .txt file under DIR (defaults to paths.data_dir)
    Index { dir: Option<PathBuf> },
    /// Show fused retrieval results for QUERY
    Search { query: String },
    /// Answer QUESTION from the indexed documents
    Ask { question: String },
    /// Chat without retrieval
    Chat { message: String },
    /// Redact secrets and personal data from TEXT
    Redact { text: String },
    /// Inspect or trim the answer caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    Stats,
    Purge,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn print_stats(s: &CacheStats) {
    println!("📦 {:<6} {:>6} entries  {:>12} / {} bytes", s.namespace, s.entries, s.approx_bytes, s.max_bytes);
}

fn print_purge(namespace: &str, r: &PurgeReport) {
    println!("🧹 {namespace}: removed {} entries, freed {} bytes, {} bytes remain", r.removed, r.freed, r.remaining);
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    match cli.command {
        Command::Index { dir } => {
            let data_dir = dir.unwrap_or_else(|| settings.paths.data_dir.clone());
            println!("Data directory: {}", data_dir.display());
            let mut retriever = open_retriever(&settings)?;
            let report = index_directory(&mut retriever, &data_dir, !cli.json)?;
            if cli.json {
                println!("{}", serde_json::json!({ "added": report.added, "skipped": report.skipped }));
            } else {
                println!("\n✅ Indexing complete: {} new chunks, {} already indexed", report.added, report.skipped);
                println!("📊 Lexical corpus: {} chunks, vectors: {}", retriever.lexical().len(), retriever.vectors().len());
            }
        }
        Command::Search { query } => {
            let results = open_retriever(&settings)?.retrieve(&query)?;
            if cli.json {
                let rows: Vec<_> = results
                    .iter()
                    .map(|r| serde_json::json!({
                        "label": r.chunk.label(),
                        "fused_score": r.fused_score,
                        "score": r.normalized_score,
                        "dense_rank": r.dense_rank,
                        "lexical_rank": r.lexical_rank,
                        "text": r.chunk.text,
                    }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if results.is_empty() {
                println!("No results for '{}'", query);
            } else {
                for (i, r) in results.iter().enumerate() {
                    let snippet: String = r.chunk.text.chars().take(100).collect();
                    println!("{:>2}. [{}] score={:.3} rrf={:.4}\n    {}", i + 1, r.chunk.label(), r.normalized_score, r.fused_score, snippet.replace('\n', " "));
                }
            }
        }
        Command::Ask { question } => {
            let pipeline = open_pipeline(&settings, Box::new(ExtractiveGenerator))?;
            let resp = pipeline.ask(&question)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                    "answer": resp.answer,
                    "sources": resp.sources,
                    "cache": resp.outcome.map(|o| format!("{o:?}")),
                    "refused": resp.refused,
                    "redacted": resp.any_redacted,
                    "suspicious": resp.any_suspicious,
                }))?);
            } else {
                println!("{}", resp.answer);
                if !resp.sources.is_empty() {
                    println!("\nSources:");
                    for s in &resp.sources { println!("  - {}#{} ({:.3})", s.source_file, s.chunk_index, s.score); }
                }
                if resp.any_suspicious { println!("⚠️  Some retrieved text looked like instructions and was withheld"); }
            }
        }
        Command::Chat { message } => {
            let answer = open_pipeline(&settings, Box::new(ExtractiveGenerator))?.chat(&message)?;
            if cli.json { println!("{}", serde_json::json!({ "answer": answer })); } else { println!("{answer}"); }
        }
        Command::Redact { text } => {
            let r = redact(&text);
            let suspicious = looks_suspicious(&text);
            if cli.json {
                println!("{}", serde_json::json!({ "text": r.text, "redacted": r.was_redacted, "suspicious": suspicious }));
            } else {
                println!("{}", r.text);
                if suspicious { println!("⚠️  Text looks like an instruction to the assistant"); }
            }
        }
        Command::Cache { action } => {
            let (rag, chat) = open_caches(&settings)?;
            let caches = [rag.cache(), &chat];
            match action {
                CacheAction::Stats => {
                    let stats: Vec<CacheStats> = caches.iter().map(|c| c.stats()).collect();
                    if cli.json {
                        let rows: Vec<_> = stats.iter().map(|s| serde_json::json!({ "namespace": s.namespace, "entries": s.entries, "approx_bytes": s.approx_bytes, "max_bytes": s.max_bytes })).collect();
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    } else {
                        stats.iter().for_each(print_stats);
                    }
                }
                CacheAction::Purge => {
                    for c in caches {
                        let report = c.purge();
                        print_purge(&c.stats().namespace, &report);
                    }
                }
            }
        }
    }
    Ok(())
}

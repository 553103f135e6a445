//! Reference paragraph chunker over `.txt` files.
//!
//! Stands in for the document conversion collaborator so the CLI and tests can
//! build a corpus without an OCR stack.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

use crate::error::Error;
use crate::types::Chunk;

/// Chunks shorter than this after normalisation are dropped as junk.
const MIN_CHUNK_CHARS: usize = 10;
const WORDS_PER_TOKEN: f32 = 0.75;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 500, overlap_percent: 0.20 }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("data directory {}", data_dir.display())).into());
        }
        let files = txt_files(data_dir);
        if files.is_empty() {
            tracing::info!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut chunks = Vec::new();
        for (n, path) in files.iter().enumerate() {
            tracing::debug!(file = %path.display(), "chunking file {}/{}", n + 1, files.len());
            let bytes = fs::read(path)?;
            chunks.extend(self.chunk_content(&String::from_utf8_lossy(&bytes), path));
        }
        tracing::info!(files = files.len(), chunks = chunks.len(), "processed data directory");
        Ok(chunks)
    }

    /// Splits on blank lines; paragraphs over `max_tokens` are windowed with overlap.
    pub fn chunk_content(&self, content: &str, file_path: &Path) -> Vec<Chunk> {
        let source_file = fs::canonicalize(file_path).unwrap_or_else(|_| file_path.to_path_buf()).to_string_lossy().to_string();
        let pieces = content.split("\n\n").map(normalize_text).filter(|p| p.chars().count() >= MIN_CHUNK_CHARS).flat_map(|p| {
            if approx_tokens(&p) <= self.chunking_config.max_tokens { vec![p] } else { self.window(&p) }
        });
        pieces
            .enumerate()
            .map(|(idx, text)| {
                let chunk_index = idx as i64;
                let id = stable_chunk_id(&source_file, chunk_index, -1, "text", &text);
                Chunk { id, text, source_file: source_file.clone(), chunk_index, page: -1, kind: "text".to_string() }
            })
            .collect()
    }

    fn window(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let size = ((self.chunking_config.max_tokens as f32 * WORDS_PER_TOKEN) as usize).max(1);
        let overlap = (size as f32 * self.chunking_config.overlap_percent) as usize;
        let mut out = Vec::new();
        let mut from = 0;
        loop {
            let to = words.len().min(from + size);
            out.push(words[from..to].join(" "));
            if to == words.len() { return out; }
            from = (to - overlap).max(from + 1);
        }
    }
}

/// Rough whitespace-word token estimate.
fn approx_tokens(text: &str) -> usize { (text.split_whitespace().count() as f32 / WORDS_PER_TOKEN) as usize }

fn txt_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "txt"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Content hash over source, position metadata and a hash of the text, so
/// re-ingesting an unchanged file yields the same ids.
pub fn stable_chunk_id(source_file: &str, chunk_index: i64, page: i64, kind: &str, text: &str) -> String {
    let payload = serde_json::json!({
        "src": source_file,
        "meta": { "chunk_index": chunk_index, "page": page, "source_file": source_file, "type": kind },
        "text": blake3::hash(text.as_bytes()).to_hex().to_string(),
    });
    blake3::hash(payload.to_string().as_bytes()).to_hex().to_string()
}

/// NFKC, ligature and soft-hyphen cleanup, whitespace tidy.
pub fn normalize_text(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    let cleaned = nfkc
        .replace('\u{00AD}', "")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");
    cleaned
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

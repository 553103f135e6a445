use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use voba_core::types::ChunkId;

use crate::tantivy_utils::{build_schema, register_tokenizer, LexicalFields};
use crate::tokenize::tokenize;

/// Smallest per-thread budget tantivy accepts.
const WRITER_HEAP_BYTES: usize = 15_000_000;

/// One line of the lexical log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
	pub id: ChunkId,
	pub tokens: Vec<String>,
}

/// BM25 index over every record ever appended to the log.
pub struct LexicalIndex {
	log_path: PathBuf,
	writer: IndexWriter,
	reader: IndexReader,
	fields: LexicalFields,
	ids: HashSet<ChunkId>,
	// ids in log order; ranks documents that share no term with a query
	order: Vec<ChunkId>,
	num_docs: usize,
}

impl LexicalIndex {
	/// Opens the index backed by `log_path`, replaying whatever is there.
	/// A missing log is an empty index.
	pub fn open(log_path: impl Into<PathBuf>) -> Result<Self> {
		let (writer, reader, fields) = Self::fresh_index()?;
		let mut this = Self { log_path: log_path.into(), writer, reader, fields, ids: HashSet::new(), order: Vec::new(), num_docs: 0 };
		this.load()?;
		Ok(this)
	}

	fn fresh_index() -> Result<(IndexWriter, IndexReader, LexicalFields)> {
		let (schema, fields) = build_schema();
		let index = Index::create_in_ram(schema);
		register_tokenizer(&index);
		let writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok((writer, reader, fields))
	}

	/// Rebuilds the in-memory index from the log. Lines that do not parse are
	/// skipped, including a torn final line left by an interrupted append.
	pub fn load(&mut self) -> Result<()> {
		let (writer, reader, fields) = Self::fresh_index()?;
		self.writer = writer; self.reader = reader; self.fields = fields;
		self.ids.clear(); self.order.clear(); self.num_docs = 0;

		let content = match fs::read_to_string(&self.log_path) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(log = %self.log_path.display(), "lexical log absent, starting empty");
				return Ok(());
			}
			Err(e) => return Err(e.into()),
		};

		let mut skipped = 0usize;
		for (line_no, line) in content.lines().enumerate() {
			if line.trim().is_empty() { continue; }
			match serde_json::from_str::<LogRecord>(line) {
				Ok(record) => self.index_record(&record)?,
				Err(e) => {
					skipped += 1;
					tracing::warn!(log = %self.log_path.display(), line = line_no + 1, error = %e, "skipping malformed lexical log line");
				}
			}
		}
		self.commit()?;
		tracing::info!(docs = self.num_docs, skipped, "lexical index loaded");
		Ok(())
	}

	/// Tokenizes and appends each `(id, text)` pair to the log, then makes the
	/// new documents searchable together with everything indexed before.
	pub fn add(&mut self, ids: &[ChunkId], texts: &[String]) -> Result<()> {
		anyhow::ensure!(ids.len() == texts.len(), "ids ({}) and texts ({}) differ in length", ids.len(), texts.len());
		if ids.is_empty() { return Ok(()); }
		let records: Vec<LogRecord> = ids.iter().zip(texts).map(|(id, text)| LogRecord { id: id.clone(), tokens: tokenize(text) }).collect();

		if let Some(parent) = self.log_path.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
		// a torn tail, from an interrupted append or otherwise, is closed off
		// so it cannot swallow the first new record
		let torn = ends_mid_line(&self.log_path)?;
		let file = OpenOptions::new().create(true).append(true).open(&self.log_path)?;
		let mut out = BufWriter::new(file);
		if torn { out.write_all(b"\n")?; }
		for record in &records {
			serde_json::to_writer(&mut out, record)?;
			out.write_all(b"\n")?;
		}
		out.flush()?;

		for record in &records { self.index_record(record)?; }
		self.commit()?;
		tracing::debug!(added = records.len(), total = self.num_docs, "lexical documents appended");
		Ok(())
	}

	/// Top `top_k` documents by descending BM25 score. Every indexed document
	/// is ranked: those sharing no term with the query follow the matches at
	/// score 0, in log order.
	pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<(ChunkId, f32)>> {
		if top_k == 0 || self.num_docs == 0 { return Ok(vec![]); }
		let terms = tokenize(query);
		let mut hits: Vec<(ChunkId, f32)> = Vec::with_capacity(top_k);
		if !terms.is_empty() {
			let clauses: Vec<(Occur, Box<dyn Query>)> = terms
				.iter()
				.map(|t| {
					let q: Box<dyn Query> = Box::new(TermQuery::new(Term::from_field_text(self.fields.tokens, t), IndexRecordOption::WithFreqs));
					(Occur::Should, q)
				})
				.collect();
			let query = BooleanQuery::new(clauses);
			let searcher = self.reader.searcher();
			for (score, addr) in searcher.search(&query, &TopDocs::with_limit(top_k))? {
				let doc: TantivyDocument = searcher.doc(addr)?;
				let id = doc.get_first(self.fields.id).and_then(|v| v.as_str()).unwrap_or("").to_string();
				hits.push((id, score));
			}
		}
		if hits.len() < top_k {
			let mut seen: HashSet<ChunkId> = hits.iter().map(|(id, _)| id.clone()).collect();
			for id in &self.order {
				if hits.len() == top_k { break; }
				if seen.insert(id.clone()) { hits.push((id.clone(), 0.0)); }
			}
		}
		Ok(hits)
	}

	pub fn contains(&self, id: &str) -> bool { self.ids.contains(id) }

	pub fn len(&self) -> usize { self.num_docs }

	pub fn is_empty(&self) -> bool { self.num_docs == 0 }

	pub fn log_path(&self) -> &Path { &self.log_path }

	fn index_record(&mut self, record: &LogRecord) -> Result<()> {
		self.writer.add_document(doc!(
			self.fields.id => record.id.clone(),
			self.fields.tokens => record.tokens.join(" "),
		))?;
		if self.ids.insert(record.id.clone()) { self.order.push(record.id.clone()); }
		self.num_docs += 1;
		Ok(())
	}

	fn commit(&mut self) -> Result<()> {
		self.writer.commit()?;
		self.reader.reload()?;
		Ok(())
	}
}

fn ends_mid_line(path: &Path) -> Result<bool> {
	let mut file = match File::open(path) {
		Ok(file) => file,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
		Err(e) => return Err(e.into()),
	};
	if file.metadata()?.len() == 0 { return Ok(false); }
	let mut last = [0u8; 1];
	file.seek(SeekFrom::End(-1))?;
	file.read_exact(&mut last)?;
	Ok(last[0] != b'\n')
}

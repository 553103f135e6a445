use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STRING, STORED};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

/// Documents are indexed as pre-tokenized, space-joined terms.
pub const TOKENS_TOKENIZER: &str = "pretokenized";

pub struct LexicalFields {
	pub id: Field,
	pub tokens: Field,
}

pub fn build_schema() -> (Schema, LexicalFields) {
	let mut schema_builder = Schema::builder();
	let id = schema_builder.add_text_field("id", STRING | STORED);
	let indexing = TextFieldIndexing::default().set_tokenizer(TOKENS_TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let tokens = schema_builder.add_text_field("tokens", TextOptions::default().set_indexing_options(indexing));
	(schema_builder.build(), LexicalFields { id, tokens })
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
	index.tokenizers().register(TOKENS_TOKENIZER, tokenizer);
}

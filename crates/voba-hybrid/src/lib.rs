//! voba-hybrid
//!
//! Hybrid retrieval: reciprocal-rank fusion of dense and lexical candidates,
//! score normalisation, prompt assembly and the request pipeline that ties
//! guardrails and the answer caches together.
pub mod fusion;
pub mod normalize;
pub mod prompt;
pub mod retriever;
pub mod pipeline;

pub use fusion::{fuse, DEFAULT_RRF_K};
pub use normalize::normalize;
pub use pipeline::{PipelineResponse, RagPipeline, Source};
pub use retriever::{HybridRetriever, IngestReport};

//! voba-cache
//!
//! Content-addressed answer cache on the local filesystem. Entries are single
//! files written through temp-and-rename, sharded by hash prefix, bounded by
//! an optional TTL and a per-namespace byte budget. `invalidate` and `rag`
//! add the retrieval-aware freshness check used for RAG answers.
pub mod clock;
pub mod entry;
pub mod error;
pub mod invalidate;
pub mod key;
pub mod namespace;
pub mod rag;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CacheError;
pub use invalidate::{is_fresh, jaccard, DEFAULT_TAU};
pub use rag::{RagAnswer, RagCache, RagOutcome};
pub use store::{CacheKind, CacheOptions, CacheStats, CachedAnswer, Lookup, MissReason, PurgeReport, ResponseCache};

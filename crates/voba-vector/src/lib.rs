//! voba-vector
//!
//! Brute-force in-memory vector index behind the `VectorIndex` seam, with an
//! optional JSON snapshot so the CLI keeps its corpus between runs.
pub mod metric;
pub mod memory;

pub use memory::MemoryVectorIndex;
pub use metric::DistanceMetric;

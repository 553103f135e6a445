//! voba-cli
//!
//! Wiring for the `voba` binary: opens the indexes and caches described by
//! the loaded configuration and provides an offline extractive generator so
//! the whole pipeline runs without a language model.
pub mod app;
pub mod generator;

pub use app::{index_directory, open_caches, open_pipeline, open_retriever, Retriever};
pub use generator::{ExtractiveGenerator, NO_ANSWER, OFFLINE_CHAT_REPLY};

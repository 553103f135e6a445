//! voba-core
//!
//! Shared domain types, collaborator traits, configuration and the reference
//! paragraph chunker used by the other `voba-*` crates.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

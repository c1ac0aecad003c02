//! Core pipelines for qagraph.
//!
//! This crate ties the NLP service clients to the dataset formats: graph
//! fusion over coreference and dependency output, dataset reshaping, and the
//! batch runners that read and write the JSON files.

pub mod cache;
pub mod graph;
pub mod pipeline;
pub mod reshape;

#[cfg(test)]
mod testing;

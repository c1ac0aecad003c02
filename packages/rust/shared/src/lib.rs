//! Shared types, error model, and configuration for qagraph.
//!
//! This crate is the foundation depended on by all other qagraph crates.
//! It provides:
//! - [`QaGraphError`], the unified error type
//! - Dataset types ([`SquadDataset`], [`FlatRecord`], [`SplitRecord`], [`FusedGraph`])
//! - Configuration ([`AppConfig`], [`ServiceEndpoints`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, CacheScope, ServiceEndpoints, ServicesConfig, config_dir,
    config_file_path, init_config, init_config_in, load_config, load_config_from,
};
pub use error::{QaGraphError, Result};
pub use types::{
    COREF_EDGE, ContextAnnotation, FlatRecord, FusedGraph, GraphEdge, NEIGH_EDGE, SplitRecord,
    SquadAnswer, SquadDataset, SquadParagraph, SquadQa, SquadTopic, TextAnnotation,
};

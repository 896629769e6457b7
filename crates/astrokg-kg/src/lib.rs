//! astrokg-kg: Knowledge graph construction and graph store access.
//!
//! Build side: relation candidate extraction, aggregation, importance scoring
//! and filtering, graph analysis, and the batch pipeline that ties them to the
//! on-disk artifacts. Serving side: the [`GraphStore`] contract with its Neo4j
//! and in-memory implementations, the LRU cache and the failover wrapper.

pub mod parse;
pub mod patterns;
pub mod extraction;
pub mod aggregation;
pub mod scoring;
pub mod analysis;
pub mod artifacts;
pub mod pipeline;

pub mod repository;
pub mod graph_query;
pub mod memory_repository;
pub mod neo4j_repository;
pub mod cache;
pub mod failover;
pub mod deploy;

pub use aggregation::aggregate_relations;
pub use analysis::{analyze_graph, GraphAnalysis};
pub use extraction::{PaperInput, RelationExtractor};
pub use graph_query::{GraphIntent, GraphQuery, GraphRow};
pub use pipeline::{BuildPipeline, BuildSummary};
pub use repository::{EntitySummary, GraphStore, GraphStoreError, RelationView, StoreResult};
pub use scoring::{filter_graph, score_entities, EntityScore, FilteringReport};
pub use memory_repository::MemoryGraphStore;
pub use neo4j_repository::Neo4jGraphStore;
pub use cache::CachedGraphStore;
pub use failover::{cached_failover, connect_graph_store, FailoverGraphStore};
pub use deploy::{deploy_from_dir, deploy_graph, DeployError, DeployOptions, DeployReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("NER error: {0}")]
    Ner(#[from] astrokg_ner::NerError),

    #[error("Malformed parse for paper {paper_id}: {reason}")]
    MalformedParse { paper_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BuildError>;

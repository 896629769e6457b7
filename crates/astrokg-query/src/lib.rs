//! astrokg-query: hybrid natural-language queries.
//!
//! [`QueryEngine::run_query`] classifies a free-text query as SQL, GRAPH or
//! HYBRID and answers it from the relational store, the graph store, or both.
//! [`GraphQueryTranslator`] turns graph questions into parameterized
//! [`GraphQuery`](astrokg_kg::GraphQuery) values.

pub mod classify;
pub mod translator;
pub mod result;
pub mod engine;

pub use classify::{classify, QueryClass};
pub use engine::QueryEngine;
pub use result::{GraphResult, QueryResult, SqlResult, SqlRule};
pub use translator::{example_queries, GraphQueryTranslator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Graph store error: {0}")]
    Graph(#[from] astrokg_kg::GraphStoreError),

    #[error("Relational store error: {0}")]
    Database(#[from] astrokg_db::DbError),

    #[error("Invalid query pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;

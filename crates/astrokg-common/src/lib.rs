//! astrokg-common: Shared types, errors and configuration used across all astrokg crates.

pub mod error;
pub mod entities;
pub mod config;

// Re-export commonly used types
pub use error::{AstroError, Result};
pub use entities::{
    Entity, EntityMention, EntityType, ExtractionMethod, FilteredGraph, RawMention, Relation,
    RelationCandidate, RelationType,
};
pub use config::{AppConfig, BuildConfig, DatabaseConfig, GraphBackendKind, GraphConfig, ServerConfig};

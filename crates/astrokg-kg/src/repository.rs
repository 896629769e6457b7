//! Graph store contract.
//!
//! Every serving-side backend (Neo4j, in-memory, and the cache and failover
//! wrappers around them) implements [`GraphStore`]. Callers hold an
//! `Arc<dyn GraphStore>` chosen once at startup.

use std::time::Duration;

use astrokg_common::{Entity, EntityType, Relation, RelationType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph_query::{GraphQuery, GraphRow};
use crate::BuildError;

pub const DEFAULT_ENTITY_LIMIT: usize = 50;
pub const DEFAULT_PAPER_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("Graph store not configured: {0}")]
    NotConfigured(String),

    #[error("Graph backend error: {0}")]
    Backend(String),

    #[error("Graph call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Graph artifacts unavailable: {0}")]
    Artifacts(#[from] BuildError),
}

pub type StoreResult<T> = std::result::Result<T, GraphStoreError>;

/// Entity row as returned by lookups and listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub importance_score: Option<f64>,
    pub paper_count: usize,
    pub relation_count: Option<usize>,
}

impl From<&Entity> for EntitySummary {
    fn from(entity: &Entity) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            name: entity.name.clone(),
            entity_type: entity.entity_type.as_str().to_string(),
            importance_score: entity.importance_score,
            paper_count: entity.paper_count(),
            relation_count: entity.relation_count,
        }
    }
}

/// One edge touching an entity, with endpoint names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationView {
    pub source: String,
    pub source_id: String,
    pub relation: String,
    pub target: String,
    pub target_id: String,
    pub evidence_count: usize,
    pub confidence: f64,
    pub papers: Vec<String>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short name for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Entities ordered by importance, optionally of one type.
    async fn get_entities(&self, entity_type: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>>;

    /// Case-insensitive exact name lookup.
    async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>>;

    /// Paper ids the entity appears in. Unknown ids yield an empty list.
    async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>>;

    /// Edges where the entity is source or target.
    async fn get_entity_relations(
        &self,
        entity_id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<RelationView>>;

    async fn upsert_entity(&self, entity: &Entity) -> StoreResult<()>;

    /// Record that `paper_id` mentions the entity.
    async fn upsert_paper(&self, entity_id: &str, paper_id: &str) -> StoreResult<()>;

    async fn create_relation(&self, relation: &Relation) -> StoreResult<()>;

    async fn run_translated(&self, query: &GraphQuery) -> StoreResult<Vec<GraphRow>>;

    async fn close(&self) -> StoreResult<()>;
}

//! LRU caches in front of the hot graph lookups.
//!
//! `get_related_papers` and `get_entity_by_name` results are cached by their
//! arguments and never invalidated. Errors pass through uncached. Everything
//! else is forwarded.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use astrokg_common::{Entity, EntityType, Relation, RelationType};
use async_trait::async_trait;
use lru::LruCache;
use tracing::debug;

use crate::graph_query::{GraphQuery, GraphRow};
use crate::repository::{EntitySummary, GraphStore, RelationView, StoreResult};

pub const DEFAULT_RELATED_PAPERS_CAPACITY: usize = 100;
pub const DEFAULT_ENTITY_NAME_CAPACITY: usize = 50;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn capacity(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

pub struct CachedGraphStore {
    inner: Arc<dyn GraphStore>,
    related_papers: Mutex<LruCache<(String, usize), Vec<String>>>,
    entity_names: Mutex<LruCache<String, Option<EntitySummary>>>,
}

impl CachedGraphStore {
    pub fn new(inner: Arc<dyn GraphStore>) -> Self {
        Self::with_capacity(inner, DEFAULT_RELATED_PAPERS_CAPACITY, DEFAULT_ENTITY_NAME_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn GraphStore>, related_papers: usize, entity_names: usize) -> Self {
        Self {
            inner,
            related_papers: Mutex::new(LruCache::new(capacity(related_papers))),
            entity_names: Mutex::new(LruCache::new(capacity(entity_names))),
        }
    }

    /// Entries currently held (related papers, entity names).
    pub fn cached_entries(&self) -> (usize, usize) {
        (lock(&self.related_papers).len(), lock(&self.entity_names).len())
    }
}

#[async_trait]
impl GraphStore for CachedGraphStore {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn get_entities(&self, entity_type: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>> {
        self.inner.get_entities(entity_type, limit).await
    }

    async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>> {
        let key = name.trim().to_lowercase();
        {
            let mut cache = lock(&self.entity_names);
            if let Some(hit) = cache.get(&key) {
                debug!("Entity name cache hit for '{}'", key);
                return Ok(hit.clone());
            }
        }
        let found = self.inner.get_entity_by_name(name).await?;
        lock(&self.entity_names).put(key, found.clone());
        Ok(found)
    }

    async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        let key = (entity_id.to_string(), limit);
        {
            let mut cache = lock(&self.related_papers);
            if let Some(hit) = cache.get(&key) {
                debug!("Related papers cache hit for {}", entity_id);
                return Ok(hit.clone());
            }
        }
        let papers = self.inner.get_related_papers(entity_id, limit).await?;
        lock(&self.related_papers).put(key, papers.clone());
        Ok(papers)
    }

    async fn get_entity_relations(
        &self,
        entity_id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<RelationView>> {
        self.inner.get_entity_relations(entity_id, relation_type).await
    }

    async fn upsert_entity(&self, entity: &Entity) -> StoreResult<()> {
        self.inner.upsert_entity(entity).await
    }

    async fn upsert_paper(&self, entity_id: &str, paper_id: &str) -> StoreResult<()> {
        self.inner.upsert_paper(entity_id, paper_id).await
    }

    async fn create_relation(&self, relation: &Relation) -> StoreResult<()> {
        self.inner.create_relation(relation).await
    }

    async fn run_translated(&self, query: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
        self.inner.run_translated(query).await
    }

    async fn close(&self) -> StoreResult<()> {
        self.inner.close().await
    }
}

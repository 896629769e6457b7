//! Backend selection and failover.
//!
//! The backend is resolved once at startup by [`connect_graph_store`]. A remote
//! primary is wrapped in [`FailoverGraphStore`] so a failed or timed-out read
//! is answered by the in-memory fallback instead of surfacing an error. Writes
//! go to the primary only; its errors are returned to the caller.
//!
//! The LRU cache sits in front of the primary, inside the failover, so answers
//! the fallback gave while the primary was down are never cached.

use std::path::Path;
use std::sync::Arc;

use astrokg_common::{Entity, EntityType, GraphBackendKind, GraphConfig, Relation, RelationType};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::artifacts::has_filtered_graph;
use crate::cache::CachedGraphStore;
use crate::graph_query::{GraphQuery, GraphRow};
use crate::memory_repository::MemoryGraphStore;
use crate::neo4j_repository::Neo4jGraphStore;
use crate::repository::{EntitySummary, GraphStore, RelationView, StoreResult};

pub struct FailoverGraphStore {
    primary: Option<Arc<dyn GraphStore>>,
    fallback: Arc<dyn GraphStore>,
}

impl FailoverGraphStore {
    pub fn new(primary: Option<Arc<dyn GraphStore>>, fallback: Arc<dyn GraphStore>) -> Self {
        Self { primary, fallback }
    }
}

/// Try the primary, then the fallback. `$store` is bound to each in turn.
macro_rules! with_failover {
    ($self:ident, $op:literal, |$store:ident| $call:expr) => {{
        if let Some($store) = $self.primary.as_deref() {
            match $call.await {
                Ok(value) => return Ok(value),
                Err(e) => warn!(
                    "Graph backend {} failed on {}: {}; answering from {}",
                    $store.backend_name(),
                    $op,
                    e,
                    $self.fallback.backend_name()
                ),
            }
        }
        let $store = $self.fallback.as_ref();
        $call.await
    }};
}

/// Write to the primary, or to the fallback when there is no primary. A
/// primary error is logged and returned.
macro_rules! primary_write {
    ($self:ident, $op:literal, |$store:ident| $call:expr) => {{
        match $self.primary.as_deref() {
            Some($store) => $call.await.map_err(|e| {
                warn!("Graph backend {} failed on {}: {}; write not applied", $store.backend_name(), $op, e);
                e
            }),
            None => {
                let $store = $self.fallback.as_ref();
                $call.await
            }
        }
    }};
}

#[async_trait]
impl GraphStore for FailoverGraphStore {
    fn backend_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|p| p.backend_name())
            .unwrap_or_else(|| self.fallback.backend_name())
    }

    async fn get_entities(&self, entity_type: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>> {
        with_failover!(self, "get_entities", |store| store.get_entities(entity_type, limit))
    }

    async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>> {
        with_failover!(self, "get_entity_by_name", |store| store.get_entity_by_name(name))
    }

    async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        with_failover!(self, "get_related_papers", |store| store.get_related_papers(entity_id, limit))
    }

    async fn get_entity_relations(
        &self,
        entity_id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<RelationView>> {
        with_failover!(self, "get_entity_relations", |store| store.get_entity_relations(entity_id, relation_type))
    }

    async fn upsert_entity(&self, entity: &Entity) -> StoreResult<()> {
        primary_write!(self, "upsert_entity", |store| store.upsert_entity(entity))
    }

    async fn upsert_paper(&self, entity_id: &str, paper_id: &str) -> StoreResult<()> {
        primary_write!(self, "upsert_paper", |store| store.upsert_paper(entity_id, paper_id))
    }

    async fn create_relation(&self, relation: &Relation) -> StoreResult<()> {
        primary_write!(self, "create_relation", |store| store.create_relation(relation))
    }

    async fn run_translated(&self, query: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
        with_failover!(self, "run_translated", |store| store.run_translated(query))
    }

    async fn close(&self) -> StoreResult<()> {
        if let Some(primary) = &self.primary {
            if let Err(e) = primary.close().await {
                warn!("Closing {} failed: {}", primary.backend_name(), e);
            }
        }
        self.fallback.close().await
    }
}

/// Built graph from `graph_dir` when present, otherwise the demo graph.
pub fn fallback_store(graph_dir: &Path) -> MemoryGraphStore {
    if has_filtered_graph(graph_dir) {
        match MemoryGraphStore::from_dir(graph_dir) {
            Ok(store) => return store,
            Err(e) => warn!("Could not load graph from {}: {}; using demo data", graph_dir.display(), e),
        }
    }
    MemoryGraphStore::demo()
}

fn cached(store: Arc<dyn GraphStore>, config: &GraphConfig) -> Arc<dyn GraphStore> {
    Arc::new(CachedGraphStore::with_capacity(
        store,
        config.related_papers_cache,
        config.entity_name_cache,
    ))
}

/// `primary` behind the LRU cache, failing over to the uncached `fallback`.
pub fn cached_failover(
    primary: Arc<dyn GraphStore>,
    fallback: Arc<dyn GraphStore>,
    config: &GraphConfig,
) -> FailoverGraphStore {
    FailoverGraphStore::new(Some(cached(primary, config)), fallback)
}

/// Resolve the configured backend. Never fails: an unusable backend is
/// logged and replaced by the fallback.
pub async fn connect_graph_store(config: &GraphConfig) -> Arc<dyn GraphStore> {
    let store: Arc<dyn GraphStore> = match config.backend {
        GraphBackendKind::Demo => cached(Arc::new(MemoryGraphStore::demo()), config),
        GraphBackendKind::Memory => cached(Arc::new(fallback_store(&config.graph_dir)), config),
        GraphBackendKind::Neo4j => {
            let fallback: Arc<dyn GraphStore> = Arc::new(fallback_store(&config.graph_dir));
            match Neo4jGraphStore::connect(config).await {
                Ok(primary) => Arc::new(cached_failover(Arc::new(primary), fallback, config)),
                Err(e) => {
                    warn!("Neo4j unavailable ({}); serving from {}", e, fallback.backend_name());
                    cached(fallback, config)
                }
            }
        }
    };
    info!("Graph backend: {}", store.backend_name());
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::repository::GraphStoreError;

    struct Broken;

    #[async_trait]
    impl GraphStore for Broken {
        fn backend_name(&self) -> &'static str {
            "broken"
        }
        async fn get_entities(&self, _: Option<EntityType>, _: usize) -> StoreResult<Vec<EntitySummary>> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn get_entity_by_name(&self, _: &str) -> StoreResult<Option<EntitySummary>> {
            Err(GraphStoreError::Timeout(std::time::Duration::from_secs(5)))
        }
        async fn get_related_papers(&self, _: &str, _: usize) -> StoreResult<Vec<String>> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn get_entity_relations(&self, _: &str, _: Option<RelationType>) -> StoreResult<Vec<RelationView>> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn upsert_entity(&self, _: &Entity) -> StoreResult<()> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn upsert_paper(&self, _: &str, _: &str) -> StoreResult<()> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn create_relation(&self, _: &Relation) -> StoreResult<()> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn run_translated(&self, _: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
            Err(GraphStoreError::Backend("down".into()))
        }
        async fn close(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_primary_is_answered_by_fallback() {
        let store = FailoverGraphStore::new(Some(Arc::new(Broken)), Arc::new(MemoryGraphStore::demo()));
        let radiation = store.get_entity_by_name("radiation").await.unwrap().unwrap();
        assert_eq!(radiation.entity_id, "E00002");
        assert_eq!(store.get_entities(None, 5).await.unwrap().len(), 5);
        assert_eq!(store.backend_name(), "broken");
    }

    /// Memory store whose next `get_entity_by_name` fails when armed.
    struct Flaky {
        inner: MemoryGraphStore,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl GraphStore for Flaky {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }
        async fn get_entities(&self, t: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>> {
            self.inner.get_entities(t, limit).await
        }
        async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(GraphStoreError::Timeout(std::time::Duration::from_secs(5)));
            }
            self.inner.get_entity_by_name(name).await
        }
        async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>> {
            self.inner.get_related_papers(entity_id, limit).await
        }
        async fn get_entity_relations(&self, id: &str, r: Option<RelationType>) -> StoreResult<Vec<RelationView>> {
            self.inner.get_entity_relations(id, r).await
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
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fallback_answers_are_not_cached() {
        let inner = MemoryGraphStore::new();
        inner.upsert_entity(&Entity::new("N9", "radiation", EntityType::Condition)).await.unwrap();
        inner.upsert_paper("N9", "NP1").await.unwrap();
        let flaky = Arc::new(Flaky { inner, fail_next: AtomicBool::new(true) });
        let store = cached_failover(flaky.clone(), Arc::new(MemoryGraphStore::demo()), &GraphConfig::default());

        // primary down: the demo graph answers
        let first = store.get_entity_by_name("radiation").await.unwrap().unwrap();
        assert_eq!(first.entity_id, "E00002");

        // primary back: its own entity and papers, not the demo's
        let second = store.get_entity_by_name("radiation").await.unwrap().unwrap();
        assert_eq!(second.entity_id, "N9");
        assert_eq!(store.get_related_papers("N9", 20).await.unwrap(), vec!["NP1"]);

        // the primary's answer is now cached and survives another outage
        flaky.fail_next.store(true, Ordering::SeqCst);
        let third = store.get_entity_by_name("radiation").await.unwrap().unwrap();
        assert_eq!(third.entity_id, "N9");
    }

    #[tokio::test]
    async fn test_failed_primary_write_is_an_error() {
        let fallback = Arc::new(MemoryGraphStore::demo());
        let store = FailoverGraphStore::new(Some(Arc::new(Broken)), fallback.clone());

        let entity = Entity::new("E00042", "hindlimb unloading", EntityType::Condition);
        assert!(store.upsert_entity(&entity).await.is_err());
        assert!(store.upsert_paper("E00001", "P42").await.is_err());
        assert!(fallback.get_entity_by_name("hindlimb unloading").await.unwrap().is_none());
        assert!(!fallback.get_related_papers("E00001", 100).await.unwrap().contains(&"P42".to_string()));

        // without a primary, writes land in the fallback
        let local = FailoverGraphStore::new(None, fallback.clone());
        local.upsert_entity(&entity).await.unwrap();
        assert!(fallback.get_entity_by_name("hindlimb unloading").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_neo4j_falls_back_to_demo() {
        let dir = tempfile::tempdir().unwrap();
        let config = GraphConfig {
            backend: GraphBackendKind::Neo4j,
            graph_dir: dir.path().to_path_buf(),
            ..GraphConfig::default()
        };
        let store = connect_graph_store(&config).await;
        assert_eq!(store.backend_name(), "demo");
        assert!(store.get_entity_by_name("microgravity").await.unwrap().is_some());
    }
}

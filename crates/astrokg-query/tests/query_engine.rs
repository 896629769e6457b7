//! Query routing end to end over the demo graph and demo paper corpus.

use std::sync::Arc;

use astrokg_common::{Entity, EntityType, Relation, RelationType};
use astrokg_db::MemoryPaperStore;
use astrokg_kg::{
    EntitySummary, FailoverGraphStore, GraphQuery, GraphRow, GraphStore, GraphStoreError, MemoryGraphStore,
    RelationView, StoreResult,
};
use astrokg_query::{GraphResult, QueryEngine, QueryResult, SqlRule};
use async_trait::async_trait;

struct Unreachable;

#[async_trait]
impl GraphStore for Unreachable {
    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
    async fn get_entities(&self, _: Option<EntityType>, _: usize) -> StoreResult<Vec<EntitySummary>> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn get_entity_by_name(&self, _: &str) -> StoreResult<Option<EntitySummary>> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn get_related_papers(&self, _: &str, _: usize) -> StoreResult<Vec<String>> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn get_entity_relations(&self, _: &str, _: Option<RelationType>) -> StoreResult<Vec<RelationView>> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn upsert_entity(&self, _: &Entity) -> StoreResult<()> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn upsert_paper(&self, _: &str, _: &str) -> StoreResult<()> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn create_relation(&self, _: &Relation) -> StoreResult<()> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn run_translated(&self, _: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
        Err(GraphStoreError::Backend("connection refused".into()))
    }
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn demo_engine() -> QueryEngine {
    QueryEngine::new(Arc::new(MemoryGraphStore::demo()), Arc::new(MemoryPaperStore::demo())).unwrap()
}

fn ids(papers: &[astrokg_db::PaperBrief]) -> Vec<&str> {
    papers.iter().map(|p| p.paper_id.as_str()).collect()
}

#[tokio::test]
async fn test_hybrid_intersects_graph_and_cluster() {
    let engine = demo_engine();
    let result = engine.run_query("papers related to radiation and in cluster 3").await.unwrap();

    let QueryResult::Hybrid { entity, graph_papers, sql, combined, graph_degraded } = &result else {
        panic!("expected hybrid, got {:?}", result);
    };
    assert_eq!(entity.as_deref(), Some("radiation"));
    assert_eq!(graph_papers, &vec!["P1".to_string(), "P2".to_string()]);
    assert_eq!(sql.rule, SqlRule::Cluster { cluster_id: "3".into() });
    assert_eq!(ids(sql.papers.as_ref().unwrap()), vec!["P2", "P3"]);
    assert_eq!(ids(combined), vec!["P2"]);
    assert!(!graph_degraded);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["type"], "hybrid");
    assert_eq!(json["sql"]["rule"], "cluster");
    assert_eq!(json["combined"][0]["paper_id"], "P2");
}

#[tokio::test]
async fn test_unknown_entity_is_not_found() {
    let engine = demo_engine();
    let result = engine.run_query("papers related to unknownentity123").await.unwrap();
    assert_eq!(
        result,
        QueryResult::Graph(GraphResult::NotFound { entity: "unknownentity123".into() })
    );

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["type"], "graph");
    assert_eq!(json["result"], "not_found");
}

#[tokio::test]
async fn test_known_entity_without_papers_is_empty_not_missing() {
    let graph = Arc::new(MemoryGraphStore::new());
    graph.upsert_entity(&Entity::new("E00001", "hindlimb unloading", EntityType::Condition)).await.unwrap();
    let engine = QueryEngine::new(graph, Arc::new(MemoryPaperStore::demo())).unwrap();

    let result = engine.run_query("papers related to hindlimb unloading").await.unwrap();
    assert_eq!(
        result,
        QueryResult::Graph(GraphResult::RelatedPapers {
            entity: "hindlimb unloading".into(),
            entity_id: "E00001".into(),
            papers: vec![],
        })
    );
}

#[tokio::test]
async fn test_sql_rules_in_order() {
    let engine = demo_engine();

    let QueryResult::Sql(sql) = engine.run_query("papers published after 2021").await.unwrap() else {
        panic!("expected sql");
    };
    assert_eq!(sql.rule, SqlRule::FromYear { year: 2021 });
    assert_eq!(ids(sql.papers.as_ref().unwrap()), vec!["P3", "P4", "P5"]);

    let QueryResult::Sql(sql) = engine.run_query("papers before 2020").await.unwrap() else {
        panic!("expected sql");
    };
    assert_eq!(ids(sql.papers.as_ref().unwrap()), vec!["P1"]);

    let QueryResult::Sql(sql) = engine.run_query("keyword muscle").await.unwrap() else {
        panic!("expected sql");
    };
    assert_eq!(sql.rule, SqlRule::Keyword { term: "muscle".into() });
    assert_eq!(sql.keywords.as_ref().unwrap().len(), 2);
    assert!(sql.papers.is_none());

    // cluster 99 does not exist, so the default listing answers
    let QueryResult::Sql(sql) = engine.run_query("papers in cluster 99").await.unwrap() else {
        panic!("expected sql");
    };
    assert_eq!(sql.rule, SqlRule::Listing { limit: 20 });
    assert_eq!(sql.papers.as_ref().unwrap().len(), 5);
}

#[tokio::test]
async fn test_graph_entity_listing_by_type() {
    let engine = demo_engine();
    let QueryResult::Graph(GraphResult::Entities { entity_type, entities }) =
        engine.run_query("show condition entities").await.unwrap()
    else {
        panic!("expected entity listing");
    };
    assert_eq!(entity_type.as_deref(), Some("condition"));
    assert_eq!(entities.len(), 3);
    assert!(entities.iter().all(|e| e.entity_type == "condition"));
}

#[tokio::test]
async fn test_graph_questions_go_through_translator() {
    let engine = demo_engine();
    let QueryResult::Graph(GraphResult::Translated { rows, .. }) =
        engine.run_query("graph: what affects bone?").await.unwrap()
    else {
        panic!("expected translated query");
    };
    assert_eq!(rows.len(), 2);

    let result = engine.run_query("edges please").await.unwrap();
    assert!(matches!(result, QueryResult::Graph(GraphResult::Unrecognized { .. })));
}

#[tokio::test]
async fn test_failed_primary_graph_is_answered_by_fallback() {
    let graph = Arc::new(FailoverGraphStore::new(
        Some(Arc::new(Unreachable)),
        Arc::new(MemoryGraphStore::demo()),
    ));
    let engine = QueryEngine::new(graph, Arc::new(MemoryPaperStore::demo())).unwrap();
    let result = engine.run_query("papers related to radiation").await.unwrap();
    let QueryResult::Graph(GraphResult::RelatedPapers { papers, .. }) = result else {
        panic!("expected related papers");
    };
    assert_eq!(papers, vec!["P1", "P2"]);
}

#[tokio::test]
async fn test_hybrid_degrades_to_sql_when_graph_fails() {
    let engine = QueryEngine::new(Arc::new(Unreachable), Arc::new(MemoryPaperStore::demo())).unwrap();
    let result = engine.run_query("papers related to radiation and in cluster 3").await.unwrap();
    let QueryResult::Hybrid { graph_papers, combined, graph_degraded, .. } = result else {
        panic!("expected hybrid");
    };
    assert!(graph_degraded);
    assert!(graph_papers.is_empty());
    assert_eq!(ids(&combined), vec!["P2", "P3"]);
}

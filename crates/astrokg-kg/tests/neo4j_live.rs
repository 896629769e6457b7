//! Runs against a real Neo4j instance. Set NEO4J_URI and NEO4J_PASSWORD
//! (and optionally NEO4J_USER) and run with `--ignored`. The target
//! database is cleared.

use astrokg_common::{GraphBackendKind, GraphConfig, RelationType};
use astrokg_kg::{deploy_graph, DeployOptions, GraphIntent, GraphQuery, GraphStore, MemoryGraphStore, Neo4jGraphStore};

fn live_config() -> GraphConfig {
    let mut config = GraphConfig {
        backend: GraphBackendKind::Neo4j,
        uri: std::env::var("NEO4J_URI").ok(),
        password: std::env::var("NEO4J_PASSWORD").ok(),
        ..GraphConfig::default()
    };
    if let Ok(user) = std::env::var("NEO4J_USER") {
        config.user = user;
    }
    config
}

#[tokio::test]
#[ignore]
async fn test_deploy_demo_graph_and_query_it() {
    let store = Neo4jGraphStore::connect(&live_config()).await.unwrap();
    let graph = MemoryGraphStore::demo().snapshot();

    let report = deploy_graph(&store, &graph, &DeployOptions { clear: true }).await.unwrap();
    assert_eq!(report.entities_loaded, 10);
    assert_eq!(report.counts.nodes, 10);
    assert_eq!(report.counts.relationships, 12);

    let radiation = store.get_entity_by_name("Radiation").await.unwrap().unwrap();
    assert_eq!(store.get_related_papers(&radiation.entity_id, 20).await.unwrap(), vec!["P1", "P2"]);

    let query = GraphQuery::new(
        GraphIntent::IncomingEdges {
            entity: "bone".into(),
            relations: vec![RelationType::Affects, RelationType::Decreases],
        },
        "What affects bone",
    );
    let rows = store.run_translated(&query).await.unwrap();
    assert_eq!(rows.len(), 2);
    store.close().await.unwrap();
}

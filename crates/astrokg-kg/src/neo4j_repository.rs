//! Neo4j implementation of GraphStore.
//!
//! Nodes carry the `Entity` label with properties entity_id, name, type,
//! papers, paper_count, importance_score, relation_count and synonyms.
//! Relationship types are the upper-cased relation names. Every call is
//! bounded by the configured timeout.

use std::future::Future;
use std::time::Duration;

use astrokg_common::{Entity, EntityType, GraphConfig, Relation, RelationType};
use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph_query::{GraphParam, GraphQuery, GraphRow, RowKind};
use crate::repository::{EntitySummary, GraphStore, GraphStoreError, RelationView, StoreResult};

const ENTITY_FIELDS: &str = "e.entity_id AS entity_id, e.name AS name, e.type AS type, \
     e.importance_score AS importance_score, size(e.papers) AS paper_count, e.relation_count AS relation_count";

const RELATION_FIELDS: &str = "source.name AS source_name, source.entity_id AS source_id, \
     r.relation_type AS relation_type, target.name AS target_name, target.entity_id AS target_id, \
     r.evidence_count AS evidence_count, r.confidence AS confidence, r.papers AS papers";

fn backend<E: std::fmt::Display>(e: E) -> GraphStoreError {
    GraphStoreError::Backend(e.to_string())
}

fn field<T: DeserializeOwned>(row: &Row, key: &str) -> StoreResult<T> {
    row.get::<T>(key).map_err(|e| GraphStoreError::Backend(format!("column '{}': {}", key, e)))
}

/// Node and relationship counts after a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub nodes: i64,
    pub relationships: i64,
    pub top_entities: Vec<(String, f64)>,
}

#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
    uri: String,
    timeout: Duration,
}

impl Neo4jGraphStore {
    /// Connect and run a liveness check. Missing URI or password is a
    /// configuration error.
    pub async fn connect(config: &GraphConfig) -> StoreResult<Self> {
        let uri = config
            .uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| GraphStoreError::NotConfigured("NEO4J_URI is not set".into()))?;
        let password = config
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GraphStoreError::NotConfigured("NEO4J_PASSWORD is not set".into()))?;
        let timeout = Duration::from_secs(config.timeout_secs.max(1));

        info!("Connecting to Neo4j at {}", uri);
        let neo_config = ConfigBuilder::default()
            .uri(uri)
            .user(config.user.as_str())
            .password(password)
            .db(config.database.as_deref().unwrap_or("neo4j"))
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(|e| GraphStoreError::NotConfigured(format!("invalid Neo4j config: {}", e)))?;

        let graph = tokio::time::timeout(timeout, Graph::connect(neo_config))
            .await
            .map_err(|_| GraphStoreError::Timeout(timeout))?
            .map_err(|e| GraphStoreError::Backend(format!("failed to connect to {}: {}", uri, e)))?;

        let store = Self { graph, uri: uri.to_string(), timeout };
        store.fetch(query("RETURN 1 AS ok")).await?;
        info!("Neo4j connection established");
        Ok(store)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn bounded<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = std::result::Result<T, neo4rs::Error>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| GraphStoreError::Timeout(self.timeout))?
            .map_err(backend)
    }

    async fn fetch(&self, q: Query) -> StoreResult<Vec<Row>> {
        self.bounded(async {
            let mut stream = self.graph.execute(q).await?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await? {
                rows.push(row);
            }
            Ok::<_, neo4rs::Error>(rows)
        })
        .await
    }

    async fn run(&self, q: Query) -> StoreResult<()> {
        self.bounded(self.graph.run(q)).await
    }

    async fn count(&self, cypher: &str) -> StoreResult<i64> {
        let rows = self.fetch(query(cypher)).await?;
        match rows.first() {
            Some(row) => field(row, "count"),
            None => Ok(0),
        }
    }

    /// Delete every node and relationship.
    pub async fn clear_database(&self) -> StoreResult<()> {
        self.run(query("MATCH (n) DETACH DELETE n")).await?;
        info!("Cleared Neo4j database");
        Ok(())
    }

    /// Uniqueness constraint on entity_id plus lookup indexes.
    pub async fn create_constraints(&self) -> StoreResult<()> {
        let statements = [
            "CREATE CONSTRAINT entity_id_unique IF NOT EXISTS FOR (e:Entity) REQUIRE e.entity_id IS UNIQUE",
            "CREATE INDEX entity_name IF NOT EXISTS FOR (e:Entity) ON (e.name)",
            "CREATE INDEX entity_type IF NOT EXISTS FOR (e:Entity) ON (e.type)",
            "CREATE INDEX entity_importance IF NOT EXISTS FOR (e:Entity) ON (e.importance_score)",
        ];
        for statement in statements {
            self.run(query(statement)).await?;
        }
        info!("Created constraints and indexes");
        Ok(())
    }

    pub async fn counts(&self) -> StoreResult<GraphCounts> {
        let nodes = self.count("MATCH (n) RETURN count(n) AS count").await?;
        let relationships = self.count("MATCH ()-[r]->() RETURN count(r) AS count").await?;
        let rows = self
            .fetch(query(
                "MATCH (e:Entity) RETURN e.name AS name, e.importance_score AS score \
                 ORDER BY e.importance_score DESC LIMIT 5",
            ))
            .await?;
        let mut top_entities = Vec::with_capacity(rows.len());
        for row in &rows {
            let score: Option<f64> = field(row, "score")?;
            top_entities.push((field(row, "name")?, score.unwrap_or(0.0)));
        }
        Ok(GraphCounts { nodes, relationships, top_entities })
    }

    fn summary(row: &Row) -> StoreResult<EntitySummary> {
        let paper_count: Option<i64> = field(row, "paper_count")?;
        let relation_count: Option<i64> = field(row, "relation_count")?;
        Ok(EntitySummary {
            entity_id: field(row, "entity_id")?,
            name: field(row, "name")?,
            entity_type: field(row, "type")?,
            importance_score: field(row, "importance_score")?,
            paper_count: paper_count.unwrap_or(0).max(0) as usize,
            relation_count: relation_count.map(|c| c.max(0) as usize),
        })
    }

    fn decode(kind: RowKind, row: &Row) -> StoreResult<GraphRow> {
        Ok(match kind {
            RowKind::Triple => GraphRow::Triple {
                source: field(row, "source")?,
                relation: field(row, "relation")?,
                target: field(row, "target")?,
                evidence: field(row, "evidence")?,
            },
            RowKind::Entity => GraphRow::Entity {
                name: field(row, "name")?,
                entity_type: field(row, "type")?,
                score: field(row, "score")?,
                papers: field(row, "papers")?,
            },
            RowKind::Path => GraphRow::Path { nodes: field(row, "nodes")? },
            RowKind::Papers => {
                let paper_ids: Option<Vec<String>> = field(row, "paper_ids")?;
                let count: Option<i64> = field(row, "count")?;
                GraphRow::Papers {
                    entity: field(row, "entity")?,
                    paper_ids: paper_ids.unwrap_or_default(),
                    count: count.unwrap_or(0),
                }
            }
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    fn backend_name(&self) -> &'static str {
        "neo4j"
    }

    async fn get_entities(&self, entity_type: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>> {
        let q = match entity_type {
            Some(t) => query(&format!(
                "MATCH (e:Entity) WHERE e.type = $entity_type RETURN {} ORDER BY e.importance_score DESC LIMIT $limit",
                ENTITY_FIELDS
            ))
            .param("entity_type", t.as_str()),
            None => query(&format!(
                "MATCH (e:Entity) RETURN {} ORDER BY e.importance_score DESC LIMIT $limit",
                ENTITY_FIELDS
            )),
        }
        .param("limit", limit as i64);

        self.fetch(q).await?.iter().map(Self::summary).collect()
    }

    async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>> {
        let q = query(&format!(
            "MATCH (e:Entity) WHERE toLower(e.name) = toLower($name) RETURN {} LIMIT 1",
            ENTITY_FIELDS
        ))
        .param("name", name.trim());
        self.fetch(q).await?.first().map(Self::summary).transpose()
    }

    async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        let q = query("MATCH (e:Entity {entity_id: $entity_id}) RETURN e.papers AS papers").param("entity_id", entity_id);
        let rows = self.fetch(q).await?;
        let Some(row) = rows.first() else {
            return Ok(Vec::new());
        };
        let mut papers: Vec<String> = field::<Option<Vec<String>>>(row, "papers")?.unwrap_or_default();
        papers.truncate(limit);
        Ok(papers)
    }

    async fn get_entity_relations(
        &self,
        entity_id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<RelationView>> {
        let base = "MATCH (source:Entity)-[r]->(target:Entity) \
                    WHERE (source.entity_id = $entity_id OR target.entity_id = $entity_id)";
        let q = match relation_type {
            Some(t) => query(&format!("{} AND type(r) = $relation_type RETURN {}", base, RELATION_FIELDS))
                .param("relation_type", t.graph_label()),
            None => query(&format!("{} RETURN {}", base, RELATION_FIELDS)),
        }
        .param("entity_id", entity_id);

        let rows = self.fetch(q).await?;
        let mut relations = Vec::with_capacity(rows.len());
        for row in &rows {
            let evidence: Option<i64> = field(row, "evidence_count")?;
            let confidence: Option<f64> = field(row, "confidence")?;
            let papers: Option<Vec<String>> = field(row, "papers")?;
            relations.push(RelationView {
                source: field(row, "source_name")?,
                source_id: field(row, "source_id")?,
                relation: field(row, "relation_type")?,
                target: field(row, "target_name")?,
                target_id: field(row, "target_id")?,
                evidence_count: evidence.unwrap_or(0).max(0) as usize,
                confidence: confidence.unwrap_or(0.0),
                papers: papers.unwrap_or_default(),
            });
        }
        Ok(relations)
    }

    async fn upsert_entity(&self, entity: &Entity) -> StoreResult<()> {
        let q = query(
            "MERGE (e:Entity {entity_id: $entity_id}) \
             SET e.name = $name, e.type = $type, e.papers = $papers, e.paper_count = $paper_count, \
                 e.importance_score = $importance_score, e.relation_count = $relation_count, \
                 e.synonyms = $synonyms",
        )
        .param("entity_id", entity.entity_id.as_str())
        .param("name", entity.name.as_str())
        .param("type", entity.entity_type.as_str())
        .param("papers", entity.papers.iter().cloned().collect::<Vec<String>>())
        .param("paper_count", entity.paper_count() as i64)
        .param("importance_score", entity.importance_score.unwrap_or(0.0))
        .param("relation_count", entity.relation_count.unwrap_or(0) as i64)
        .param("synonyms", entity.synonyms.iter().cloned().collect::<Vec<String>>());
        self.run(q).await?;
        debug!("Upserted {} into Neo4j", entity.entity_id);
        Ok(())
    }

    async fn upsert_paper(&self, entity_id: &str, paper_id: &str) -> StoreResult<()> {
        let q = query(
            "MATCH (e:Entity {entity_id: $entity_id}) \
             SET e.papers = CASE WHEN $paper_id IN coalesce(e.papers, []) THEN e.papers \
                                 ELSE coalesce(e.papers, []) + $paper_id END \
             SET e.paper_count = size(e.papers) \
             RETURN e.entity_id AS entity_id",
        )
        .param("entity_id", entity_id)
        .param("paper_id", paper_id);
        if self.fetch(q).await?.is_empty() {
            return Err(GraphStoreError::EntityNotFound(entity_id.to_string()));
        }
        Ok(())
    }

    async fn create_relation(&self, relation: &Relation) -> StoreResult<()> {
        // Relationship types cannot be parameters; the label comes from the closed enum.
        let cypher = format!(
            "MATCH (a:Entity {{entity_id: $source}}), (b:Entity {{entity_id: $target}}) \
             MERGE (a)-[r:{} {{relation_id: $relation_id}}]->(b) \
             SET r.relation_type = $relation_type, r.papers = $papers, \
                 r.evidence_count = $evidence_count, r.confidence = $confidence \
             RETURN r.relation_id AS relation_id",
            relation.relation_type.graph_label()
        );
        let q = query(&cypher)
            .param("source", relation.source.as_str())
            .param("target", relation.target.as_str())
            .param("relation_id", relation.relation_id.as_str())
            .param("relation_type", relation.relation_type.as_str())
            .param("papers", relation.papers.iter().cloned().collect::<Vec<String>>())
            .param("evidence_count", relation.evidence_count as i64)
            .param("confidence", relation.confidence);
        if self.fetch(q).await?.is_empty() {
            return Err(GraphStoreError::EntityNotFound(format!("{} or {}", relation.source, relation.target)));
        }
        Ok(())
    }

    async fn run_translated(&self, graph_query: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
        let mut q = query(&graph_query.cypher());
        for (name, value) in graph_query.params() {
            q = match value {
                GraphParam::Text(s) => q.param(name, s),
                GraphParam::List(items) => q.param(name, items),
                GraphParam::Int(n) => q.param(name, n),
            };
        }
        let kind = graph_query.row_kind();
        self.fetch(q).await?.iter().map(|row| Self::decode(kind, row)).collect()
    }

    async fn close(&self) -> StoreResult<()> {
        // Connections are pooled and released when the last handle drops.
        info!("Closing Neo4j graph store for {}", self.uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_uri_and_password() {
        let config = GraphConfig::default();
        assert!(matches!(
            Neo4jGraphStore::connect(&config).await,
            Err(GraphStoreError::NotConfigured(_))
        ));

        let config = GraphConfig { uri: Some("bolt://localhost:7687".into()), ..GraphConfig::default() };
        assert!(matches!(
            Neo4jGraphStore::connect(&config).await,
            Err(GraphStoreError::NotConfigured(_))
        ));
    }
}

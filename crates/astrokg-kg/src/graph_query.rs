//! Structured graph queries produced by the natural-language translator.
//!
//! A [`GraphQuery`] carries the intent (what to look up, with its captured
//! arguments) and renders to a parameterized Cypher statement. Captured text
//! only ever reaches the database as a bound parameter; relationship types come
//! from [`RelationType`].

use astrokg_common::RelationType;
use serde::{Deserialize, Serialize};

pub const EDGE_LIMIT: usize = 20;
pub const ALL_EDGE_LIMIT: usize = 30;
pub const TYPE_LISTING_LIMIT: usize = 30;
pub const PATH_MAX_HOPS: usize = 5;
pub const PATH_LIMIT: usize = 5;
pub const DEFAULT_TOP_ENTITIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum GraphIntent {
    /// Edges of the given types pointing into entities named like `entity`.
    IncomingEdges { entity: String, relations: Vec<RelationType> },
    /// Edges of the given types leaving entities named like `entity`.
    OutgoingEdges { entity: String, relations: Vec<RelationType> },
    AllEdges { entity: String },
    /// Neighbours of `entity` whose type is `entity_type`.
    TypedNeighbours { entity: String, entity_type: String },
    TopEntities { limit: usize },
    EntitiesOfType { entity_type: String },
    ShortestPath { from: String, to: String },
    PapersAbout { entity: String },
}

/// Shape of the rows a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Triple,
    Entity,
    Path,
    Papers,
}

/// A bound Cypher parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphParam {
    Text(String),
    List(Vec<String>),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQuery {
    #[serde(flatten)]
    pub intent: GraphIntent,
    pub description: String,
}

/// One result row of a translated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphRow {
    Triple {
        source: String,
        relation: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evidence: Option<i64>,
    },
    Entity {
        name: String,
        #[serde(rename = "type")]
        entity_type: String,
        score: Option<f64>,
        papers: Option<i64>,
    },
    Path {
        nodes: Vec<String>,
    },
    Papers {
        entity: String,
        paper_ids: Vec<String>,
        count: i64,
    },
}

const TRIPLE_RETURN: &str =
    "RETURN n.name AS source, type(r) AS relation, m.name AS target, r.evidence_count AS evidence";
const ENTITY_RETURN: &str =
    "RETURN e.name AS name, e.type AS type, e.importance_score AS score, e.paper_count AS papers \
     ORDER BY e.importance_score DESC";

impl GraphQuery {
    pub fn new(intent: GraphIntent, description: impl Into<String>) -> Self {
        Self { intent, description: description.into() }
    }

    pub fn row_kind(&self) -> RowKind {
        match self.intent {
            GraphIntent::IncomingEdges { .. }
            | GraphIntent::OutgoingEdges { .. }
            | GraphIntent::AllEdges { .. }
            | GraphIntent::TypedNeighbours { .. } => RowKind::Triple,
            GraphIntent::TopEntities { .. } | GraphIntent::EntitiesOfType { .. } => RowKind::Entity,
            GraphIntent::ShortestPath { .. } => RowKind::Path,
            GraphIntent::PapersAbout { .. } => RowKind::Papers,
        }
    }

    /// Parameterized Cypher for this query.
    pub fn cypher(&self) -> String {
        match &self.intent {
            GraphIntent::IncomingEdges { relations, .. } => format!(
                "MATCH (n:Entity)-[r]->(m:Entity) WHERE {} AND toLower(m.name) CONTAINS toLower($entity) {} LIMIT {}",
                relation_filter(relations),
                TRIPLE_RETURN,
                EDGE_LIMIT
            ),
            GraphIntent::OutgoingEdges { relations, .. } => format!(
                "MATCH (n:Entity)-[r]->(m:Entity) WHERE {} AND toLower(n.name) CONTAINS toLower($entity) {} LIMIT {}",
                relation_filter(relations),
                TRIPLE_RETURN,
                EDGE_LIMIT
            ),
            GraphIntent::AllEdges { .. } => format!(
                "MATCH (n:Entity)-[r]-(m:Entity) WHERE toLower(n.name) CONTAINS toLower($entity) {} LIMIT {}",
                TRIPLE_RETURN, ALL_EDGE_LIMIT
            ),
            GraphIntent::TypedNeighbours { .. } => format!(
                "MATCH (n:Entity)-[r]-(m:Entity) WHERE toLower(n.name) CONTAINS toLower($entity) AND m.type = $type {} LIMIT {}",
                TRIPLE_RETURN, EDGE_LIMIT
            ),
            GraphIntent::TopEntities { .. } => format!("MATCH (e:Entity) {} LIMIT $limit", ENTITY_RETURN),
            GraphIntent::EntitiesOfType { .. } => format!(
                "MATCH (e:Entity) WHERE e.type = $type {} LIMIT {}",
                ENTITY_RETURN, TYPE_LISTING_LIMIT
            ),
            GraphIntent::ShortestPath { .. } => format!(
                "MATCH (a:Entity), (b:Entity) \
                 WHERE toLower(a.name) CONTAINS toLower($entity1) AND toLower(b.name) CONTAINS toLower($entity2) AND a <> b \
                 MATCH path = shortestPath((a)-[*..{}]-(b)) \
                 RETURN [x IN nodes(path) | x.name] AS nodes LIMIT {}",
                PATH_MAX_HOPS, PATH_LIMIT
            ),
            GraphIntent::PapersAbout { .. } => "MATCH (e:Entity) WHERE toLower(e.name) CONTAINS toLower($entity) \
                 RETURN e.name AS entity, e.papers AS paper_ids, size(e.papers) AS count"
                .to_string(),
        }
    }

    /// Named parameters referenced by [`cypher`](Self::cypher).
    pub fn params(&self) -> Vec<(&'static str, GraphParam)> {
        let text = |s: &str| GraphParam::Text(s.to_string());
        match &self.intent {
            GraphIntent::IncomingEdges { entity, relations } | GraphIntent::OutgoingEdges { entity, relations } => {
                vec![("entity", text(entity)), relation_param(relations)]
            }
            GraphIntent::AllEdges { entity } | GraphIntent::PapersAbout { entity } => vec![("entity", text(entity))],
            GraphIntent::TypedNeighbours { entity, entity_type } => {
                vec![("entity", text(entity)), ("type", text(entity_type))]
            }
            GraphIntent::TopEntities { limit } => vec![("limit", GraphParam::Int(*limit as i64))],
            GraphIntent::EntitiesOfType { entity_type } => vec![("type", text(entity_type))],
            GraphIntent::ShortestPath { from, to } => vec![("entity1", text(from)), ("entity2", text(to))],
        }
    }
}

fn relation_filter(relations: &[RelationType]) -> &'static str {
    if relations.len() == 1 {
        "type(r) = $relation"
    } else {
        "type(r) IN $relations"
    }
}

fn relation_param(relations: &[RelationType]) -> (&'static str, GraphParam) {
    match relations {
        [single] => ("relation", GraphParam::Text(single.graph_label().to_string())),
        many => (
            "relations",
            GraphParam::List(many.iter().map(|r| r.graph_label().to_string()).collect()),
        ),
    }
}

/// Case-insensitive substring match used by the native evaluators.
pub fn name_contains(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(&needle.to_lowercase())
}

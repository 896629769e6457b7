//! Query results.
//!
//! Every query answers with a [`QueryResult`], serialized with a `type`
//! discriminator of `sql`, `graph` or `hybrid`. Graph answers distinguish an
//! unknown entity (`not_found`) and an untranslatable question
//! (`unrecognized`) from a valid answer that happens to be empty.

use astrokg_db::{KeywordHit, PaperBrief};
use astrokg_kg::{EntitySummary, GraphQuery, GraphRow};
use serde::Serialize;

/// The relational sub-rule that produced a [`SqlResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SqlRule {
    Cluster { cluster_id: String },
    FromYear { year: i64 },
    BeforeYear { year: i64 },
    Keyword { term: String },
    Listing { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlResult {
    #[serde(flatten)]
    pub rule: SqlRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub papers: Option<Vec<PaperBrief>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<KeywordHit>>,
}

impl SqlResult {
    pub fn papers(rule: SqlRule, papers: Vec<PaperBrief>) -> Self {
        Self { rule, papers: Some(papers), keywords: None }
    }

    pub fn keywords(rule: SqlRule, keywords: Vec<KeywordHit>) -> Self {
        Self { rule, papers: None, keywords: Some(keywords) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GraphResult {
    /// Ranked entity listing, optionally restricted to one type.
    Entities {
        #[serde(skip_serializing_if = "Option::is_none")]
        entity_type: Option<String>,
        entities: Vec<EntitySummary>,
    },
    /// Papers of a resolved entity. `papers` may be empty.
    RelatedPapers {
        entity: String,
        entity_id: String,
        papers: Vec<String>,
    },
    /// The named entity is not in the graph.
    NotFound { entity: String },
    Translated { query: GraphQuery, rows: Vec<GraphRow> },
    /// No rule understood the question.
    Unrecognized { query: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResult {
    Sql(SqlResult),
    Graph(GraphResult),
    Hybrid {
        /// Entity named after "related to", if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        entity: Option<String>,
        graph_papers: Vec<String>,
        sql: SqlResult,
        combined: Vec<PaperBrief>,
        /// The graph lookup failed; `combined` is the unfiltered SQL result.
        graph_degraded: bool,
    },
}

impl QueryResult {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::Sql(_) => "sql",
            QueryResult::Graph(_) => "graph",
            QueryResult::Hybrid { .. } => "hybrid",
        }
    }
}

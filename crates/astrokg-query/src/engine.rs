//! Query federation across the relational and graph stores.

use std::collections::HashSet;
use std::sync::Arc;

use astrokg_common::EntityType;
use astrokg_db::PaperStore;
use astrokg_kg::GraphStore;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::classify::{classify, QueryClass};
use crate::result::{GraphResult, QueryResult, SqlResult, SqlRule};
use crate::translator::GraphQueryTranslator;
use crate::Result;

/// Papers listed when no relational sub-rule applies.
pub const DEFAULT_PAPER_LISTING: usize = 20;
/// Entities listed for "entities" queries without a "top N".
pub const DEFAULT_ENTITY_LISTING: usize = 20;
/// Upper bound on the related papers fetched for one entity.
pub const RELATED_PAPER_LIMIT: usize = 100;

struct Patterns {
    cluster: Regex,
    after: Regex,
    before: Regex,
    related_to: Regex,
    entity_word: Regex,
    top_n: Regex,
    entity_types: Vec<(EntityType, Regex)>,
}

impl Patterns {
    fn new() -> Result<Self> {
        let entity_types = EntityType::ALL
            .iter()
            .map(|t| {
                let name = t.as_str().replace('_', r"\s+");
                Ok((*t, Regex::new(&format!(r"\b{}(?:e?s)?\b", name))?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            cluster: Regex::new(r"cluster\s+(\d+)")?,
            after: Regex::new(r"after\s+(\d{4})")?,
            before: Regex::new(r"before\s+(\d{4})")?,
            related_to: Regex::new(r"related to\s+(.+?)(?:\s+(?:and|in|after|before)\b|[,.;?!]|$)")?,
            entity_word: Regex::new(r"\bentit(?:y|ies)\b")?,
            top_n: Regex::new(r"\btop\s+(\d+)")?,
            entity_types,
        })
    }

    fn related_entity(&self, q: &str) -> Option<String> {
        let name = self.related_to.captures(q)?.get(1)?.as_str().trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    fn entity_type(&self, q: &str) -> Option<EntityType> {
        self.entity_types
            .iter()
            .find(|(_, pattern)| pattern.is_match(q))
            .map(|(t, _)| *t)
    }
}

/// Last word that is not "keyword"/"keywords", without trailing punctuation.
fn keyword_term(q: &str) -> Option<&str> {
    q.split_whitespace()
        .map(|w| w.trim_end_matches(['?', '.', '!', ',']))
        .filter(|w| !w.is_empty() && *w != "keyword" && *w != "keywords")
        .last()
}

/// Classifies free-text queries and answers them from the two stores.
pub struct QueryEngine {
    graph: Arc<dyn GraphStore>,
    papers: Arc<dyn PaperStore>,
    translator: GraphQueryTranslator,
    patterns: Patterns,
}

impl QueryEngine {
    pub fn new(graph: Arc<dyn GraphStore>, papers: Arc<dyn PaperStore>) -> Result<Self> {
        Ok(Self {
            graph,
            papers,
            translator: GraphQueryTranslator::new()?,
            patterns: Patterns::new()?,
        })
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn papers(&self) -> &Arc<dyn PaperStore> {
        &self.papers
    }

    pub fn translator(&self) -> &GraphQueryTranslator {
        &self.translator
    }

    pub fn classify(&self, query: &str) -> QueryClass {
        classify(query)
    }

    /// Classify `query` and answer it.
    pub async fn run_query(&self, query: &str) -> Result<QueryResult> {
        let class = classify(query);
        info!("Query classified as {}: '{}'", class.as_str(), query);
        match class {
            QueryClass::Sql => Ok(QueryResult::Sql(self.run_sql(query).await?)),
            QueryClass::Graph => Ok(QueryResult::Graph(self.run_graph(query).await?)),
            QueryClass::Hybrid => self.run_hybrid(query).await,
        }
    }

    /// Relational sub-rules in order: cluster, from year, before year,
    /// keyword, then the default listing.
    pub async fn run_sql(&self, query: &str) -> Result<SqlResult> {
        let q = query.to_lowercase();

        if let Some(caps) = self.patterns.cluster.captures(&q) {
            let label = &caps[1];
            match self.papers.get_cluster_papers(label).await? {
                Some(papers) => {
                    return Ok(SqlResult::papers(SqlRule::Cluster { cluster_id: label.to_string() }, papers));
                }
                None => debug!("No cluster {}, trying the next rule", label),
            }
        }

        if let Some(year) = self.patterns.after.captures(&q).and_then(|c| c[1].parse::<i64>().ok()) {
            let papers = self.papers.papers_from_year(year).await?;
            return Ok(SqlResult::papers(SqlRule::FromYear { year }, papers));
        }

        if let Some(year) = self.patterns.before.captures(&q).and_then(|c| c[1].parse::<i64>().ok()) {
            let papers = self.papers.papers_before_year(year).await?;
            return Ok(SqlResult::papers(SqlRule::BeforeYear { year }, papers));
        }

        if q.contains("keyword") {
            if let Some(term) = keyword_term(&q) {
                let hits = self.papers.search_keywords(term).await?;
                return Ok(SqlResult::keywords(SqlRule::Keyword { term: term.to_string() }, hits));
            }
        }

        let papers = self.papers.list_papers(DEFAULT_PAPER_LISTING).await?;
        Ok(SqlResult::papers(SqlRule::Listing { limit: DEFAULT_PAPER_LISTING }, papers))
    }

    /// Entity listing, related-paper lookup, or a translated graph query.
    pub async fn run_graph(&self, query: &str) -> Result<GraphResult> {
        let q = query.to_lowercase();

        if self.patterns.entity_word.is_match(&q) {
            let entity_type = self.patterns.entity_type(&q);
            let limit = self
                .patterns
                .top_n
                .captures(&q)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(DEFAULT_ENTITY_LISTING);
            let entities = self.graph.get_entities(entity_type, limit).await?;
            return Ok(GraphResult::Entities {
                entity_type: entity_type.map(|t| t.as_str().to_string()),
                entities,
            });
        }

        if let Some(name) = self.patterns.related_entity(&q) {
            return match self.graph.get_entity_by_name(&name).await? {
                Some(entity) => {
                    let papers = self.graph.get_related_papers(&entity.entity_id, RELATED_PAPER_LIMIT).await?;
                    Ok(GraphResult::RelatedPapers { entity: entity.name, entity_id: entity.entity_id, papers })
                }
                None => {
                    info!("Entity '{}' not found in the graph", name);
                    Ok(GraphResult::NotFound { entity: name })
                }
            };
        }

        match self.translator.translate(&q) {
            Some(translated) => {
                let rows = self.graph.run_translated(&translated).await?;
                Ok(GraphResult::Translated { query: translated, rows })
            }
            None => Ok(GraphResult::Unrecognized { query: query.to_string() }),
        }
    }

    /// Related papers of the named entity; empty when the name does not resolve.
    async fn graph_papers(&self, name: &str) -> astrokg_kg::StoreResult<Vec<String>> {
        match self.graph.get_entity_by_name(name).await? {
            Some(entity) => self.graph.get_related_papers(&entity.entity_id, RELATED_PAPER_LIMIT).await,
            None => Ok(Vec::new()),
        }
    }

    /// Graph-derived paper set intersected with the relational result.
    ///
    /// An empty graph set filters nothing: all SQL papers pass through.
    pub async fn run_hybrid(&self, query: &str) -> Result<QueryResult> {
        let q = query.to_lowercase();
        let entity = self.patterns.related_entity(&q);

        let mut graph_degraded = false;
        let graph_papers = match &entity {
            Some(name) => match self.graph_papers(name).await {
                Ok(papers) => papers,
                Err(e) => {
                    warn!("Graph lookup for '{}' failed, answering from SQL only: {}", name, e);
                    graph_degraded = true;
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let sql = self.run_sql(query).await?;
        let sql_papers = sql.papers.clone().unwrap_or_default();
        let combined = if graph_papers.is_empty() {
            sql_papers
        } else {
            let wanted: HashSet<&str> = graph_papers.iter().map(String::as_str).collect();
            sql_papers
                .into_iter()
                .filter(|p| wanted.contains(p.paper_id.as_str()))
                .collect()
        };
        debug!(
            "Hybrid: {} graph papers, {} combined",
            graph_papers.len(),
            combined.len()
        );

        Ok(QueryResult::Hybrid { entity, graph_papers, sql, combined, graph_degraded })
    }
}

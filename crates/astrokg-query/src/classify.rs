//! Query classification.
//!
//! Three fixed phrase sets decide where a query goes. Matching is a plain
//! substring test on the lowercased query; there is no "no match" outcome.

use serde::Serialize;

/// Phrases that point at paper metadata held in the relational store.
pub const RELATIONAL_SIGNALS: &[&str] = &[
    "year", "keyword", "cluster", "abstract", "title", "summary", "journal", "doi", "after", "before",
];

/// Phrases that point at the knowledge graph.
pub const GRAPH_SIGNALS: &[&str] = &[
    "entity", "entities", "relation", "connected", "linked", "graph", "node", "edge", "related to",
];

/// Phrases that join a graph lookup to a relational filter.
pub const HYBRID_HOOKS: &[&str] = &[
    "connected to", "and in cluster", "and year", "and keyword", "and after", "and before",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryClass {
    Sql,
    Graph,
    Hybrid,
}

impl QueryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryClass::Sql    => "SQL",
            QueryClass::Graph  => "GRAPH",
            QueryClass::Hybrid => "HYBRID",
        }
    }
}

fn any_of(query: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| query.contains(p))
}

/// A hybrid hook, or both a relational and a graph signal, makes a query
/// HYBRID. Otherwise a graph signal makes it GRAPH, and everything else is SQL.
pub fn classify(query: &str) -> QueryClass {
    let q = query.to_lowercase();
    let relational = any_of(&q, RELATIONAL_SIGNALS);
    let graph = any_of(&q, GRAPH_SIGNALS);

    if any_of(&q, HYBRID_HOOKS) || (relational && graph) {
        QueryClass::Hybrid
    } else if graph {
        QueryClass::Graph
    } else {
        QueryClass::Sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_hook_wins() {
        assert_eq!(classify("papers related to radiation and in cluster 3"), QueryClass::Hybrid);
        assert_eq!(classify("genes connected to bone"), QueryClass::Hybrid);
    }

    #[test]
    fn test_both_signal_sets_make_hybrid() {
        assert_eq!(classify("entities in papers after 2020"), QueryClass::Hybrid);
    }

    #[test]
    fn test_graph_only() {
        assert_eq!(classify("papers related to unknownentity123"), QueryClass::Graph);
        assert_eq!(classify("Show condition ENTITIES"), QueryClass::Graph);
    }

    #[test]
    fn test_default_is_sql() {
        assert_eq!(classify("papers in cluster 3"), QueryClass::Sql);
        assert_eq!(classify("what affects bone?"), QueryClass::Sql);
        assert_eq!(classify(""), QueryClass::Sql);
    }
}

//! Table layout and record types for the relational paper store.

use serde::{Deserialize, Serialize};

pub const TABLE_PAPERS: &str = "papers";
pub const TABLE_SUMMARIES: &str = "summaries";
pub const TABLE_KEYWORDS: &str = "keywords";
pub const TABLE_CLUSTERS: &str = "clusters";
pub const TABLE_PAPER_KEYWORD: &str = "paper_keyword";
pub const TABLE_PAPER_CLUSTER: &str = "paper_cluster";

/// Statements run by `init_schema`, in order. Each is idempotent.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS papers (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE,
        title       TEXT,
        authors     TEXT,
        year        INTEGER,
        journal     TEXT,
        doi_url     TEXT,
        abstract    TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS summaries (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        text     TEXT NOT NULL,
        method   TEXT,
        paper_id INTEGER NOT NULL UNIQUE REFERENCES papers(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS keywords (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        text  TEXT NOT NULL,
        score REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clusters (
        id                     INTEGER PRIMARY KEY AUTOINCREMENT,
        label                  TEXT NOT NULL UNIQUE,
        summary_text           TEXT,
        representative_keyword TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paper_keyword (
        paper_id   INTEGER NOT NULL REFERENCES papers(id),
        keyword_id INTEGER NOT NULL REFERENCES keywords(id),
        PRIMARY KEY (paper_id, keyword_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paper_cluster (
        paper_id   INTEGER NOT NULL REFERENCES papers(id),
        cluster_id INTEGER NOT NULL REFERENCES clusters(id),
        PRIMARY KEY (paper_id, cluster_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_papers_year ON papers(year)",
    "CREATE INDEX IF NOT EXISTS idx_keywords_text ON keywords(text)",
];

/// A paper as loaded from `papers.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaper {
    pub paper_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub doi_url: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
}

/// Listing row returned by every paper query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaperBrief {
    pub paper_id: String,
    pub title: Option<String>,
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

/// Full paper with its summary, keyword texts and cluster labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperDetails {
    pub paper_id: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub year: Option<i64>,
    pub journal: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub clusters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    pub summary: Option<String>,
    pub representative_keyword: Option<String>,
}

/// A keyword matching a search term, with the papers it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub keyword: String,
    pub score: Option<f64>,
    pub papers: Vec<String>,
}

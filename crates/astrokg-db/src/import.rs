//! CSV loaders for the relational store.
//!
//! `papers.csv` is required and must carry a `paper_id` column. The outputs of
//! the upstream summarization, clustering and keyword stages are optional:
//! a missing file is skipped, a malformed row is logged and skipped, and a row
//! naming an unknown paper is skipped.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DbError, Result};
use crate::schema::{ClusterSummary, NewPaper};
use crate::store::PaperStore;

pub const PAPERS_CSV: &str = "papers.csv";
pub const SUMMARIES_CSV: &str = "summaries.csv";
pub const CLUSTERS_CSV: &str = "clusters.csv";
pub const CLUSTER_SUMMARIES_CSV: &str = "cluster_summaries.csv";
pub const KEYWORDS_CSV: &str = "cluster_keywords.csv";

#[derive(Debug, Deserialize)]
struct SummaryRow {
    paper_id: String,
    summary: String,
    #[serde(default)]
    summary_model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterSummaryRow {
    cluster_id: String,
    #[serde(default)]
    cluster_summary: Option<String>,
    #[serde(default)]
    representative_keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterRow {
    paper_id: String,
    cluster_id: String,
}

#[derive(Debug, Deserialize)]
struct KeywordRow {
    paper_id: String,
    keyword: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub papers: usize,
    pub summaries: usize,
    pub clusters: usize,
    pub assignments: usize,
    pub keywords: usize,
    /// Rows naming a paper that is not in the store.
    pub skipped: usize,
}

fn open(path: &Path) -> Result<csv::Reader<File>> {
    csv::Reader::from_path(path).map_err(|source| DbError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = open(path)?;
    let mut rows = Vec::new();
    for (n, row) in reader.deserialize::<T>().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping row {} of {}: {}", n + 1, path.display(), e),
        }
    }
    Ok(rows)
}

/// Same as [`read_rows`], but an absent file yields `None`.
fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.is_file() {
        info!("{} not found, skipping", path.display());
        return Ok(None);
    }
    read_rows(path).map(Some)
}

/// Read `papers.csv`. Fails if the file or its `paper_id` column is missing.
pub fn read_papers_csv(path: &Path) -> Result<Vec<NewPaper>> {
    if !path.is_file() {
        return Err(DbError::MissingInput(path.display().to_string()));
    }
    let mut reader = open(path)?;
    let headers = reader.headers().map_err(|source| DbError::Csv {
        path: path.display().to_string(),
        source,
    })?;
    if !headers.iter().any(|h| h == "paper_id") {
        return Err(DbError::MissingInput(format!("column 'paper_id' in {}", path.display())));
    }
    drop(reader);
    read_rows(path)
}

/// Skip rows that reference an unknown paper; propagate anything else.
fn tolerate_missing_paper(result: Result<()>, skipped: &mut usize) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(DbError::PaperNotFound(id)) => {
            debug!("No paper {}, row skipped", id);
            *skipped += 1;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Load `papers.csv` from `input_dir`, then whatever upstream outputs exist in `outputs_dir`.
pub async fn load_directory(store: &dyn PaperStore, input_dir: &Path, outputs_dir: &Path) -> Result<LoadReport> {
    store.init_schema().await?;
    let mut report = LoadReport {
        papers: store.import_papers_csv(&input_dir.join(PAPERS_CSV)).await?,
        ..LoadReport::default()
    };

    if let Some(rows) = read_optional::<SummaryRow>(&outputs_dir.join(SUMMARIES_CSV))? {
        for row in rows {
            let result = store
                .insert_summary(&row.paper_id, &row.summary, row.summary_model.as_deref())
                .await;
            if tolerate_missing_paper(result, &mut report.skipped)? {
                report.summaries += 1;
            }
        }
    }

    if let Some(rows) = read_optional::<ClusterSummaryRow>(&outputs_dir.join(CLUSTER_SUMMARIES_CSV))? {
        for row in rows {
            store
                .upsert_cluster(&ClusterSummary {
                    cluster_id: row.cluster_id,
                    summary: row.cluster_summary,
                    representative_keyword: row.representative_keyword,
                })
                .await?;
            report.clusters += 1;
        }
    }

    if let Some(rows) = read_optional::<ClusterRow>(&outputs_dir.join(CLUSTERS_CSV))? {
        for row in rows {
            let result = store.assign_cluster(&row.paper_id, &row.cluster_id).await;
            if tolerate_missing_paper(result, &mut report.skipped)? {
                report.assignments += 1;
            }
        }
    }

    if let Some(rows) = read_optional::<KeywordRow>(&outputs_dir.join(KEYWORDS_CSV))? {
        for row in rows {
            let result = store.insert_keyword(&row.paper_id, &row.keyword, row.score).await;
            if tolerate_missing_paper(result, &mut report.skipped)? {
                report.keywords += 1;
            }
        }
    }

    info!(
        "Loaded {} papers, {} summaries, {} clusters, {} cluster assignments, {} keywords ({} rows skipped)",
        report.papers, report.summaries, report.clusters, report.assignments, report.keywords, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_papers_csv_requires_paper_id_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PAPERS_CSV);
        fs::write(&path, "id,title\n1,Bone\n").unwrap();
        let err = read_papers_csv(&path).unwrap_err();
        assert!(err.to_string().contains("paper_id"));
    }

    #[test]
    fn test_row_with_unparseable_year_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PAPERS_CSV);
        fs::write(
            &path,
            "paper_id,title,year,abstract\nP1,Bone loss,2021,Text.\nP2,Muscle,unknown,Text.\n",
        )
        .unwrap();
        let papers = read_papers_csv(&path).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].year, Some(2021));
        assert_eq!(papers[0].abstract_text.as_deref(), Some("Text."));
    }

    #[test]
    fn test_missing_papers_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_papers_csv(&dir.path().join(PAPERS_CSV)).unwrap_err();
        assert!(matches!(err, DbError::MissingInput(_)));
    }
}

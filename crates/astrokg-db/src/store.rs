//! The relational store contract.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::import::read_papers_csv;
use crate::schema::{ClusterSummary, KeywordHit, NewPaper, PaperBrief, PaperDetails};

/// Papers, summaries, keywords and clusters.
///
/// Reads return rows in insertion order. Writes that reference a paper fail
/// with [`DbError::PaperNotFound`](crate::DbError::PaperNotFound) when the
/// paper has not been inserted.
#[async_trait]
pub trait PaperStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Create the tables if they do not exist.
    async fn init_schema(&self) -> Result<()>;

    async fn list_papers(&self, limit: usize) -> Result<Vec<PaperBrief>>;

    async fn get_paper_details(&self, paper_id: &str) -> Result<Option<PaperDetails>>;

    async fn get_cluster_summaries(&self) -> Result<Vec<ClusterSummary>>;

    /// Members of the cluster labelled `label`, or `None` if there is no such cluster.
    async fn get_cluster_papers(&self, label: &str) -> Result<Option<Vec<PaperBrief>>>;

    /// Papers published in `year` or later.
    async fn papers_from_year(&self, year: i64) -> Result<Vec<PaperBrief>>;

    /// Papers published strictly before `year`.
    async fn papers_before_year(&self, year: i64) -> Result<Vec<PaperBrief>>;

    /// Keywords whose text contains `term`, case-insensitively.
    async fn search_keywords(&self, term: &str) -> Result<Vec<KeywordHit>>;

    /// Returns false when a paper with the same id already exists.
    async fn insert_paper(&self, paper: &NewPaper) -> Result<bool>;

    /// Set the summary of a paper, replacing any previous one.
    async fn insert_summary(&self, paper_id: &str, text: &str, method: Option<&str>) -> Result<()>;

    async fn insert_keyword(&self, paper_id: &str, text: &str, score: Option<f64>) -> Result<()>;

    /// Create or update a cluster. Absent fields keep their stored values.
    async fn upsert_cluster(&self, cluster: &ClusterSummary) -> Result<()>;

    /// Add a paper to a cluster, creating the cluster if needed.
    async fn assign_cluster(&self, paper_id: &str, label: &str) -> Result<()>;

    /// Insert every paper in a `papers.csv`; returns how many were new.
    async fn import_papers_csv(&self, path: &Path) -> Result<usize> {
        let papers = read_papers_csv(path)?;
        let mut inserted = 0;
        for paper in &papers {
            if self.insert_paper(paper).await? {
                inserted += 1;
            }
        }
        info!(
            "Imported {} new papers from {} ({} already present)",
            inserted,
            path.display(),
            papers.len() - inserted
        );
        Ok(inserted)
    }

    async fn close(&self);
}

//! SQLite implementation of [`PaperStore`].

use std::str::FromStr;

use astrokg_common::DatabaseConfig;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{DbError, Result};
use crate::schema::{ClusterSummary, KeywordHit, NewPaper, PaperBrief, PaperDetails, SCHEMA};
use crate::store::PaperStore;

/// SQLite-backed paper store.
#[derive(Clone)]
pub struct SqlitePaperStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PaperRow {
    external_id: String,
    title: Option<String>,
    authors: Option<String>,
    year: Option<i64>,
    journal: Option<String>,
    doi_url: Option<String>,
    #[sqlx(rename = "abstract")]
    abstract_text: Option<String>,
}

/// `%term%` with LIKE wildcards in `term` escaped by `\`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqlitePaperStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `config.url`, creating the file if needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::InvalidUrl(format!("{}: {}", config.url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        info!("Connected to SQLite at {}", config.url);
        Ok(Self::new(pool))
    }

    /// Private in-memory database on a single long-lived connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::InvalidUrl(e.to_string()))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn papers_where(&self, condition: &str, year: i64) -> Result<Vec<PaperBrief>> {
        let sql = format!(
            "SELECT external_id AS paper_id, title, year, journal FROM papers WHERE {} ORDER BY id",
            condition
        );
        let rows = sqlx::query_as::<_, PaperBrief>(&sql)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl PaperStore for SqlitePaperStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("SQLite schema ready");
        Ok(())
    }

    async fn list_papers(&self, limit: usize) -> Result<Vec<PaperBrief>> {
        let rows = sqlx::query_as::<_, PaperBrief>(
            "SELECT external_id AS paper_id, title, year, journal FROM papers ORDER BY id LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_paper_details(&self, paper_id: &str) -> Result<Option<PaperDetails>> {
        let Some(paper) = sqlx::query_as::<_, PaperRow>(
            r#"
            SELECT external_id, title, authors, year, journal, doi_url, abstract
            FROM papers
            WHERE external_id = ?
            "#,
        )
        .bind(paper_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let summary: Option<String> = sqlx::query_scalar(
            r#"
            SELECT s.text FROM summaries s
            JOIN papers p ON p.id = s.paper_id
            WHERE p.external_id = ?
            "#,
        )
        .bind(paper_id)
        .fetch_optional(&self.pool)
        .await?;

        let keywords: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT k.text FROM keywords k
            JOIN paper_keyword pk ON pk.keyword_id = k.id
            JOIN papers p ON p.id = pk.paper_id
            WHERE p.external_id = ?
            ORDER BY k.id
            "#,
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await?;

        let clusters: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT c.label FROM clusters c
            JOIN paper_cluster pc ON pc.cluster_id = c.id
            JOIN papers p ON p.id = pc.paper_id
            WHERE p.external_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(PaperDetails {
            paper_id: paper.external_id,
            title: paper.title,
            authors: paper.authors,
            year: paper.year,
            journal: paper.journal,
            doi: paper.doi_url,
            abstract_text: paper.abstract_text,
            summary,
            keywords,
            clusters,
        }))
    }

    async fn get_cluster_summaries(&self) -> Result<Vec<ClusterSummary>> {
        let rows: Vec<(String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT label, summary_text, representative_keyword FROM clusters ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(cluster_id, summary, representative_keyword)| ClusterSummary {
                cluster_id,
                summary,
                representative_keyword,
            })
            .collect())
    }

    async fn get_cluster_papers(&self, label: &str) -> Result<Option<Vec<PaperBrief>>> {
        let cluster: Option<i64> = sqlx::query_scalar("SELECT id FROM clusters WHERE label = ?")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;
        let Some(cluster) = cluster else {
            return Ok(None);
        };
        let rows = sqlx::query_as::<_, PaperBrief>(
            r#"
            SELECT p.external_id AS paper_id, p.title, p.year, p.journal
            FROM papers p
            JOIN paper_cluster pc ON pc.paper_id = p.id
            WHERE pc.cluster_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(cluster)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(rows))
    }

    async fn papers_from_year(&self, year: i64) -> Result<Vec<PaperBrief>> {
        self.papers_where("year >= ?", year).await
    }

    async fn papers_before_year(&self, year: i64) -> Result<Vec<PaperBrief>> {
        self.papers_where("year < ?", year).await
    }

    async fn search_keywords(&self, term: &str) -> Result<Vec<KeywordHit>> {
        let rows: Vec<(i64, String, Option<f64>)> = sqlx::query_as(
            r"SELECT id, text, score FROM keywords WHERE text LIKE ? ESCAPE '\' ORDER BY id",
        )
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for (id, keyword, score) in rows {
            let papers: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT p.external_id FROM papers p
                JOIN paper_keyword pk ON pk.paper_id = p.id
                WHERE pk.keyword_id = ?
                ORDER BY p.id
                "#,
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
            hits.push(KeywordHit { keyword, score, papers });
        }
        Ok(hits)
    }

    async fn insert_paper(&self, paper: &NewPaper) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO papers (external_id, title, authors, year, journal, doi_url, abstract)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(&paper.paper_id)
        .bind(paper.title.as_deref())
        .bind(paper.authors.as_deref())
        .bind(paper.year)
        .bind(paper.journal.as_deref())
        .bind(paper.doi_url.as_deref())
        .bind(paper.abstract_text.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_summary(&self, paper_id: &str, text: &str, method: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO summaries (text, method, paper_id)
            SELECT ?, ?, id FROM papers WHERE external_id = ?
            ON CONFLICT(paper_id) DO UPDATE SET text = excluded.text, method = excluded.method
            "#,
        )
        .bind(text)
        .bind(method)
        .bind(paper_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::PaperNotFound(paper_id.to_string()));
        }
        Ok(())
    }

    async fn insert_keyword(&self, paper_id: &str, text: &str, score: Option<f64>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let paper: Option<i64> = sqlx::query_scalar("SELECT id FROM papers WHERE external_id = ?")
            .bind(paper_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(paper) = paper else {
            return Err(DbError::PaperNotFound(paper_id.to_string()));
        };
        let keyword = sqlx::query("INSERT INTO keywords (text, score) VALUES (?, ?)")
            .bind(text)
            .bind(score)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        sqlx::query("INSERT OR IGNORE INTO paper_keyword (paper_id, keyword_id) VALUES (?, ?)")
            .bind(paper)
            .bind(keyword)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_cluster(&self, cluster: &ClusterSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clusters (label, summary_text, representative_keyword)
            VALUES (?, ?, ?)
            ON CONFLICT(label) DO UPDATE SET
                summary_text = coalesce(excluded.summary_text, clusters.summary_text),
                representative_keyword = coalesce(excluded.representative_keyword, clusters.representative_keyword)
            "#,
        )
        .bind(&cluster.cluster_id)
        .bind(cluster.summary.as_deref())
        .bind(cluster.representative_keyword.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assign_cluster(&self, paper_id: &str, label: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let paper: Option<i64> = sqlx::query_scalar("SELECT id FROM papers WHERE external_id = ?")
            .bind(paper_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(paper) = paper else {
            return Err(DbError::PaperNotFound(paper_id.to_string()));
        };
        sqlx::query("INSERT INTO clusters (label) VALUES (?) ON CONFLICT(label) DO NOTHING")
            .bind(label)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO paper_cluster (paper_id, cluster_id)
            SELECT ?, id FROM clusters WHERE label = ?
            "#,
        )
        .bind(paper)
        .bind(label)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("SQLite pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bone"), "%bone%");
        assert_eq!(like_pattern("50%_a"), r"%50\%\_a%");
    }

    #[test]
    fn test_in_memory_store_starts_empty() {
        tokio_test::block_on(async {
            let store = SqlitePaperStore::in_memory().await.unwrap();
            store.init_schema().await.unwrap();
            store.init_schema().await.unwrap();
            assert!(store.list_papers(20).await.unwrap().is_empty());
            assert!(store.get_cluster_papers("3").await.unwrap().is_none());
        });
    }

    #[tokio::test]
    async fn test_summary_for_unknown_paper_is_rejected() {
        let store = SqlitePaperStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        let err = store.insert_summary("P404", "text", None).await.unwrap_err();
        assert!(matches!(err, DbError::PaperNotFound(id) if id == "P404"));
    }
}

//! In-memory [`PaperStore`], optionally seeded with a small demo corpus.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{DbError, Result};
use crate::schema::{ClusterSummary, KeywordHit, NewPaper, PaperBrief, PaperDetails};
use crate::store::PaperStore;

#[derive(Debug, Default)]
struct PaperState {
    papers: Vec<NewPaper>,
    summaries: HashMap<String, String>,
    keywords: Vec<KeywordHit>,
    clusters: Vec<ClusterSummary>,
    members: HashMap<String, BTreeSet<String>>,
}

impl PaperState {
    fn has_paper(&self, paper_id: &str) -> bool {
        self.papers.iter().any(|p| p.paper_id == paper_id)
    }

    fn require_paper(&self, paper_id: &str) -> Result<()> {
        if self.has_paper(paper_id) {
            Ok(())
        } else {
            Err(DbError::PaperNotFound(paper_id.to_string()))
        }
    }

    fn briefs<'a>(&'a self, keep: impl Fn(&NewPaper) -> bool + 'a) -> impl Iterator<Item = PaperBrief> + 'a {
        self.papers.iter().filter(move |p| keep(p)).map(brief)
    }

    fn cluster_mut(&mut self, label: &str) -> &mut ClusterSummary {
        let index = match self.clusters.iter().position(|c| c.cluster_id == label) {
            Some(index) => index,
            None => {
                self.clusters.push(ClusterSummary {
                    cluster_id: label.to_string(),
                    summary: None,
                    representative_keyword: None,
                });
                self.clusters.len() - 1
            }
        };
        &mut self.clusters[index]
    }
}

fn brief(paper: &NewPaper) -> PaperBrief {
    PaperBrief {
        paper_id: paper.paper_id.clone(),
        title: paper.title.clone(),
        year: paper.year,
        journal: paper.journal.clone(),
    }
}

pub struct MemoryPaperStore {
    name: &'static str,
    state: RwLock<PaperState>,
}

impl MemoryPaperStore {
    pub fn new() -> Self {
        Self { name: "memory", state: RwLock::new(PaperState::default()) }
    }

    /// Five space-biology papers in three clusters, matching the demo graph's paper ids.
    pub fn demo() -> Self {
        let mut state = PaperState::default();
        let papers = [
            ("P1", "Microgravity-induced bone loss in mice", 2019, "npj Microgravity"),
            ("P2", "Radiation exposure and oxidative stress in spaceflight", 2020, "Life Sciences in Space Research"),
            ("P3", "Osteoclast activity under simulated microgravity", 2021, "Bone"),
            ("P4", "Muscle atrophy during long-duration spaceflight", 2022, "Journal of Applied Physiology"),
            ("P5", "Transcriptomic response of mouse muscle to spaceflight", 2023, "Scientific Reports"),
        ];
        for (id, title, year, journal) in papers {
            state.papers.push(NewPaper {
                paper_id: id.to_string(),
                title: Some(title.to_string()),
                authors: None,
                year: Some(year),
                journal: Some(journal.to_string()),
                doi_url: None,
                abstract_text: None,
            });
            state.summaries.insert(id.to_string(), format!("{}.", title));
        }

        let clusters = [
            ("1", "Musculoskeletal adaptation to spaceflight", "bone loss", &["P1", "P4"][..]),
            ("2", "Gene expression in flight tissues", "gene expression", &["P5"][..]),
            ("3", "Cellular stress and bone remodelling", "oxidative stress", &["P2", "P3"][..]),
        ];
        for (label, summary, keyword, members) in clusters {
            state.clusters.push(ClusterSummary {
                cluster_id: label.to_string(),
                summary: Some(summary.to_string()),
                representative_keyword: Some(keyword.to_string()),
            });
            state
                .members
                .insert(label.to_string(), members.iter().map(|m| m.to_string()).collect());
        }

        let keywords = [
            ("P1", "bone loss", 0.82),
            ("P2", "radiation dose", 0.9),
            ("P2", "oxidative stress", 0.71),
            ("P3", "bone loss", 0.77),
            ("P4", "muscle atrophy", 0.88),
            ("P5", "gene expression", 0.81),
            ("P5", "muscle atrophy", 0.6),
        ];
        for (paper, keyword, score) in keywords {
            state.keywords.push(KeywordHit {
                keyword: keyword.to_string(),
                score: Some(score),
                papers: vec![paper.to_string()],
            });
        }

        Self { name: "demo", state: RwLock::new(state) }
    }

    fn read(&self) -> RwLockReadGuard<'_, PaperState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PaperState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryPaperStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaperStore for MemoryPaperStore {
    fn backend_name(&self) -> &'static str {
        self.name
    }

    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn list_papers(&self, limit: usize) -> Result<Vec<PaperBrief>> {
        Ok(self.read().briefs(|_| true).take(limit).collect())
    }

    async fn get_paper_details(&self, paper_id: &str) -> Result<Option<PaperDetails>> {
        let state = self.read();
        let Some(paper) = state.papers.iter().find(|p| p.paper_id == paper_id) else {
            return Ok(None);
        };
        let keywords = state
            .keywords
            .iter()
            .filter(|k| k.papers.iter().any(|p| p == paper_id))
            .map(|k| k.keyword.clone())
            .collect();
        let clusters = state
            .clusters
            .iter()
            .filter(|c| state.members.get(&c.cluster_id).is_some_and(|m| m.contains(paper_id)))
            .map(|c| c.cluster_id.clone())
            .collect();
        Ok(Some(PaperDetails {
            paper_id: paper.paper_id.clone(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            year: paper.year,
            journal: paper.journal.clone(),
            doi: paper.doi_url.clone(),
            abstract_text: paper.abstract_text.clone(),
            summary: state.summaries.get(paper_id).cloned(),
            keywords,
            clusters,
        }))
    }

    async fn get_cluster_summaries(&self) -> Result<Vec<ClusterSummary>> {
        Ok(self.read().clusters.clone())
    }

    async fn get_cluster_papers(&self, label: &str) -> Result<Option<Vec<PaperBrief>>> {
        let state = self.read();
        if !state.clusters.iter().any(|c| c.cluster_id == label) {
            return Ok(None);
        }
        let members = state.members.get(label);
        Ok(Some(
            state
                .briefs(|p| members.is_some_and(|m| m.contains(&p.paper_id)))
                .collect(),
        ))
    }

    async fn papers_from_year(&self, year: i64) -> Result<Vec<PaperBrief>> {
        Ok(self.read().briefs(|p| p.year.is_some_and(|y| y >= year)).collect())
    }

    async fn papers_before_year(&self, year: i64) -> Result<Vec<PaperBrief>> {
        Ok(self.read().briefs(|p| p.year.is_some_and(|y| y < year)).collect())
    }

    async fn search_keywords(&self, term: &str) -> Result<Vec<KeywordHit>> {
        let needle = term.to_lowercase();
        Ok(self
            .read()
            .keywords
            .iter()
            .filter(|k| k.keyword.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn insert_paper(&self, paper: &NewPaper) -> Result<bool> {
        let mut state = self.write();
        if state.has_paper(&paper.paper_id) {
            return Ok(false);
        }
        state.papers.push(paper.clone());
        Ok(true)
    }

    async fn insert_summary(&self, paper_id: &str, text: &str, _method: Option<&str>) -> Result<()> {
        let mut state = self.write();
        state.require_paper(paper_id)?;
        state.summaries.insert(paper_id.to_string(), text.to_string());
        Ok(())
    }

    async fn insert_keyword(&self, paper_id: &str, text: &str, score: Option<f64>) -> Result<()> {
        let mut state = self.write();
        state.require_paper(paper_id)?;
        state.keywords.push(KeywordHit {
            keyword: text.to_string(),
            score,
            papers: vec![paper_id.to_string()],
        });
        Ok(())
    }

    async fn upsert_cluster(&self, cluster: &ClusterSummary) -> Result<()> {
        let mut state = self.write();
        let stored = state.cluster_mut(&cluster.cluster_id);
        if cluster.summary.is_some() {
            stored.summary = cluster.summary.clone();
        }
        if cluster.representative_keyword.is_some() {
            stored.representative_keyword = cluster.representative_keyword.clone();
        }
        Ok(())
    }

    async fn assign_cluster(&self, paper_id: &str, label: &str) -> Result<()> {
        let mut state = self.write();
        state.require_paper(paper_id)?;
        state.cluster_mut(label);
        state
            .members
            .entry(label.to_string())
            .or_default()
            .insert(paper_id.to_string());
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(papers: &[PaperBrief]) -> Vec<&str> {
        papers.iter().map(|p| p.paper_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_demo_cluster_three() {
        let store = MemoryPaperStore::demo();
        let papers = store.get_cluster_papers("3").await.unwrap().unwrap();
        assert_eq!(ids(&papers), vec!["P2", "P3"]);
        assert!(store.get_cluster_papers("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_year_thresholds_split_the_corpus() {
        let store = MemoryPaperStore::demo();
        assert_eq!(ids(&store.papers_from_year(2021).await.unwrap()), vec!["P3", "P4", "P5"]);
        assert_eq!(ids(&store.papers_before_year(2021).await.unwrap()), vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn test_keyword_search_is_case_insensitive() {
        let store = MemoryPaperStore::demo();
        let hits = store.search_keywords("BONE").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].papers, vec!["P1"]);
    }

    #[tokio::test]
    async fn test_paper_details_collect_keywords_and_clusters() {
        let store = MemoryPaperStore::demo();
        let details = store.get_paper_details("P2").await.unwrap().unwrap();
        assert_eq!(details.keywords, vec!["radiation dose", "oxidative stress"]);
        assert_eq!(details.clusters, vec!["3"]);
        assert!(details.summary.is_some());
        assert!(store.get_paper_details("P404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assignment_to_unknown_paper_fails() {
        let store = MemoryPaperStore::new();
        let err = store.assign_cluster("P1", "1").await.unwrap_err();
        assert!(matches!(err, DbError::PaperNotFound(_)));
        assert!(store.get_cluster_summaries().await.unwrap().is_empty());
    }
}

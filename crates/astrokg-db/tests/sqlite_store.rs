//! Loading upstream CSV outputs into a SQLite file and reading them back.

use std::fs;
use std::path::Path;

use astrokg_common::DatabaseConfig;
use astrokg_db::{connect_paper_store, load_directory, NewPaper, PaperStore, SqlitePaperStore};

fn write_inputs(input: &Path, outputs: &Path) {
    fs::write(
        input.join("papers.csv"),
        "paper_id,title,authors,year,journal,doi_url,abstract\n\
         P1,Bone loss in orbit,A. Author,2019,npj Microgravity,https://doi.org/10.1/p1,Microgravity reduces bone.\n\
         P2,Radiation and ROS,B. Author,2020,LSSR,,Radiation induces ROS.\n\
         P3,Osteoclasts,C. Author,2021,Bone,,Osteoclasts increase.\n",
    )
    .unwrap();
    fs::write(
        outputs.join("summaries.csv"),
        "paper_id,summary,summary_model\nP1,Bone density falls.,bart\nP9,Orphan.,bart\n",
    )
    .unwrap();
    fs::write(
        outputs.join("cluster_summaries.csv"),
        "cluster_id,cluster_summary\n3,Stress and remodelling\n",
    )
    .unwrap();
    fs::write(outputs.join("clusters.csv"), "paper_id,cluster_id\nP2,3\nP3,3\nP1,1\n").unwrap();
    fs::write(
        outputs.join("cluster_keywords.csv"),
        "paper_id,keyword,score\nP1,bone loss,0.8\nP3,bone_resorption,n/a\n",
    )
    .unwrap();
}

async fn loaded_store(dir: &Path) -> SqlitePaperStore {
    let input = dir.join("data");
    let outputs = input.join("outputs");
    fs::create_dir_all(&outputs).unwrap();
    write_inputs(&input, &outputs);

    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.join("astrokg.db").display()),
        ..DatabaseConfig::default()
    };
    let store = SqlitePaperStore::connect(&config).await.unwrap();
    let report = load_directory(&store, &input, &outputs).await.unwrap();
    assert_eq!(report.papers, 3);
    assert_eq!(report.summaries, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.assignments, 3);
    assert_eq!(report.keywords, 2);
    store
}

#[tokio::test]
async fn test_cluster_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    let papers = store.get_cluster_papers("3").await.unwrap().unwrap();
    let ids: Vec<_> = papers.iter().map(|p| p.paper_id.as_str()).collect();
    assert_eq!(ids, vec!["P2", "P3"]);
    assert!(store.get_cluster_papers("7").await.unwrap().is_none());

    let clusters = store.get_cluster_summaries().await.unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].summary.as_deref(), Some("Stress and remodelling"));
    // created on assignment, so it has no summary
    assert_eq!(clusters[1].cluster_id, "1");
    assert!(clusters[1].summary.is_none());
}

#[tokio::test]
async fn test_details_and_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    let details = store.get_paper_details("P1").await.unwrap().unwrap();
    assert_eq!(details.summary.as_deref(), Some("Bone density falls."));
    assert_eq!(details.keywords, vec!["bone loss"]);
    assert_eq!(details.clusters, vec!["1"]);
    assert_eq!(details.doi.as_deref(), Some("https://doi.org/10.1/p1"));

    let hits = store.search_keywords("BONE").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[1].score.is_none());

    // `_` is literal, not a wildcard
    let hits = store.search_keywords("e_r").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].papers, vec!["P3"]);
}

#[tokio::test]
async fn test_years_and_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    assert_eq!(store.papers_from_year(2020).await.unwrap().len(), 2);
    assert_eq!(store.papers_before_year(2020).await.unwrap().len(), 1);
    assert_eq!(store.list_papers(2).await.unwrap().len(), 2);

    let again = store.import_papers_csv(&dir.path().join("data/papers.csv")).await.unwrap();
    assert_eq!(again, 0);
    let duplicate = NewPaper {
        paper_id: "P1".into(),
        title: None,
        authors: None,
        year: None,
        journal: None,
        doi_url: None,
        abstract_text: None,
    };
    assert!(!store.insert_paper(&duplicate).await.unwrap());
    store.close().await;
}

#[tokio::test]
async fn test_demo_url_selects_memory_store() {
    let config = DatabaseConfig { url: "demo".into(), ..DatabaseConfig::default() };
    let store = connect_paper_store(&config).await.unwrap();
    assert_eq!(store.backend_name(), "demo");
    assert_eq!(store.list_papers(20).await.unwrap().len(), 5);
}

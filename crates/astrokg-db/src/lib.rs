//! astrokg-db: relational store for paper metadata.
//!
//! Papers, their summaries, keywords and cluster assignments, behind the
//! [`PaperStore`] trait. [`SqlitePaperStore`] persists to SQLite through
//! sqlx; [`MemoryPaperStore`] keeps everything in process and can be seeded
//! with a demo corpus.
//!
//! # Example
//!
//! ```rust,no_run
//! use astrokg_common::DatabaseConfig;
//! use astrokg_db::{connect_paper_store, PaperStore};
//!
//! # async fn run() -> astrokg_db::Result<()> {
//! let store = connect_paper_store(&DatabaseConfig::default()).await?;
//! for paper in store.papers_from_year(2020).await? {
//!     println!("{} {:?}", paper.paper_id, paper.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod schema;
pub mod store;
pub mod import;
pub mod sqlite;
pub mod memory;

use std::sync::Arc;

use astrokg_common::DatabaseConfig;
use tracing::info;

pub use error::{DbError, Result};
pub use import::{load_directory, read_papers_csv, LoadReport};
pub use memory::MemoryPaperStore;
pub use schema::{ClusterSummary, KeywordHit, NewPaper, PaperBrief, PaperDetails};
pub use sqlite::SqlitePaperStore;
pub use store::PaperStore;

/// URL selecting the seeded in-memory store instead of SQLite.
pub const DEMO_URL: &str = "demo";

/// Open the configured store and make sure its schema exists.
pub async fn connect_paper_store(config: &DatabaseConfig) -> Result<Arc<dyn PaperStore>> {
    let store: Arc<dyn PaperStore> = if config.url == DEMO_URL {
        Arc::new(MemoryPaperStore::demo())
    } else {
        Arc::new(SqlitePaperStore::connect(config).await?)
    };
    store.init_schema().await?;
    info!("Relational backend: {}", store.backend_name());
    Ok(store)
}

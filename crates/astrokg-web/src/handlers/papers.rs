//! Paper details and cluster summaries from the relational store.

use axum::extract::{Path, State};
use axum::Json;
use astrokg_db::{ClusterSummary, PaperBrief, PaperDetails};

use crate::error::ApiError;
use crate::state::SharedState;

/// GET /api/papers/{paper_id}
pub async fn paper_details(
    State(state): State<SharedState>,
    Path(paper_id): Path<String>,
) -> Result<Json<PaperDetails>, ApiError> {
    state
        .engine
        .papers()
        .get_paper_details(&paper_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("paper {}", paper_id)))
}

/// GET /api/clusters
pub async fn clusters(State(state): State<SharedState>) -> Result<Json<Vec<ClusterSummary>>, ApiError> {
    Ok(Json(state.engine.papers().get_cluster_summaries().await?))
}

/// GET /api/clusters/{label}
pub async fn cluster_papers(
    State(state): State<SharedState>,
    Path(label): Path<String>,
) -> Result<Json<Vec<PaperBrief>>, ApiError> {
    state
        .engine
        .papers()
        .get_cluster_papers(&label)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("cluster {}", label)))
}

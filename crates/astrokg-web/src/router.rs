//! Axum router: URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    system::health,
    query::{run_query, translate, examples},
    entities::list_entities,
    papers::{paper_details, clusters, cluster_papers},
};

/// Build the full API router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health",                get(health))

        // Query federation
        .route("/api/query",             post(run_query))
        .route("/api/translate",         get(translate))
        .route("/api/examples",          get(examples))

        // Graph
        .route("/api/entities",          get(list_entities))

        // Relational
        .route("/api/papers/{paper_id}", get(paper_details))
        .route("/api/clusters",          get(clusters))
        .route("/api/clusters/{label}",  get(cluster_papers))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

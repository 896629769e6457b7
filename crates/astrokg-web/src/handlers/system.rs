//! Liveness.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub graph_backend: &'static str,
    pub paper_backend: &'static str,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        graph_backend: state.engine.graph().backend_name(),
        paper_backend: state.engine.papers().backend_name(),
    })
}

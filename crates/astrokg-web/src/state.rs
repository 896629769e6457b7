//! Shared application state for the web server.

use std::sync::Arc;

use astrokg_query::QueryEngine;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub engine: QueryEngine,
}

impl AppState {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }
}

pub type SharedState = Arc<AppState>;

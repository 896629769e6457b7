//! astrokg-web: HTTP API over the query engine.
//!
//! Routes:
//!   - `POST /api/query`       classify and answer a free-text query
//!   - `GET  /api/translate`   preview the graph query for a question
//!   - `GET  /api/examples`    canonical graph questions
//!   - `GET  /api/entities`    ranked entities, optionally by type
//!   - `GET  /api/papers/{id}` paper details
//!   - `GET  /api/clusters`    cluster summaries and members
//!   - `GET  /health`

pub mod router;
pub mod handlers;
pub mod state;
pub mod error;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, SharedState};

use astrokg_common::ServerConfig;
use tracing::info;

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("astrokg API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}

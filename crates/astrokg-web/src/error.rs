//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unrecognized query: {0}")]
    Unrecognized(String),

    #[error(transparent)]
    Query(#[from] astrokg_query::QueryError),

    #[error(transparent)]
    Graph(#[from] astrokg_kg::GraphStoreError),

    #[error(transparent)]
    Database(#[from] astrokg_db::DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unrecognized(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Query(_) | ApiError::Graph(_) | ApiError::Database(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

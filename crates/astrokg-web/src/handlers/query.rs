//! Free-text query, translation preview and examples.

use axum::extract::{Query, State};
use axum::Json;
use astrokg_kg::graph_query::GraphParam;
use astrokg_kg::GraphQuery;
use astrokg_query::{example_queries, QueryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub query: GraphQuery,
    pub cypher: String,
    pub params: Map<String, Value>,
}

fn param_value(param: GraphParam) -> Value {
    match param {
        GraphParam::Text(s) => Value::String(s),
        GraphParam::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        GraphParam::Int(n) => Value::from(n),
    }
}

/// POST /api/query
pub async fn run_query(
    State(state): State<SharedState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    Ok(Json(state.engine.run_query(query).await?))
}

/// GET /api/translate?q=
pub async fn translate(
    State(state): State<SharedState>,
    Query(params): Query<TranslateParams>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let translated = state
        .engine
        .translator()
        .translate(&params.q)
        .ok_or_else(|| ApiError::Unrecognized(params.q.clone()))?;
    let cypher = translated.cypher();
    let params = translated
        .params()
        .into_iter()
        .map(|(name, value)| (name.to_string(), param_value(value)))
        .collect();
    Ok(Json(TranslateResponse { query: translated, cypher, params }))
}

/// GET /api/examples
pub async fn examples() -> Json<Vec<&'static str>> {
    Json(example_queries())
}

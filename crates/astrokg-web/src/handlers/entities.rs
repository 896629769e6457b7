//! Ranked entity listing.

use axum::extract::{Query, State};
use axum::Json;
use astrokg_common::EntityType;
use astrokg_kg::repository::DEFAULT_ENTITY_LIMIT;
use astrokg_kg::EntitySummary;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

const MAX_ENTITY_LIMIT: usize = 500;

#[derive(Debug, Deserialize, Default)]
pub struct EntityFilter {
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/entities?type=&limit=
pub async fn list_entities(
    State(state): State<SharedState>,
    Query(filter): Query<EntityFilter>,
) -> Result<Json<Vec<EntitySummary>>, ApiError> {
    let entity_type = match filter.entity_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(word) => Some(
            EntityType::from_word(word)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown entity type '{}'", word)))?,
        ),
    };
    let limit = filter.limit.unwrap_or(DEFAULT_ENTITY_LIMIT).min(MAX_ENTITY_LIMIT);
    Ok(Json(state.engine.graph().get_entities(entity_type, limit).await?))
}

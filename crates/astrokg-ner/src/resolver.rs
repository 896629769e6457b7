//! Cross-corpus entity resolution.
//!
//! Mentions are grouped by type, then by normalized name. Each normalized name
//! is compared against the canonical entities already created for its type; if
//! one scores above the similarity threshold the name is merged into it,
//! otherwise a new entity is created.
//!
//! This is greedy incremental clustering, so the partition depends on the order
//! names are visited. Types and names are visited in lexicographic order, which
//! makes the catalog reproducible for a given set of mentions, but it is not a
//! globally optimal clustering.

use std::collections::{BTreeMap, BTreeSet};

use astrokg_common::{Entity, EntityType, RawMention};
use tracing::{debug, info};

use crate::normalize::normalize_entity_name;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;

/// Entity catalog plus the paper → entity ids map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub entities: Vec<Entity>,
    pub paper_entities: BTreeMap<String, Vec<String>>,
}

pub struct EntityResolver {
    synonyms: BTreeMap<String, String>,
    similarity_threshold: f64,
}

/// Symmetric 0-100 similarity.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

impl EntityResolver {
    pub fn new(synonyms: BTreeMap<String, String>, similarity_threshold: f64) -> Self {
        Self { synonyms, similarity_threshold }
    }

    pub fn resolve(&self, mentions: &[RawMention]) -> Resolution {
        // type (by name) -> normalized name -> mentions
        let mut grouped: BTreeMap<&'static str, (EntityType, BTreeMap<String, Vec<&RawMention>>)> =
            BTreeMap::new();
        for mention in mentions {
            let basis = if mention.normalized_name.trim().is_empty() {
                &mention.surface_form
            } else {
                &mention.normalized_name
            };
            let normalized = normalize_entity_name(basis, &self.synonyms);
            if normalized.is_empty() {
                continue;
            }
            grouped
                .entry(mention.entity_type.as_str())
                .or_insert_with(|| (mention.entity_type, BTreeMap::new()))
                .1
                .entry(normalized)
                .or_default()
                .push(mention);
        }

        let mut entities: Vec<Entity> = Vec::new();
        let mut paper_entities: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut merged = 0usize;

        for (_, (entity_type, names)) in grouped {
            let type_start = entities.len();
            for (normalized, group) in names {
                let target = entities[type_start..]
                    .iter()
                    .position(|e| name_similarity(&normalized, &e.name) > self.similarity_threshold)
                    .map(|i| type_start + i);

                let entity = match target {
                    Some(idx) => {
                        debug!("Merging '{}' into {} ('{}')", normalized, entities[idx].entity_id, entities[idx].name);
                        merged += 1;
                        let entity = &mut entities[idx];
                        entity.synonyms.insert(normalized.clone());
                        entity
                    }
                    None => {
                        let entity_id = format!("E{:05}", entities.len() + 1);
                        let mut entity = Entity::new(entity_id, normalized.clone(), entity_type);
                        entity.synonyms.insert(normalized.clone());
                        entities.push(entity);
                        let last = entities.len() - 1;
                        &mut entities[last]
                    }
                };

                for mention in group {
                    entity.synonyms.insert(mention.surface_form.trim().to_string());
                    entity.papers.insert(mention.paper_id.clone());
                    paper_entities
                        .entry(mention.paper_id.clone())
                        .or_default()
                        .insert(entity.entity_id.clone());
                }
            }
        }

        info!(
            "Entity resolution: {} mentions -> {} entities ({} names merged)",
            mentions.len(),
            entities.len(),
            merged
        );

        Resolution {
            entities,
            paper_entities: paper_entities
                .into_iter()
                .map(|(paper, ids)| (paper, ids.into_iter().collect()))
                .collect(),
        }
    }
}

//! Importance scoring and graph filtering.
//!
//! score = papers × 1.0 + relations × 2.0 + relation type diversity × 1.5,
//! always computed against the full relation catalog.

use std::collections::{BTreeMap, HashMap, HashSet};

use astrokg_common::{Entity, EntityType, FilteredGraph, Relation, RelationType};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregation::round_to;

pub const DEFAULT_IMPORTANCE_THRESHOLD: f64 = 20.0;
pub const PAPER_WEIGHT: f64 = 1.0;
pub const RELATION_WEIGHT: f64 = 2.0;
pub const DIVERSITY_WEIGHT: f64 = 1.5;
const TOP_ENTITIES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityScore {
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub score: f64,
    pub paper_count: usize,
    pub relation_count: usize,
    pub relation_type_diversity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub entities: usize,
    pub relations: usize,
    pub isolated_entities: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredStats {
    pub entities: usize,
    pub relations: usize,
    pub isolated_entities: usize,
    pub avg_relations_per_entity: f64,
    pub graph_density_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub entities_removed: usize,
    pub relations_removed: usize,
    pub entity_reduction_percent: f64,
    pub relation_reduction_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringReport {
    pub threshold: f64,
    pub original: GraphStats,
    pub filtered: FilteredStats,
    pub reduction: Reduction,
    pub entity_types: BTreeMap<String, usize>,
    pub relation_types: BTreeMap<String, usize>,
    pub top_entities: Vec<EntityScore>,
}

/// Score every entity against the full relation catalog, in catalog order.
pub fn score_entities(entities: &[Entity], relations: &[Relation]) -> Vec<EntityScore> {
    let mut touching: HashMap<&str, (usize, HashSet<RelationType>)> = HashMap::new();
    for relation in relations {
        for endpoint in [relation.source.as_str(), relation.target.as_str()] {
            let entry = touching.entry(endpoint).or_default();
            entry.0 += 1;
            entry.1.insert(relation.relation_type);
        }
    }

    entities
        .iter()
        .map(|entity| {
            let (relation_count, diversity) = touching
                .get(entity.entity_id.as_str())
                .map(|(count, types)| (*count, types.len()))
                .unwrap_or((0, 0));
            let paper_count = entity.paper_count();
            let score = paper_count as f64 * PAPER_WEIGHT
                + relation_count as f64 * RELATION_WEIGHT
                + diversity as f64 * DIVERSITY_WEIGHT;
            EntityScore {
                entity_id: entity.entity_id.clone(),
                name: entity.name.clone(),
                entity_type: entity.entity_type,
                score,
                paper_count,
                relation_count,
                relation_type_diversity: diversity,
            }
        })
        .collect()
}

/// Keep entities scoring at least `threshold`, then relations whose both
/// endpoints survived.
pub fn filter_graph(entities: &[Entity], relations: &[Relation], threshold: f64) -> (FilteredGraph, FilteringReport) {
    let scores = score_entities(entities, relations);

    let kept: Vec<Entity> = entities
        .iter()
        .zip(&scores)
        .filter(|(_, s)| s.score >= threshold)
        .map(|(entity, s)| {
            let mut entity = entity.clone();
            entity.importance_score = Some(s.score);
            entity.relation_count = Some(s.relation_count);
            entity
        })
        .collect();

    let kept_ids: HashSet<&str> = kept.iter().map(|e| e.entity_id.as_str()).collect();
    let kept_relations: Vec<Relation> = relations
        .iter()
        .filter(|r| kept_ids.contains(r.source.as_str()) && kept_ids.contains(r.target.as_str()))
        .cloned()
        .collect();

    let mut top_entities: Vec<EntityScore> = scores.into_iter().filter(|s| kept_ids.contains(s.entity_id.as_str())).collect();
    top_entities.sort_by(|a, b| b.score.total_cmp(&a.score));
    top_entities.truncate(TOP_ENTITIES);

    let mut entity_types = BTreeMap::new();
    for entity in &kept {
        *entity_types.entry(entity.entity_type.as_str().to_string()).or_insert(0) += 1;
    }
    let mut relation_types = BTreeMap::new();
    for relation in &kept_relations {
        *relation_types.entry(relation.relation_type.as_str().to_string()).or_insert(0) += 1;
    }

    let (e, r) = (kept.len(), kept_relations.len());
    let report = FilteringReport {
        threshold,
        original: GraphStats {
            entities: entities.len(),
            relations: relations.len(),
            isolated_entities: count_isolated(entities, relations),
        },
        filtered: FilteredStats {
            entities: e,
            relations: r,
            isolated_entities: count_isolated(&kept, &kept_relations),
            avg_relations_per_entity: if e > 0 { round_to(2.0 * r as f64 / e as f64, 2) } else { 0.0 },
            graph_density_percent: if e > 1 {
                round_to(r as f64 / (e as f64 * (e as f64 - 1.0)) * 100.0, 2)
            } else {
                0.0
            },
        },
        reduction: Reduction {
            entities_removed: entities.len() - e,
            relations_removed: relations.len() - r,
            entity_reduction_percent: percent(entities.len() - e, entities.len()),
            relation_reduction_percent: percent(relations.len() - r, relations.len()),
        },
        entity_types,
        relation_types,
        top_entities,
    };

    info!(
        "Filtering at threshold {}: {} -> {} entities, {} -> {} relations",
        threshold,
        entities.len(),
        e,
        relations.len(),
        r
    );

    (FilteredGraph { entities: kept, relations: kept_relations }, report)
}

/// Entities with no relation at either end.
pub fn count_isolated(entities: &[Entity], relations: &[Relation]) -> usize {
    let connected: HashSet<&str> = relations
        .iter()
        .flat_map(|r| [r.source.as_str(), r.target.as_str()])
        .collect();
    entities.iter().filter(|e| !connected.contains(e.entity_id.as_str())).count()
}

fn percent(part: usize, base: usize) -> f64 {
    if base == 0 {
        0.0
    } else {
        round_to(part as f64 / base as f64 * 100.0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn entity(id: &str, papers: usize) -> Entity {
        let mut e = Entity::new(id, id.to_lowercase(), EntityType::Gene);
        e.papers = (0..papers).map(|i| format!("P{}", i)).collect();
        e
    }

    fn relation(id: &str, source: &str, relation: RelationType, target: &str) -> Relation {
        Relation {
            relation_id: id.into(),
            source: source.into(),
            relation_type: relation,
            target: target.into(),
            papers: BTreeSet::from(["P0".to_string()]),
            evidence_count: 1,
            confidence: 0.7,
            sample_sentences: vec![],
        }
    }

    #[test]
    fn test_score_formula() {
        let entities = vec![entity("A", 2), entity("B", 0), entity("C", 0)];
        let relations = vec![
            relation("R1", "A", RelationType::Affects, "B"),
            relation("R2", "A", RelationType::Affects, "C"),
            relation("R3", "C", RelationType::Causes, "A"),
        ];
        let scores = score_entities(&entities, &relations);
        assert_eq!(scores[0].score, 11.0);
        assert_eq!(scores[0].relation_type_diversity, 2);
    }

    #[test]
    fn test_low_scoring_entity_and_its_relations_are_dropped() {
        let entities = vec![entity("A", 2), entity("B", 30), entity("C", 30)];
        let relations = vec![
            relation("R1", "A", RelationType::Affects, "B"),
            relation("R2", "A", RelationType::Affects, "C"),
            relation("R3", "C", RelationType::Causes, "A"),
            relation("R4", "B", RelationType::Induces, "C"),
        ];
        let (graph, report) = filter_graph(&entities, &relations, DEFAULT_IMPORTANCE_THRESHOLD);
        let ids: Vec<_> = graph.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);
        assert_eq!(graph.relations.len(), 1);
        assert_eq!(graph.relations[0].relation_id, "R4");
        assert!(graph.entities.iter().all(|e| e.importance_score.is_some()));

        assert_eq!(report.original.entities, 3);
        assert_eq!(report.reduction.entities_removed, 1);
        assert_eq!(report.reduction.entity_reduction_percent, 33.3);
        assert_eq!(report.reduction.relation_reduction_percent, 75.0);
        assert_eq!(report.filtered.avg_relations_per_entity, 1.0);
        assert_eq!(report.filtered.graph_density_percent, 50.0);
        assert_eq!(report.top_entities.len(), 2);
    }

    #[test]
    fn test_every_kept_relation_has_kept_endpoints() {
        let entities: Vec<_> = (0..6).map(|i| entity(&format!("E{}", i), i * 5)).collect();
        let relations: Vec<_> = (0..6)
            .flat_map(|i| (0..6).filter(move |j| *j != i).map(move |j| (i, j)))
            .enumerate()
            .map(|(n, (i, j))| relation(&format!("R{}", n), &format!("E{}", i), RelationType::Affects, &format!("E{}", j)))
            .collect();
        let (graph, _) = filter_graph(&entities, &relations, 40.0);
        let ids: HashSet<_> = graph.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert!(graph.relations.iter().all(|r| ids.contains(r.source.as_str()) && ids.contains(r.target.as_str())));
    }

    #[test]
    fn test_empty_graph_report_has_zero_ratios() {
        let (graph, report) = filter_graph(&[], &[], DEFAULT_IMPORTANCE_THRESHOLD);
        assert!(graph.entities.is_empty());
        assert_eq!(report.filtered.graph_density_percent, 0.0);
        assert_eq!(report.reduction.entity_reduction_percent, 0.0);
    }
}

//! Structural summary of the filtered graph.

use std::collections::{BTreeMap, HashMap};

use astrokg_common::{EntityType, FilteredGraph};
use serde::{Deserialize, Serialize};
use tracing::info;

const TOP_HUBS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEntity {
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysis {
    pub total_entities: usize,
    pub total_relations: usize,
    pub isolated_entities: usize,
    pub top_hubs: Vec<HubEntity>,
    pub relation_type_distribution: BTreeMap<String, usize>,
    pub entity_type_distribution: BTreeMap<String, usize>,
}

pub fn analyze_graph(graph: &FilteredGraph) -> GraphAnalysis {
    let mut degrees: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut relation_type_distribution = BTreeMap::new();
    for relation in &graph.relations {
        degrees.entry(relation.source.as_str()).or_default().1 += 1;
        degrees.entry(relation.target.as_str()).or_default().0 += 1;
        *relation_type_distribution.entry(relation.relation_type.as_str().to_string()).or_insert(0) += 1;
    }

    let mut entity_type_distribution = BTreeMap::new();
    let mut hubs: Vec<HubEntity> = Vec::with_capacity(graph.entities.len());
    for entity in &graph.entities {
        *entity_type_distribution.entry(entity.entity_type.as_str().to_string()).or_insert(0) += 1;
        let (in_degree, out_degree) = degrees.get(entity.entity_id.as_str()).copied().unwrap_or_default();
        hubs.push(HubEntity {
            entity_id: entity.entity_id.clone(),
            name: entity.name.clone(),
            entity_type: entity.entity_type,
            degree: in_degree + out_degree,
            in_degree,
            out_degree,
        });
    }

    let isolated_entities = hubs.iter().filter(|h| h.degree == 0).count();
    hubs.sort_by(|a, b| b.degree.cmp(&a.degree));
    hubs.truncate(TOP_HUBS);

    info!(
        "Graph analysis: {} entities, {} relations, {} isolated",
        graph.entities.len(),
        graph.relations.len(),
        isolated_entities
    );

    GraphAnalysis {
        total_entities: graph.entities.len(),
        total_relations: graph.relations.len(),
        isolated_entities,
        top_hubs: hubs,
        relation_type_distribution,
        entity_type_distribution,
    }
}

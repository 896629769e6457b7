//! In-memory graph store.
//!
//! Serves either the fixed demo graph ([`MemoryGraphStore::demo`]) or a graph
//! loaded from build artifacts. Translated queries are evaluated natively with
//! the same semantics as their Cypher rendering.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use astrokg_common::{Entity, EntityType, FilteredGraph, Relation, RelationType};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::artifacts::load_filtered_graph;
use crate::graph_query::{
    name_contains, GraphIntent, GraphQuery, GraphRow, ALL_EDGE_LIMIT, EDGE_LIMIT, PATH_LIMIT, PATH_MAX_HOPS,
    TYPE_LISTING_LIMIT,
};
use crate::repository::{EntitySummary, GraphStore, GraphStoreError, RelationView, StoreResult};

#[derive(Debug, Default)]
struct GraphState {
    entities: Vec<Entity>,
    by_id: HashMap<String, usize>,
    relations: Vec<Relation>,
}

impl GraphState {
    fn new(graph: FilteredGraph) -> Self {
        let by_id = graph
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.entity_id.clone(), i))
            .collect();
        Self { entities: graph.entities, by_id, relations: graph.relations }
    }

    fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.by_id.get(entity_id).map(|&i| &self.entities[i])
    }

    fn name_of(&self, entity_id: &str) -> String {
        self.entity(entity_id).map(|e| e.name.clone()).unwrap_or_else(|| entity_id.to_string())
    }

    fn by_importance(&self) -> Vec<&Entity> {
        let mut ranked: Vec<&Entity> = self.entities.iter().collect();
        ranked.sort_by(|a, b| {
            b.importance_score
                .unwrap_or(0.0)
                .total_cmp(&a.importance_score.unwrap_or(0.0))
        });
        ranked
    }

    /// Undirected edges of entities named like `needle`, oriented from the matched end.
    fn edges_from_match<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = (&'a Relation, &'a str, &'a str)> + 'a {
        self.relations.iter().flat_map(move |r| {
            let forward = self
                .entity(&r.source)
                .filter(|e| name_contains(&e.name, needle))
                .map(|_| (r, r.source.as_str(), r.target.as_str()));
            let backward = self
                .entity(&r.target)
                .filter(|e| name_contains(&e.name, needle))
                .map(|_| (r, r.target.as_str(), r.source.as_str()));
            forward.into_iter().chain(backward)
        })
    }

    fn triple(&self, relation: &Relation, from: &str, to: &str) -> GraphRow {
        GraphRow::Triple {
            source: self.name_of(from),
            relation: relation.relation_type.graph_label().to_string(),
            target: self.name_of(to),
            evidence: Some(relation.evidence_count as i64),
        }
    }

    fn entity_row(entity: &Entity) -> GraphRow {
        GraphRow::Entity {
            name: entity.name.clone(),
            entity_type: entity.entity_type.as_str().to_string(),
            score: entity.importance_score,
            papers: Some(entity.paper_count() as i64),
        }
    }

    fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for r in &self.relations {
            adjacency.entry(r.source.as_str()).or_default().push(r.target.as_str());
            adjacency.entry(r.target.as_str()).or_default().push(r.source.as_str());
        }

        let mut previous: HashMap<&str, &str> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(from, 0)]);

        while let Some((node, hops)) = queue.pop_front() {
            if node == to {
                let mut path = vec![self.name_of(node)];
                let mut cursor = node;
                while let Some(&prev) = previous.get(cursor) {
                    path.push(self.name_of(prev));
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            if hops == PATH_MAX_HOPS {
                continue;
            }
            for &next in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(next) {
                    previous.insert(next, node);
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }

    fn evaluate(&self, query: &GraphQuery) -> Vec<GraphRow> {
        match &query.intent {
            GraphIntent::IncomingEdges { entity, relations } => self
                .relations
                .iter()
                .filter(|r| relations.contains(&r.relation_type))
                .filter(|r| self.entity(&r.target).is_some_and(|e| name_contains(&e.name, entity)))
                .take(EDGE_LIMIT)
                .map(|r| self.triple(r, &r.source, &r.target))
                .collect(),
            GraphIntent::OutgoingEdges { entity, relations } => self
                .relations
                .iter()
                .filter(|r| relations.contains(&r.relation_type))
                .filter(|r| self.entity(&r.source).is_some_and(|e| name_contains(&e.name, entity)))
                .take(EDGE_LIMIT)
                .map(|r| self.triple(r, &r.source, &r.target))
                .collect(),
            GraphIntent::AllEdges { entity } => self
                .edges_from_match(entity)
                .take(ALL_EDGE_LIMIT)
                .map(|(r, from, to)| self.triple(r, from, to))
                .collect(),
            GraphIntent::TypedNeighbours { entity, entity_type } => self
                .edges_from_match(entity)
                .filter(|(_, _, to)| self.entity(to).is_some_and(|e| e.entity_type.as_str() == entity_type))
                .take(EDGE_LIMIT)
                .map(|(r, from, to)| self.triple(r, from, to))
                .collect(),
            GraphIntent::TopEntities { limit } => self
                .by_importance()
                .into_iter()
                .take(*limit)
                .map(Self::entity_row)
                .collect(),
            GraphIntent::EntitiesOfType { entity_type } => self
                .by_importance()
                .into_iter()
                .filter(|e| e.entity_type.as_str() == entity_type)
                .take(TYPE_LISTING_LIMIT)
                .map(Self::entity_row)
                .collect(),
            GraphIntent::ShortestPath { from, to } => {
                let starts: Vec<&Entity> = self.entities.iter().filter(|e| name_contains(&e.name, from)).collect();
                let ends: Vec<&Entity> = self.entities.iter().filter(|e| name_contains(&e.name, to)).collect();
                let mut rows = Vec::new();
                'outer: for a in &starts {
                    for b in &ends {
                        if a.entity_id == b.entity_id {
                            continue;
                        }
                        if let Some(nodes) = self.shortest_path(&a.entity_id, &b.entity_id) {
                            rows.push(GraphRow::Path { nodes });
                            if rows.len() == PATH_LIMIT {
                                break 'outer;
                            }
                        }
                    }
                }
                rows
            }
            GraphIntent::PapersAbout { entity } => self
                .entities
                .iter()
                .filter(|e| name_contains(&e.name, entity))
                .map(|e| GraphRow::Papers {
                    entity: e.name.clone(),
                    paper_ids: e.papers.iter().cloned().collect(),
                    count: e.paper_count() as i64,
                })
                .collect(),
        }
    }
}

pub struct MemoryGraphStore {
    name: &'static str,
    state: RwLock<GraphState>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::from_graph(FilteredGraph::default())
    }

    pub fn from_graph(graph: FilteredGraph) -> Self {
        info!(
            "Memory graph store loaded: {} entities, {} relations",
            graph.entities.len(),
            graph.relations.len()
        );
        Self { name: "memory", state: RwLock::new(GraphState::new(graph)) }
    }

    /// Load `filtered_entities.json` and `filtered_relations.json` from `dir`.
    pub fn from_dir(dir: &Path) -> StoreResult<Self> {
        Ok(Self::from_graph(load_filtered_graph(dir)?))
    }

    /// Fixed canned space-biology graph; needs no configuration.
    pub fn demo() -> Self {
        let mut store = Self::from_graph(demo_graph());
        store.name = "demo";
        store
    }

    /// Copy of the current entities and relations.
    pub fn snapshot(&self) -> FilteredGraph {
        let state = self.read();
        FilteredGraph { entities: state.entities.clone(), relations: state.relations.clone() }
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    fn backend_name(&self) -> &'static str {
        self.name
    }

    async fn get_entities(&self, entity_type: Option<EntityType>, limit: usize) -> StoreResult<Vec<EntitySummary>> {
        let state = self.read();
        Ok(state
            .by_importance()
            .into_iter()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .take(limit)
            .map(EntitySummary::from)
            .collect())
    }

    async fn get_entity_by_name(&self, name: &str) -> StoreResult<Option<EntitySummary>> {
        let needle = name.trim().to_lowercase();
        let state = self.read();
        Ok(state
            .entities
            .iter()
            .find(|e| e.name.to_lowercase() == needle)
            .map(EntitySummary::from))
    }

    async fn get_related_papers(&self, entity_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        let state = self.read();
        Ok(state
            .entity(entity_id)
            .map(|e| e.papers.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_entity_relations(
        &self,
        entity_id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<RelationView>> {
        let state = self.read();
        Ok(state
            .relations
            .iter()
            .filter(|r| r.source == entity_id || r.target == entity_id)
            .filter(|r| relation_type.map_or(true, |t| r.relation_type == t))
            .map(|r| RelationView {
                source: state.name_of(&r.source),
                source_id: r.source.clone(),
                relation: r.relation_type.as_str().to_string(),
                target: state.name_of(&r.target),
                target_id: r.target.clone(),
                evidence_count: r.evidence_count,
                confidence: r.confidence,
                papers: r.papers.iter().cloned().collect(),
            })
            .collect())
    }

    async fn upsert_entity(&self, entity: &Entity) -> StoreResult<()> {
        let mut state = self.write();
        match state.by_id.get(&entity.entity_id).copied() {
            Some(i) => state.entities[i] = entity.clone(),
            None => {
                let i = state.entities.len();
                state.entities.push(entity.clone());
                state.by_id.insert(entity.entity_id.clone(), i);
            }
        }
        debug!("Upserted entity {}", entity.entity_id);
        Ok(())
    }

    async fn upsert_paper(&self, entity_id: &str, paper_id: &str) -> StoreResult<()> {
        let mut state = self.write();
        let i = state
            .by_id
            .get(entity_id)
            .copied()
            .ok_or_else(|| GraphStoreError::EntityNotFound(entity_id.to_string()))?;
        state.entities[i].papers.insert(paper_id.to_string());
        Ok(())
    }

    async fn create_relation(&self, relation: &Relation) -> StoreResult<()> {
        let mut state = self.write();
        for endpoint in [&relation.source, &relation.target] {
            if !state.by_id.contains_key(endpoint) {
                return Err(GraphStoreError::EntityNotFound(endpoint.clone()));
            }
        }
        match state.relations.iter_mut().find(|r| r.relation_id == relation.relation_id) {
            Some(existing) => *existing = relation.clone(),
            None => state.relations.push(relation.clone()),
        }
        Ok(())
    }

    async fn run_translated(&self, query: &GraphQuery) -> StoreResult<Vec<GraphRow>> {
        Ok(self.read().evaluate(query))
    }

    async fn close(&self) -> StoreResult<()> {
        debug!("{} graph store closed", self.name);
        Ok(())
    }
}

fn demo_graph() -> FilteredGraph {
    let entity = |id: &str, name: &str, entity_type: EntityType, papers: &[&str], score: f64, relations: usize| {
        let mut e = Entity::new(id, name, entity_type);
        e.synonyms.insert(name.to_string());
        e.papers = papers.iter().map(|p| p.to_string()).collect();
        e.importance_score = Some(score);
        e.relation_count = Some(relations);
        e
    };
    let relation = |id: &str, source: &str, relation_type: RelationType, target: &str, papers: &[&str], confidence: f64| {
        Relation {
            relation_id: id.to_string(),
            source: source.to_string(),
            relation_type,
            target: target.to_string(),
            papers: papers.iter().map(|p| p.to_string()).collect(),
            evidence_count: papers.len(),
            confidence,
            sample_sentences: Vec::new(),
        }
    };

    let entities = vec![
        entity("E00001", "microgravity", EntityType::Condition, &["P1", "P3", "P4"], 37.5, 5),
        entity("E00002", "radiation", EntityType::Condition, &["P1", "P2"], 29.5, 3),
        entity("E00003", "bone", EntityType::Tissue, &["P1", "P3"], 28.0, 3),
        entity("E00004", "spaceflight", EntityType::Condition, &["P2", "P4", "P5"], 27.5, 3),
        entity("E00005", "osteoclast", EntityType::CellType, &["P3"], 24.0, 2),
        entity("E00006", "muscle atrophy", EntityType::Disease, &["P4", "P5"], 23.5, 2),
        entity("E00007", "sost", EntityType::Gene, &["P3"], 22.5, 2),
        entity("E00008", "ros", EntityType::Chemical, &["P2"], 21.5, 2),
        entity("E00009", "mouse", EntityType::Organism, &["P1", "P2", "P3", "P4", "P5"], 21.0, 1),
        entity("E00010", "rna-seq", EntityType::Assay, &["P5"], 20.5, 1),
    ];
    let relations = vec![
        relation("R00001", "E00001", RelationType::Decreases, "E00003", &["P1", "P3"], 0.7),
        relation("R00002", "E00001", RelationType::Increases, "E00005", &["P3"], 0.7),
        relation("R00003", "E00002", RelationType::Induces, "E00008", &["P1", "P2"], 0.65),
        relation("R00004", "E00004", RelationType::Causes, "E00006", &["P4", "P5"], 0.7),
        relation("R00005", "E00001", RelationType::Affects, "E00006", &["P4"], 0.6),
        relation("R00006", "E00007", RelationType::Regulates, "E00003", &["P3"], 0.7),
        relation("R00007", "E00001", RelationType::Increases, "E00007", &["P3"], 0.7),
        relation("R00008", "E00008", RelationType::AssociatedWith, "E00005", &["P2"], 0.6),
        relation("R00009", "E00002", RelationType::Affects, "E00003", &["P1"], 0.7),
        relation("R00010", "E00004", RelationType::Affects, "E00009", &["P2", "P5"], 0.7),
        relation("R00011", "E00010", RelationType::MeasuredIn, "E00004", &["P5"], 0.6),
        relation("R00012", "E00001", RelationType::Affects, "E00004", &["P4"], 0.6),
    ];
    FilteredGraph { entities, relations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_lookup_is_case_insensitive() {
        let store = MemoryGraphStore::demo();
        let radiation = store.get_entity_by_name("Radiation").await.unwrap().unwrap();
        assert_eq!(radiation.entity_id, "E00002");
        assert_eq!(store.get_related_papers(&radiation.entity_id, 20).await.unwrap(), vec!["P1", "P2"]);
        assert!(store.get_entity_by_name("unknownentity123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entities_are_ranked_and_typed() {
        let store = MemoryGraphStore::demo();
        let top = store.get_entities(None, 3).await.unwrap();
        assert_eq!(top[0].name, "microgravity");
        let conditions = store.get_entities(Some(EntityType::Condition), 50).await.unwrap();
        assert_eq!(conditions.len(), 3);
        assert!(conditions.iter().all(|e| e.entity_type == "condition"));
    }

    #[tokio::test]
    async fn test_relations_touch_entity_either_end() {
        let store = MemoryGraphStore::demo();
        let all = store.get_entity_relations("E00003", None).await.unwrap();
        assert_eq!(all.len(), 3);
        let regulates = store.get_entity_relations("E00003", Some(RelationType::Regulates)).await.unwrap();
        assert_eq!(regulates.len(), 1);
        assert_eq!(regulates[0].source, "sost");
    }

    #[tokio::test]
    async fn test_writes_are_visible_to_reads() {
        let store = MemoryGraphStore::new();
        store.upsert_entity(&Entity::new("E1", "hypoxia", EntityType::Condition)).await.unwrap();
        store.upsert_entity(&Entity::new("E2", "hif1a", EntityType::Gene)).await.unwrap();
        store.upsert_paper("E1", "P9").await.unwrap();
        assert!(matches!(store.upsert_paper("E404", "P9").await, Err(GraphStoreError::EntityNotFound(_))));

        let relation = Relation {
            relation_id: "R1".into(),
            source: "E1".into(),
            relation_type: RelationType::Induces,
            target: "E2".into(),
            papers: ["P9".to_string()].into(),
            evidence_count: 1,
            confidence: 0.7,
            sample_sentences: vec![],
        };
        store.create_relation(&relation).await.unwrap();
        assert_eq!(store.get_related_papers("E1", 20).await.unwrap(), vec!["P9"]);
        assert_eq!(store.get_entity_relations("E2", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_translated_queries_evaluate_natively() {
        let store = MemoryGraphStore::demo();

        let incoming = GraphQuery::new(
            GraphIntent::IncomingEdges {
                entity: "bone".into(),
                relations: vec![RelationType::Affects, RelationType::Decreases],
            },
            "Finding what affects bone",
        );
        let rows = store.run_translated(&incoming).await.unwrap();
        assert_eq!(rows.len(), 2);

        let path = GraphQuery::new(
            GraphIntent::ShortestPath { from: "spaceflight".into(), to: "bone".into() },
            "Finding path between spaceflight and bone",
        );
        let rows = store.run_translated(&path).await.unwrap();
        assert_eq!(
            rows,
            vec![GraphRow::Path { nodes: vec!["spaceflight".into(), "microgravity".into(), "bone".into()] }]
        );

        let typed = GraphQuery::new(
            GraphIntent::TypedNeighbours { entity: "microgravity".into(), entity_type: "gene".into() },
            "Finding gene related to microgravity",
        );
        let rows = store.run_translated(&typed).await.unwrap();
        assert_eq!(
            rows,
            vec![GraphRow::Triple {
                source: "microgravity".into(),
                relation: "INCREASES".into(),
                target: "sost".into(),
                evidence: Some(1),
            }]
        );
    }
}

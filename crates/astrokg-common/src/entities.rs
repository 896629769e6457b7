//! Core types of the knowledge graph: entities, relations and the transient
//! mentions and candidates they are built from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AstroError;

// ---------------------------------------------------------------------------
// Entity type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Gene,
    Protein,
    Chemical,
    Disease,
    Condition,
    Tissue,
    Organism,
    CellType,
    Process,
    Assay,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Gene,
        EntityType::Protein,
        EntityType::Chemical,
        EntityType::Disease,
        EntityType::Condition,
        EntityType::Tissue,
        EntityType::Organism,
        EntityType::CellType,
        EntityType::Process,
        EntityType::Assay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene => "gene",
            EntityType::Protein => "protein",
            EntityType::Chemical => "chemical",
            EntityType::Disease => "disease",
            EntityType::Condition => "condition",
            EntityType::Tissue => "tissue",
            EntityType::Organism => "organism",
            EntityType::CellType => "cell_type",
            EntityType::Process => "process",
            EntityType::Assay => "assay",
        }
    }

    /// Parse a singular or plural type word ("gene", "genes", "cell types").
    pub fn from_word(word: &str) -> Option<Self> {
        let w = word.trim().to_lowercase().replace(' ', "_");
        if let Ok(t) = w.parse() {
            return Some(t);
        }
        let singular = w
            .strip_suffix("es")
            .filter(|s| s.parse::<EntityType>().is_ok())
            .or_else(|| w.strip_suffix('s'))?;
        singular.parse().ok()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AstroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| AstroError::InvalidInput(format!("unknown entity type '{}'", s)))
    }
}

// ---------------------------------------------------------------------------
// Relation type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Affects,
    Increases,
    Decreases,
    Induces,
    Inhibits,
    Causes,
    AssociatedWith,
    Regulates,
    ExpressedIn,
    MeasuredIn,
    UsedIn,
    PartOf,
}

impl RelationType {
    pub const ALL: [RelationType; 12] = [
        RelationType::Affects,
        RelationType::Increases,
        RelationType::Decreases,
        RelationType::Induces,
        RelationType::Inhibits,
        RelationType::Causes,
        RelationType::AssociatedWith,
        RelationType::Regulates,
        RelationType::ExpressedIn,
        RelationType::MeasuredIn,
        RelationType::UsedIn,
        RelationType::PartOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Affects => "affects",
            RelationType::Increases => "increases",
            RelationType::Decreases => "decreases",
            RelationType::Induces => "induces",
            RelationType::Inhibits => "inhibits",
            RelationType::Causes => "causes",
            RelationType::AssociatedWith => "associated_with",
            RelationType::Regulates => "regulates",
            RelationType::ExpressedIn => "expressed_in",
            RelationType::MeasuredIn => "measured_in",
            RelationType::UsedIn => "used_in",
            RelationType::PartOf => "part_of",
        }
    }

    /// Relationship type used in the graph database (upper snake case).
    pub fn graph_label(&self) -> &'static str {
        match self {
            RelationType::Affects => "AFFECTS",
            RelationType::Increases => "INCREASES",
            RelationType::Decreases => "DECREASES",
            RelationType::Induces => "INDUCES",
            RelationType::Inhibits => "INHIBITS",
            RelationType::Causes => "CAUSES",
            RelationType::AssociatedWith => "ASSOCIATED_WITH",
            RelationType::Regulates => "REGULATES",
            RelationType::ExpressedIn => "EXPRESSED_IN",
            RelationType::MeasuredIn => "MEASURED_IN",
            RelationType::UsedIn => "USED_IN",
            RelationType::PartOf => "PART_OF",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = AstroError;

    /// Accepts both the snake case name and the graph label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        RelationType::ALL
            .iter()
            .find(|r| r.as_str() == lower)
            .copied()
            .ok_or_else(|| AstroError::InvalidInput(format!("unknown relation type '{}'", s)))
    }
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// One located entity mention produced by an annotator or a rule, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMention {
    pub paper_id: String,
    pub surface_form: String,
    pub normalized_name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub source: String,
}

/// A catalog entity found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub entity_id: String,
    pub surface_form: String,
    pub start: usize,
    pub end: usize,
}

// ---------------------------------------------------------------------------
// Entity / Relation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
    #[serde(default)]
    pub papers: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_count: Option<usize>,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            entity_type,
            synonyms: BTreeSet::new(),
            papers: BTreeSet::new(),
            importance_score: None,
            relation_count: None,
        }
    }

    pub fn paper_count(&self) -> usize {
        self.papers.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Pattern,
    Dependency,
}

/// An unverified per-sentence hypothesis that two entities are related.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub paper_id: String,
    pub source: String,
    #[serde(rename = "relation")]
    pub relation_type: RelationType,
    pub target: String,
    pub sentence: String,
    pub confidence: f64,
    pub method: ExtractionMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relation_id: String,
    pub source: String,
    #[serde(rename = "relation")]
    pub relation_type: RelationType,
    pub target: String,
    pub papers: BTreeSet<String>,
    pub evidence_count: usize,
    pub confidence: f64,
    #[serde(default)]
    pub sample_sentences: Vec<String>,
}

/// Entities above the importance threshold and the relations between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredGraph {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trips_through_str() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
    }

    #[test]
    fn test_entity_type_from_plural_words() {
        assert_eq!(EntityType::from_word("genes"), Some(EntityType::Gene));
        assert_eq!(EntityType::from_word("Conditions"), Some(EntityType::Condition));
        assert_eq!(EntityType::from_word("processes"), Some(EntityType::Process));
        assert_eq!(EntityType::from_word("cell types"), Some(EntityType::CellType));
        assert_eq!(EntityType::from_word("papers"), None);
    }

    #[test]
    fn test_relation_type_accepts_graph_label() {
        assert_eq!("ASSOCIATED_WITH".parse::<RelationType>().unwrap(), RelationType::AssociatedWith);
        assert_eq!(RelationType::ExpressedIn.graph_label(), "EXPRESSED_IN");
        assert!("binds".parse::<RelationType>().is_err());
    }

    #[test]
    fn test_entity_serializes_type_field() {
        let mut e = Entity::new("E00001", "microgravity", EntityType::Condition);
        e.papers.insert("PMC2".into());
        e.papers.insert("PMC1".into());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "condition");
        assert_eq!(json["papers"], serde_json::json!(["PMC1", "PMC2"]));
        assert!(json.get("importance_score").is_none());
    }
}

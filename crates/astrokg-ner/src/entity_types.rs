//! Annotator label mapping and the external mention record.

use std::collections::HashMap;

use astrokg_common::{EntityType, RawMention};
use serde::{Deserialize, Serialize};

// Map annotator labels (BC5CDR, BioNLP13CG) to our schema
fn get_label_map() -> &'static HashMap<&'static str, EntityType> {
    use std::sync::OnceLock;
    static LABEL_MAP: OnceLock<HashMap<&'static str, EntityType>> = OnceLock::new();
    LABEL_MAP.get_or_init(|| {
        let mut m = HashMap::new();

        // BC5CDR labels
        m.insert("DISEASE", EntityType::Disease);
        m.insert("CHEMICAL", EntityType::Chemical);

        // BioNLP13CG labels
        m.insert("GENE_OR_GENE_PRODUCT", EntityType::Gene);
        m.insert("SIMPLE_CHEMICAL", EntityType::Chemical);
        m.insert("CANCER", EntityType::Disease);
        m.insert("CELL", EntityType::CellType);
        m.insert("TISSUE", EntityType::Tissue);
        m.insert("ORGAN", EntityType::Tissue);
        m.insert("ORGANISM", EntityType::Organism);
        m.insert("ANATOMICAL_SYSTEM", EntityType::Tissue);
        m.insert("MULTI-TISSUE_STRUCTURE", EntityType::Tissue);
        m.insert("ORGANISM_SUBDIVISION", EntityType::Tissue);
        m.insert("CELLULAR_COMPONENT", EntityType::CellType);
        m.insert("AMINO_ACID", EntityType::Chemical);
        m.insert("ORGANISM_SUBSTANCE", EntityType::Chemical);
        m.insert("PATHOLOGICAL_FORMATION", EntityType::Disease);
        m.insert("DEVELOPING_ANATOMICAL_STRUCTURE", EntityType::Tissue);
        m.insert("IMMATERIAL_ANATOMICAL_ENTITY", EntityType::Tissue);

        m
    })
}

/// Normalize an annotator label (or one of our own type names) to an EntityType.
/// Unknown labels fall back to `Process`.
pub fn normalize_entity_label(label: &str) -> EntityType {
    let clean = label.trim();
    get_label_map()
        .get(clean.to_uppercase().as_str())
        .copied()
        .or_else(|| clean.parse().ok())
        .unwrap_or(EntityType::Process)
}

/// One line of the external annotator's JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatorMention {
    pub paper_id: String,
    pub surface_form: String,
    #[serde(default)]
    pub normalized_name: Option<String>,
    #[serde(rename = "type")]
    pub label: String,
    pub start: usize,
    pub end: usize,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String { "annotator".to_string() }

impl AnnotatorMention {
    pub fn into_raw(self) -> RawMention {
        let normalized_name = self
            .normalized_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.surface_form.trim().to_lowercase());
        RawMention {
            entity_type: normalize_entity_label(&self.label),
            paper_id: self.paper_id,
            surface_form: self.surface_form,
            normalized_name,
            start: self.start,
            end: self.end,
            source: self.source,
        }
    }
}

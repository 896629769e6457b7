//! Relation aggregation.
//! Collapses per-sentence candidates into one relation per ordered
//! (source, relation, target) triple.

use std::collections::{BTreeSet, HashMap};

use astrokg_common::{Relation, RelationCandidate, RelationType};
use tracing::info;

pub const MAX_SAMPLE_SENTENCES: usize = 3;

struct Group {
    source: String,
    relation_type: RelationType,
    target: String,
    papers: BTreeSet<String>,
    confidence_sum: f64,
    candidates: usize,
    sample_sentences: Vec<String>,
}

/// Aggregate candidates into relations, sorted by evidence count descending.
///
/// Ids are assigned in discovery order before sorting; the sort is stable,
/// so ties keep discovery order.
pub fn aggregate_relations(candidates: &[RelationCandidate]) -> Vec<Relation> {
    let mut index: HashMap<(&str, RelationType, &str), usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for candidate in candidates {
        let key = (candidate.source.as_str(), candidate.relation_type, candidate.target.as_str());
        let idx = *index.entry(key).or_insert_with(|| {
            groups.push(Group {
                source: candidate.source.clone(),
                relation_type: candidate.relation_type,
                target: candidate.target.clone(),
                papers: BTreeSet::new(),
                confidence_sum: 0.0,
                candidates: 0,
                sample_sentences: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[idx];
        group.papers.insert(candidate.paper_id.clone());
        group.confidence_sum += candidate.confidence;
        group.candidates += 1;
        if group.sample_sentences.len() < MAX_SAMPLE_SENTENCES
            && !group.sample_sentences.contains(&candidate.sentence)
        {
            group.sample_sentences.push(candidate.sentence.clone());
        }
    }

    let mut relations: Vec<Relation> = groups
        .into_iter()
        .enumerate()
        .map(|(i, g)| Relation {
            relation_id: format!("R{:05}", i + 1),
            source: g.source,
            relation_type: g.relation_type,
            target: g.target,
            evidence_count: g.papers.len(),
            papers: g.papers,
            confidence: round_to(g.confidence_sum / g.candidates as f64, 3),
            sample_sentences: g.sample_sentences,
        })
        .collect();

    relations.sort_by(|a, b| b.evidence_count.cmp(&a.evidence_count));

    info!(
        "Relation aggregation: {} candidates -> {} unique relations",
        candidates.len(),
        relations.len()
    );
    relations
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrokg_common::ExtractionMethod;

    fn candidate(paper: &str, source: &str, relation: RelationType, target: &str, sentence: &str, confidence: f64) -> RelationCandidate {
        RelationCandidate {
            paper_id: paper.into(),
            source: source.into(),
            relation_type: relation,
            target: target.into(),
            sentence: sentence.into(),
            confidence,
            method: ExtractionMethod::Pattern,
        }
    }

    #[test]
    fn test_evidence_counts_distinct_papers() {
        let candidates = vec![
            candidate("P1", "E1", RelationType::Affects, "E2", "s1", 0.7),
            candidate("P1", "E1", RelationType::Affects, "E2", "s2", 0.6),
            candidate("P2", "E1", RelationType::Affects, "E2", "s3", 0.7),
        ];
        let relations = aggregate_relations(&candidates);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].evidence_count, 2);
        assert_eq!(relations[0].evidence_count, relations[0].papers.len());
        assert_eq!(relations[0].confidence, 0.667);
    }

    #[test]
    fn test_direction_and_type_split_groups() {
        let candidates = vec![
            candidate("P1", "E1", RelationType::Affects, "E2", "s", 0.7),
            candidate("P1", "E2", RelationType::Affects, "E1", "s", 0.7),
            candidate("P1", "E1", RelationType::Causes, "E2", "s", 0.7),
        ];
        assert_eq!(aggregate_relations(&candidates).len(), 3);
    }

    #[test]
    fn test_sample_sentences_are_distinct_and_capped() {
        let candidates: Vec<_> = ["a", "a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, s)| candidate(&format!("P{}", i), "E1", RelationType::Induces, "E2", s, 0.6))
            .collect();
        let relations = aggregate_relations(&candidates);
        assert_eq!(relations[0].sample_sentences, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ids_follow_discovery_and_sort_is_stable() {
        let candidates = vec![
            candidate("P1", "E1", RelationType::Affects, "E2", "s", 0.7),
            candidate("P1", "E3", RelationType::Affects, "E4", "s", 0.7),
            candidate("P2", "E3", RelationType::Affects, "E4", "s", 0.7),
            candidate("P1", "E5", RelationType::Affects, "E6", "s", 0.7),
        ];
        let relations = aggregate_relations(&candidates);
        let ids: Vec<_> = relations.iter().map(|r| r.relation_id.as_str()).collect();
        assert_eq!(ids, vec!["R00002", "R00001", "R00003"]);
    }
}

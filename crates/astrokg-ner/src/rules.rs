//! Rule-based extraction of space conditions and laboratory assays.
//!
//! These complement the external annotator, which has no notion of
//! spaceflight conditions or experimental techniques.

use std::sync::OnceLock;

use astrokg_common::{EntityType, RawMention};
use regex::Regex;
use tracing::warn;

use crate::matcher::{Lexicon, LexiconMatch, MentionMatcher};
use crate::Result;

pub const RULE_SOURCE: &str = "rule_based";

/// Compile a built-in pattern. A pattern that does not compile is logged and
/// yields `None`, so the table it belongs to shrinks by one entry.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Built-in pattern {:?} does not compile and is skipped: {}", pattern, e);
            None
        }
    }
}

fn assay_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(?i)\bRNA-seq\b", "RNA-seq"),
            (r"(?i)\bRNA sequencing\b", "RNA sequencing"),
            (r"(?i)\bq?RT-?PCR\b", "qPCR"),
            (r"(?i)\bWestern blot(?:ting)?\b", "Western blot"),
            (r"(?i)\bflow cytometry\b", "flow cytometry"),
            (r"(?i)\bimmunohistochemistry\b", "immunohistochemistry"),
            (r"(?i)\bIHC\b", "immunohistochemistry"),
            (r"(?i)\bELISA\b", "ELISA"),
            (r"(?i)\bmicroarray\b", "microarray"),
            (r"(?i)\bconfocal microscopy\b", "confocal microscopy"),
            (r"(?i)\bMRI\b", "MRI"),
            (r"(?i)\bCT scan\b", "CT scan"),
            (r"(?i)\bmass spectrometry\b", "mass spectrometry"),
            (r"(?i)\bChIP-seq\b", "ChIP-seq"),
            (r"(?i)\bATAC-seq\b", "ATAC-seq"),
        ]
        .into_iter()
        .filter_map(|(pattern, name)| compile_pattern(pattern).map(|re| (re, name)))
        .collect()
    })
}

pub struct RuleExtractor {
    conditions: MentionMatcher,
}

impl RuleExtractor {
    pub fn new(space_conditions: &[String]) -> Result<Self> {
        let mut lexicon = Lexicon::new();
        for condition in space_conditions {
            lexicon.insert(condition, condition.to_lowercase());
        }
        Ok(Self { conditions: MentionMatcher::new(lexicon)? })
    }

    /// Condition and assay mentions in one paper's text.
    pub fn extract(&self, paper_id: &str, text: &str) -> Vec<RawMention> {
        self.mentions(paper_id, text, self.conditions.find(text))
    }

    /// [`extract`](Self::extract) over `(paper_id, text)` pairs, in input order.
    /// Condition matching runs in parallel above `parallel_threshold` papers.
    pub fn extract_batch(&self, papers: &[(&str, &str)], parallel_threshold: usize) -> Vec<Vec<RawMention>> {
        let texts: Vec<&str> = papers.iter().map(|(_, text)| *text).collect();
        let conditions = self.conditions.find_batch(&texts, parallel_threshold);
        papers
            .iter()
            .zip(conditions)
            .map(|((paper_id, text), found)| self.mentions(paper_id, text, found))
            .collect()
    }

    fn mentions(&self, paper_id: &str, text: &str, conditions: Vec<LexiconMatch>) -> Vec<RawMention> {
        let mut mentions: Vec<RawMention> = conditions
            .into_iter()
            .map(|m| RawMention {
                paper_id: paper_id.to_string(),
                surface_form: m.surface_form,
                normalized_name: m.value,
                entity_type: EntityType::Condition,
                start: m.start,
                end: m.end,
                source: RULE_SOURCE.to_string(),
            })
            .collect();

        for (re, name) in assay_patterns() {
            for mat in re.find_iter(text) {
                mentions.push(RawMention {
                    paper_id: paper_id.to_string(),
                    surface_form: mat.as_str().to_string(),
                    normalized_name: name.to_string(),
                    entity_type: EntityType::Assay,
                    start: mat.start(),
                    end: mat.end(),
                    source: RULE_SOURCE.to_string(),
                });
            }
        }
        mentions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> RuleExtractor {
        let conditions: Vec<String> = ["microgravity", "simulated microgravity", "spaceflight"]
            .into_iter()
            .map(String::from)
            .collect();
        RuleExtractor::new(&conditions).unwrap()
    }

    #[test]
    fn test_all_assay_patterns_compile() {
        assert_eq!(assay_patterns().len(), 15);
    }

    #[test]
    fn test_broken_pattern_is_skipped() {
        assert!(compile_pattern(r"(?i)\bunclosed (group\b").is_none());
        assert!(compile_pattern(r"(?i)\bELISA\b").is_some());
    }

    #[test]
    fn test_conditions_prefer_longest_phrase() {
        let mentions = extractor().extract("PMC1", "Cells under Simulated Microgravity");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].normalized_name, "simulated microgravity");
        assert_eq!(mentions[0].surface_form, "Simulated Microgravity");
        assert_eq!(mentions[0].entity_type, EntityType::Condition);
    }

    #[test]
    fn test_batch_extraction_matches_per_paper() {
        let extractor = extractor();
        let texts: Vec<String> = (0..20).map(|i| format!("Mice {} flown in spaceflight; RNA-seq of liver.", i)).collect();
        let ids: Vec<String> = (0..20).map(|i| format!("PMC{}", i)).collect();
        let papers: Vec<(&str, &str)> = ids.iter().map(String::as_str).zip(texts.iter().map(String::as_str)).collect();

        let batch = extractor.extract_batch(&papers, 4);
        assert_eq!(batch.len(), 20);
        for ((paper_id, text), found) in papers.iter().zip(&batch) {
            assert_eq!(found, &extractor.extract(paper_id, text));
            assert_eq!(found.len(), 2);
        }
    }

    #[test]
    fn test_assays_are_normalized() {
        let text = "Expression was confirmed by qRT-PCR and western blotting after spaceflight.";
        let mentions = extractor().extract("PMC2", text);
        let assays: Vec<_> = mentions
            .iter()
            .filter(|m| m.entity_type == EntityType::Assay)
            .map(|m| m.normalized_name.as_str())
            .collect();
        assert_eq!(assays, vec!["qPCR", "Western blot"]);
        assert!(mentions.iter().all(|m| m.source == RULE_SOURCE && m.paper_id == "PMC2"));
    }
}

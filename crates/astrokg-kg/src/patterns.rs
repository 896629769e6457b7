//! Relation cue phrases and the verb → relation table.

use std::sync::OnceLock;

use astrokg_common::RelationType;
use astrokg_ner::rules::compile_pattern;
use regex::Regex;

/// Cue phrase regexes per relation type, case-insensitive.
pub fn relation_patterns() -> &'static [(RelationType, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(RelationType, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: [(RelationType, &[&str]); 12] = [
            (RelationType::Affects, &[
                r"\baffect(?:s|ed|ing)?\b",
                r"\bimpact(?:s|ed|ing)?\b",
                r"\binfluenc(?:e|es|ed|ing)\b",
            ]),
            (RelationType::Increases, &[
                r"\bincreas(?:e|es|ed|ing)\b",
                r"\belevat(?:e|es|ed|ing)\b",
                r"\bup-?regulat(?:e|es|ed|ing)\b",
                r"\benhanc(?:e|es|ed|ing)\b",
            ]),
            (RelationType::Decreases, &[
                r"\bdecreas(?:e|es|ed|ing)\b",
                r"\breduc(?:e|es|ed|ing)\b",
                r"\bdown-?regulat(?:e|es|ed|ing)\b",
                r"\bsuppress(?:es|ed|ing)?\b",
            ]),
            (RelationType::Induces, &[
                r"\binduc(?:e|es|ed|ing)\b",
                r"\btrigger(?:s|ed|ing)?\b",
                r"\bpromot(?:e|es|ed|ing)\b",
            ]),
            (RelationType::Inhibits, &[
                r"\binhibit(?:s|ed|ing)?\b",
                r"\bblock(?:s|ed|ing)?\b",
            ]),
            (RelationType::Causes, &[
                r"\bcaus(?:e|es|ed|ing)\b",
                r"\blead(?:s|ing)? to\b",
                r"\bled to\b",
                r"\bresult(?:s|ed|ing)? in\b",
            ]),
            (RelationType::AssociatedWith, &[
                r"\bassociated with\b",
                r"\bcorrelat(?:e|es|ed|ing) with\b",
                r"\blinked to\b",
                r"\brelated to\b",
            ]),
            (RelationType::Regulates, &[
                r"\bregulat(?:e|es|ed|ing)\b",
                r"\bmodulat(?:e|es|ed|ing)\b",
            ]),
            (RelationType::ExpressedIn, &[r"\bexpressed in\b"]),
            (RelationType::MeasuredIn, &[r"\bmeasured in\b", r"\bdetected in\b"]),
            (RelationType::UsedIn, &[r"\bused (?:in|for|to)\b"]),
            (RelationType::PartOf, &[r"\bpart of\b", r"\bcomponent of\b"]),
        ];

        table
            .into_iter()
            .map(|(relation, patterns)| {
                let compiled = patterns
                    .iter()
                    .filter_map(|p| compile_pattern(&format!("(?i){}", p)))
                    .collect();
                (relation, compiled)
            })
            .collect()
    })
}

/// Map a verb lemma to a relation type; unmapped verbs yield `None`.
pub fn verb_relation(lemma: &str) -> Option<RelationType> {
    let relation = match lemma {
        "affect" | "impact" | "influence" => RelationType::Affects,
        "increase" | "elevate" | "upregulate" | "enhance" => RelationType::Increases,
        "decrease" | "reduce" | "downregulate" | "suppress" => RelationType::Decreases,
        "inhibit" => RelationType::Inhibits,
        "induce" | "trigger" | "promote" => RelationType::Induces,
        "cause" | "lead" | "result" => RelationType::Causes,
        "associate" | "correlate" | "link" | "relate" => RelationType::AssociatedWith,
        "regulate" | "control" => RelationType::Regulates,
        "express" => RelationType::ExpressedIn,
        "measure" => RelationType::MeasuredIn,
        "use" => RelationType::UsedIn,
        _ => return None,
    };
    Some(relation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cue_pattern_compiles() {
        let total: usize = relation_patterns().iter().map(|(_, p)| p.len()).sum();
        assert_eq!(total, 32);
    }

    #[test]
    fn test_regulates_does_not_fire_inside_upregulates() {
        let (_, regulates) = relation_patterns()
            .iter()
            .find(|(r, _)| *r == RelationType::Regulates)
            .unwrap();
        assert!(!regulates.iter().any(|re| re.is_match("spaceflight upregulates sost")));
        assert!(regulates.iter().any(|re| re.is_match("Gravity Regulates osteoblasts")));
    }

    #[test]
    fn test_verb_table() {
        assert_eq!(verb_relation("suppress"), Some(RelationType::Decreases));
        assert_eq!(verb_relation("link"), Some(RelationType::AssociatedWith));
        assert_eq!(verb_relation("observe"), None);
    }
}

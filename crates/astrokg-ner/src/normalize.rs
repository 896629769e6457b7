//! Entity name normalization.

use std::collections::BTreeMap;

/// Lowercase, trim, strip trailing punctuation, then apply the synonym table.
///
/// An exact synonym hit replaces the whole name. Otherwise every synonym key
/// contained in the name is substituted in place, in key order.
pub fn normalize_entity_name(surface_form: &str, synonyms: &BTreeMap<String, String>) -> String {
    let lowered = surface_form.trim().to_lowercase();
    let mut normalized = lowered
        .trim_end_matches(['.', ',', ';', ':', '!', '?'])
        .to_string();

    if let Some(canonical) = synonyms.get(&normalized) {
        return canonical.clone();
    }

    for (key, value) in synonyms {
        if !key.is_empty() && normalized.contains(key.as_str()) {
            normalized = normalized.replace(key.as_str(), value);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BTreeMap<String, String> {
        [("space flight", "spaceflight"), ("rnaseq", "rna-seq")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_lowercase_and_trailing_punctuation() {
        assert_eq!(normalize_entity_name("  Osteoclasts.;", &table()), "osteoclasts");
        assert_eq!(normalize_entity_name("TNF-α", &table()), "tnf-α");
    }

    #[test]
    fn test_exact_synonym_replaces_name() {
        assert_eq!(normalize_entity_name("Space Flight", &table()), "spaceflight");
    }

    #[test]
    fn test_substring_synonym_substitution() {
        assert_eq!(normalize_entity_name("long-duration space flight!", &table()), "long-duration spaceflight");
        assert_eq!(normalize_entity_name("RNAseq profiling", &table()), "rna-seq profiling");
    }
}

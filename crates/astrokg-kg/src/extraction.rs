//! Relation candidate extraction.
//!
//! Two generators run over each paper, both scoped to one sentence and to the
//! entities registered for that paper:
//! - cue phrases: a mention ending shortly before a cue is a source, a mention
//!   starting shortly after it is a target (confidence 0.7);
//! - dependency parse: two entity tokens whose head is a mapped verb
//!   (confidence 0.6).

use std::collections::{BTreeSet, HashSet};

use astrokg_common::{Entity, EntityMention, ExtractionMethod, RelationCandidate};
use astrokg_ner::{Lexicon, MentionMatcher};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::parse::{split_sentences, ParsedPaper, ParsedSentence, Segment};
use crate::patterns::{relation_patterns, verb_relation};
use crate::{BuildError, Result};

pub const PATTERN_CONFIDENCE: f64 = 0.7;
pub const DEPENDENCY_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_WINDOW: usize = 50;

/// Everything the extractor needs for one paper.
#[derive(Debug, Clone, Copy)]
pub struct PaperInput<'a> {
    pub paper_id: &'a str,
    pub text: &'a str,
    /// Entity ids the resolver registered for this paper.
    pub entities: &'a [String],
    pub parse: Option<&'a ParsedPaper>,
}

pub struct RelationExtractor {
    matcher: MentionMatcher,
    window: usize,
}

impl RelationExtractor {
    /// Build the extractor over the canonical names and synonyms of the catalog.
    pub fn new(entities: &[Entity], window: usize) -> Result<Self> {
        let matcher = MentionMatcher::new(Lexicon::from_entities(entities))?;
        Ok(Self { matcher, window })
    }

    /// Catalog mentions in `text`, restricted to `allowed` entity ids. A name
    /// shared by several entities resolves to the first one in `allowed`.
    pub fn find_mentions(&self, text: &str, allowed: &HashSet<&str>) -> Vec<EntityMention> {
        self.matcher
            .find_map(text, |ids| ids.iter().find(|id| allowed.contains(id.as_str())).cloned())
            .into_iter()
            .map(|m| EntityMention {
                entity_id: m.value,
                surface_form: m.surface_form,
                start: m.start,
                end: m.end,
            })
            .collect()
    }

    /// Candidates for one paper. A failing generator is logged and skipped.
    pub fn extract_paper(&self, paper: &PaperInput<'_>) -> Vec<RelationCandidate> {
        if paper.text.trim().is_empty() || paper.entities.len() < 2 {
            return Vec::new();
        }
        let allowed: HashSet<&str> = paper.entities.iter().map(String::as_str).collect();

        let sentences = match paper.parse {
            Some(parse) if parse_aligned(parse, paper.text) => parse.segments(),
            Some(_) => {
                warn!("Parse for paper {} does not align with its text, splitting sentences", paper.paper_id);
                split_sentences(paper.text)
            }
            None => split_sentences(paper.text),
        };

        let mut candidates = self.extract_by_patterns(paper.paper_id, &sentences, &allowed);

        if let Some(parse) = paper.parse {
            let mentions = self.find_mentions(paper.text, &allowed);
            match self.extract_by_dependency(paper.paper_id, parse, &mentions) {
                Ok(found) => candidates.extend(found),
                Err(e) => warn!("Dependency extraction failed for {}: {}", paper.paper_id, e),
            }
        }

        debug!("Paper {}: {} relation candidates", paper.paper_id, candidates.len());
        candidates
    }

    /// Cue-phrase candidates.
    pub fn extract_by_patterns(
        &self,
        paper_id: &str,
        sentences: &[Segment<'_>],
        allowed: &HashSet<&str>,
    ) -> Vec<RelationCandidate> {
        let mut candidates = Vec::new();

        for sentence in sentences {
            let mentions = self.find_mentions(sentence.text, allowed);
            if distinct_entities(&mentions) < 2 {
                continue;
            }
            let sentence_text = sentence.text.trim();

            for (relation_type, patterns) in relation_patterns() {
                for pattern in patterns {
                    for cue in pattern.find_iter(sentence.text) {
                        let (cue_start, cue_end) = (cue.start(), cue.end());
                        let sources = mentions
                            .iter()
                            .filter(|m| m.end <= cue_end && m.end + self.window >= cue_end);
                        for source in sources {
                            let targets = mentions
                                .iter()
                                .filter(|m| m.start >= cue_start && m.start <= cue_start + self.window)
                                .filter(|m| m.entity_id != source.entity_id);
                            for target in targets {
                                candidates.push(RelationCandidate {
                                    paper_id: paper_id.to_string(),
                                    source: source.entity_id.clone(),
                                    relation_type: *relation_type,
                                    target: target.entity_id.clone(),
                                    sentence: sentence_text.to_string(),
                                    confidence: PATTERN_CONFIDENCE,
                                    method: ExtractionMethod::Pattern,
                                });
                            }
                        }
                    }
                }
            }
        }
        candidates
    }

    /// Verb-mediated candidates from an external dependency parse.
    ///
    /// `mentions` carry offsets into the paper text, as do the parse tokens.
    pub fn extract_by_dependency(
        &self,
        paper_id: &str,
        parse: &ParsedPaper,
        mentions: &[EntityMention],
    ) -> Result<Vec<RelationCandidate>> {
        let mut candidates = Vec::new();

        for sentence in &parse.sentences {
            validate_heads(paper_id, sentence)?;

            let entity_tokens: Vec<(usize, &str)> = sentence
                .tokens
                .iter()
                .enumerate()
                .filter_map(|(i, token)| {
                    mentions
                        .iter()
                        .find(|m| token.start >= m.start && token.start < m.end)
                        .map(|m| (i, m.entity_id.as_str()))
                })
                .collect();

            let distinct: BTreeSet<&str> = entity_tokens.iter().map(|(_, e)| *e).collect();
            if distinct.len() < 2 {
                continue;
            }

            for &(i, source) in &entity_tokens {
                for &(j, target) in &entity_tokens {
                    if source == target {
                        continue;
                    }
                    let head_i = &sentence.tokens[sentence.tokens[i].head];
                    let head_j = &sentence.tokens[sentence.tokens[j].head];
                    let verb = if head_i.pos == "VERB" {
                        head_i
                    } else if head_j.pos == "VERB" {
                        head_j
                    } else {
                        continue;
                    };
                    let Some(relation_type) = verb_relation(&verb.lemma.to_lowercase()) else {
                        continue;
                    };
                    candidates.push(RelationCandidate {
                        paper_id: paper_id.to_string(),
                        source: source.to_string(),
                        relation_type,
                        target: target.to_string(),
                        sentence: sentence.text.trim().to_string(),
                        confidence: DEPENDENCY_CONFIDENCE,
                        method: ExtractionMethod::Dependency,
                    });
                }
            }
        }
        Ok(candidates)
    }

    /// Extract every paper, in parallel above `parallel_threshold` papers.
    /// Output follows input order.
    pub fn extract_corpus(&self, papers: &[PaperInput<'_>], parallel_threshold: usize) -> Vec<Vec<RelationCandidate>> {
        let per_paper: Vec<Vec<RelationCandidate>> = if parallel_threshold > 0 && papers.len() > parallel_threshold {
            papers.par_iter().map(|paper| self.extract_paper(paper)).collect()
        } else {
            papers.iter().map(|paper| self.extract_paper(paper)).collect()
        };
        let total: usize = per_paper.iter().map(Vec::len).sum();
        info!("Relation extraction: {} candidates from {} papers", total, papers.len());
        per_paper
    }
}

fn distinct_entities(mentions: &[EntityMention]) -> usize {
    mentions.iter().map(|m| m.entity_id.as_str()).collect::<HashSet<_>>().len()
}

fn validate_heads(paper_id: &str, sentence: &ParsedSentence) -> Result<()> {
    let len = sentence.tokens.len();
    match sentence.tokens.iter().find(|t| t.head >= len) {
        Some(token) => Err(BuildError::MalformedParse {
            paper_id: paper_id.to_string(),
            reason: format!("token '{}' has head {} but sentence has {} tokens", token.text, token.head, len),
        }),
        None => Ok(()),
    }
}

fn parse_aligned(parse: &ParsedPaper, text: &str) -> bool {
    parse
        .sentences
        .iter()
        .all(|s| text.get(s.start..s.start + s.text.len()) == Some(s.text.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParsedToken;
    use astrokg_common::{EntityType, RelationType};

    fn entity(id: &str, name: &str, entity_type: EntityType) -> Entity {
        Entity::new(id, name, entity_type)
    }

    fn catalog() -> Vec<Entity> {
        vec![
            entity("E00001", "microgravity", EntityType::Condition),
            entity("E00002", "bone", EntityType::Tissue),
            entity("E00003", "osteoclasts", EntityType::CellType),
            entity("E00004", "radiation", EntityType::Condition),
        ]
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cue_window_yields_single_directed_candidate() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let text = "Prolonged microgravity affects the bone structure.";
        assert_eq!(&text[10..22], "microgravity");
        assert_eq!(&text[35..39], "bone");

        let entities = ids(&["E00001", "E00002"]);
        let paper = PaperInput { paper_id: "P1", text, entities: &entities, parse: None };
        let candidates = extractor.extract_paper(&paper);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!((c.source.as_str(), c.relation_type, c.target.as_str()), ("E00001", RelationType::Affects, "E00002"));
        assert_eq!(c.confidence, PATTERN_CONFIDENCE);
        assert_eq!(c.sentence, text);
    }

    #[test]
    fn test_mentions_of_other_papers_never_leak() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let text = "Microgravity affects bone and radiation affects osteoclasts.";
        let entities = ids(&["E00001", "E00002", "E00003"]);
        let paper = PaperInput { paper_id: "P1", text, entities: &entities, parse: None };
        let candidates = extractor.extract_paper(&paper);
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.source != "E00004" && c.target != "E00004"));
    }

    #[test]
    fn test_single_entity_sentences_are_skipped() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let text = "Microgravity affects many systems. Bone is one of them.";
        let entities = ids(&["E00001", "E00002"]);
        let paper = PaperInput { paper_id: "P1", text, entities: &entities, parse: None };
        assert!(extractor.extract_paper(&paper).is_empty());
    }

    fn token(text: &str, start: usize, lemma: &str, pos: &str, head: usize) -> ParsedToken {
        ParsedToken { text: text.into(), start, lemma: lemma.into(), pos: pos.into(), head }
    }

    fn parsed(text: &str, tokens: Vec<ParsedToken>) -> ParsedPaper {
        ParsedPaper {
            paper_id: "P1".into(),
            sentences: vec![ParsedSentence { text: text.into(), start: 0, tokens }],
        }
    }

    #[test]
    fn test_dependency_candidates_follow_verb_table() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let text = "Microgravity activates osteoclasts";
        let parse = parsed(text, vec![
            token("Microgravity", 0, "microgravity", "NOUN", 1),
            token("activates", 13, "activate", "VERB", 1),
            token("osteoclasts", 23, "osteoclast", "NOUN", 1),
        ]);
        let allowed: HashSet<&str> = ["E00001", "E00003"].into_iter().collect();
        let mentions = extractor.find_mentions(text, &allowed);
        // "activate" is not in the verb table
        assert!(extractor.extract_by_dependency("P1", &parse, &mentions).unwrap().is_empty());

        let text = "Microgravity induces osteoclasts";
        let parse = parsed(text, vec![
            token("Microgravity", 0, "microgravity", "NOUN", 1),
            token("induces", 13, "induce", "VERB", 1),
            token("osteoclasts", 21, "osteoclast", "NOUN", 1),
        ]);
        let mentions = extractor.find_mentions(text, &allowed);
        let found = extractor.extract_by_dependency("P1", &parse, &mentions).unwrap();
        // both orderings of the pair are emitted
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.relation_type == RelationType::Induces));
        assert!(found.iter().all(|c| c.confidence == DEPENDENCY_CONFIDENCE));
    }

    #[test]
    fn test_shared_name_resolves_to_the_papers_entity() {
        let mut stress = entity("E00006", "oxidative stress", EntityType::Process);
        stress.synonyms.insert("ros".into());
        let mut entities = catalog();
        entities.push(entity("E00005", "ros", EntityType::Chemical));
        entities.push(stress);
        let extractor = RelationExtractor::new(&entities, DEFAULT_WINDOW).unwrap();

        let text = "ROS reduces bone.";
        let registered = ids(&["E00006", "E00002"]);
        let paper = PaperInput { paper_id: "P1", text, entities: &registered, parse: None };
        let candidates = extractor.extract_paper(&paper);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, "E00006");
        assert_eq!(candidates[0].target, "E00002");
    }

    #[test]
    fn test_malformed_parse_is_skipped_not_fatal() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let text = "Microgravity affects bone.";
        let parse = parsed(text, vec![
            token("Microgravity", 0, "microgravity", "NOUN", 7),
            token("affects", 13, "affect", "VERB", 1),
            token("bone", 21, "bone", "NOUN", 1),
        ]);
        let allowed: HashSet<&str> = ["E00001", "E00002"].into_iter().collect();
        let mentions = extractor.find_mentions(text, &allowed);
        assert!(matches!(
            extractor.extract_by_dependency("P1", &parse, &mentions),
            Err(BuildError::MalformedParse { .. })
        ));

        // pattern candidates survive the broken parse
        let entities = ids(&["E00001", "E00002"]);
        let paper = PaperInput { paper_id: "P1", text, entities: &entities, parse: Some(&parse) };
        let candidates = extractor.extract_paper(&paper);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].method, ExtractionMethod::Pattern);
    }

    #[test]
    fn test_corpus_extraction_keeps_paper_order() {
        let extractor = RelationExtractor::new(&catalog(), DEFAULT_WINDOW).unwrap();
        let texts: Vec<String> = (0..30).map(|i| format!("Paper {}: microgravity reduces bone.", i)).collect();
        let paper_ids: Vec<String> = (0..30).map(|i| format!("P{}", i)).collect();
        let entities = ids(&["E00001", "E00002"]);
        let papers: Vec<PaperInput<'_>> = texts
            .iter()
            .zip(&paper_ids)
            .map(|(text, id)| PaperInput { paper_id: id, text, entities: &entities, parse: None })
            .collect();
        let out = extractor.extract_corpus(&papers, 8);
        assert_eq!(out, extractor.extract_corpus(&papers, 0));
        assert_eq!(out.len(), 30);
        for (i, candidates) in out.iter().enumerate() {
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].paper_id, format!("P{}", i));
            assert_eq!(candidates[0].relation_type, RelationType::Decreases);
        }
    }
}

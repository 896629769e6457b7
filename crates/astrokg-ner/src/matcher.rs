//! Dictionary mention matching using an Aho-Corasick automaton.
//!
//! Keys and text are both folded with Unicode lowercasing, and match offsets
//! are mapped back onto the original text. Matches must sit on regex-style
//! word boundaries. Overlaps are resolved greedily: matches are ordered by
//! start ascending then length descending, and a match is kept only if it
//! starts at or after the end of the last kept match. The result is the same
//! as scanning the text once per key, in time linear in the text length.

use std::collections::HashMap;

use aho_corasick::{AhoCorasick, MatchKind};
use astrokg_common::Entity;
use tracing::debug;

use crate::Result;

/// Per-character Unicode lowercasing, so folded keys and folded text agree
/// character by character.
fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Case-folded name → values (entity ids or raw labels). A key shared by
/// several entities keeps every value, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    keys: Vec<String>,
    values: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `key`. Returns false for an empty key or a
    /// value already registered under it.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> bool {
        let folded = fold(key.trim());
        if folded.is_empty() {
            return false;
        }
        let value = value.into();
        match self.index.get(&folded) {
            Some(&i) => {
                if self.values[i].contains(&value) {
                    return false;
                }
                self.values[i].push(value);
            }
            None => {
                self.index.insert(folded.clone(), self.keys.len());
                self.keys.push(folded);
                self.values.push(vec![value]);
            }
        }
        true
    }

    /// Canonical names and synonyms of every entity, in catalog order.
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut lexicon = Self::new();
        for entity in entities {
            lexicon.insert(&entity.name, entity.entity_id.as_str());
            for synonym in &entity.synonyms {
                lexicon.insert(synonym, entity.entity_id.as_str());
            }
        }
        lexicon
    }

    /// First value registered for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        match self.index.get(&fold(key.trim())) {
            Some(&i) => &self.values[i],
            None => &[],
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A lexicon key found in text, with offsets into the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconMatch {
    pub value: String,
    pub surface_form: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    key: usize,
    start: usize,
    end: usize,
}

/// Folded text plus, for every folded byte, the byte offset of the original
/// character it came from.
struct FoldedText {
    text: String,
    origin: Vec<usize>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len() + 1);
        for (i, c) in text.char_indices() {
            for lower in c.to_lowercase() {
                folded.push(lower);
                origin.extend(std::iter::repeat(i).take(lower.len_utf8()));
            }
        }
        origin.push(text.len());
        Self { text: folded, origin }
    }

    /// Original offset of a folded offset, or None when it falls inside the
    /// expansion of a single original character.
    fn original(&self, pos: usize) -> Option<usize> {
        if pos > 0 && pos < self.text.len() && self.origin[pos] == self.origin[pos - 1] {
            return None;
        }
        self.origin.get(pos).copied()
    }
}

pub struct MentionMatcher {
    /// None when the lexicon is empty
    automaton: Option<AhoCorasick>,
    lexicon: Lexicon,
}

impl MentionMatcher {
    pub fn new(lexicon: Lexicon) -> Result<Self> {
        let automaton = if lexicon.is_empty() {
            None
        } else {
            // Standard match kind: overlapping iteration must see every key
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::Standard)
                    .build(&lexicon.keys)?,
            )
        };
        debug!("MentionMatcher built over {} lexicon keys", lexicon.len());
        Ok(Self { automaton, lexicon })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Non-overlapping matches sorted by start offset, each carrying the
    /// first value of its key.
    pub fn find(&self, text: &str) -> Vec<LexiconMatch> {
        self.find_map(text, |values| values.first().cloned())
    }

    /// Like [`find`](Self::find), but `choose` picks the value among all
    /// values registered for the matched key. Overlaps are resolved first;
    /// a surviving match for which `choose` returns None is dropped.
    pub fn find_map(&self, text: &str, choose: impl Fn(&[String]) -> Option<String>) -> Vec<LexiconMatch> {
        self.spans(text)
            .into_iter()
            .filter_map(|span| {
                let value = choose(&self.lexicon.values[span.key])?;
                let surface = text.get(span.start..span.end)?;
                Some(LexiconMatch { value, surface_form: surface.to_string(), start: span.start, end: span.end })
            })
            .collect()
    }

    fn spans(&self, text: &str) -> Vec<Span> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };

        let folded = FoldedText::new(text);
        let mut spans = Vec::new();
        for mat in automaton.find_overlapping_iter(&folded.text) {
            let (Some(start), Some(end)) = (folded.original(mat.start()), folded.original(mat.end())) else {
                continue;
            };
            if !is_word_boundary(text, start) || !is_word_boundary(text, end) {
                continue;
            }
            spans.push(Span { key: mat.pattern().as_usize(), start, end });
        }
        remove_overlapping(spans)
    }

    /// Match many texts; parallel above `parallel_threshold` texts.
    pub fn find_batch(&self, texts: &[&str], parallel_threshold: usize) -> Vec<Vec<LexiconMatch>> {
        #[cfg(feature = "parallel")]
        {
            if parallel_threshold > 0 && texts.len() > parallel_threshold {
                use rayon::prelude::*;
                return texts.par_iter().map(|text| self.find(text)).collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel_threshold;
        texts.iter().map(|text| self.find(text)).collect()
    }
}

fn remove_overlapping(mut spans: Vec<Span>) -> Vec<Span> {
    // Sort by start position, then by length (longest first)
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| (b.end - b.start).cmp(&(a.end - a.start))));

    let mut result = Vec::new();
    let mut last_end = 0;
    for span in spans {
        if span.start >= last_end {
            last_end = span.end;
            result.push(span);
        }
    }
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Regex `\b` semantics at a byte offset.
fn is_word_boundary(text: &str, pos: usize) -> bool {
    let before = text.get(..pos).and_then(|s| s.chars().next_back()).map(is_word_char).unwrap_or(false);
    let after = text.get(pos..).and_then(|s| s.chars().next()).map(is_word_char).unwrap_or(false);
    before != after
}

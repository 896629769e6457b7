//! Mention matching and entity resolution for biomedical paper text.
//!
//! Raw mentions come from an external annotator (see [`AnnotatorMention`]) and
//! from the rule-based extractors in [`rules`]. The [`EntityResolver`] merges
//! them into a corpus-wide catalog of canonical entities, and the
//! [`MentionMatcher`] finds catalog names again in raw text.

mod entity_types;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod rules;

pub use entity_types::{normalize_entity_label, AnnotatorMention};
pub use matcher::{Lexicon, LexiconMatch, MentionMatcher};
pub use normalize::normalize_entity_name;
pub use resolver::{EntityResolver, Resolution};
pub use rules::RuleExtractor;

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Automaton build failed: {0}")]
    Automaton(#[from] aho_corasick::BuildError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

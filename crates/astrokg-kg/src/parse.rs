//! Sentence segmentation and the external dependency-parse record.

use serde::{Deserialize, Serialize};

/// One token of an external dependency parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToken {
    pub text: String,
    /// Byte offset of the token in the paper text.
    pub start: usize,
    pub lemma: String,
    #[serde(alias = "part_of_speech")]
    pub pos: String,
    /// Index of the syntactic head within the same sentence.
    #[serde(alias = "head_index")]
    pub head: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSentence {
    pub text: String,
    /// Byte offset of the sentence in the paper text.
    pub start: usize,
    pub tokens: Vec<ParsedToken>,
}

/// One line of the parser's JSONL output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPaper {
    pub paper_id: String,
    pub sentences: Vec<ParsedSentence>,
}

impl ParsedPaper {
    pub fn segments(&self) -> Vec<Segment<'_>> {
        self.sentences
            .iter()
            .map(|s| Segment { text: s.text.as_str(), start: s.start })
            .collect()
    }
}

/// A sentence as a slice of the paper text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub start: usize,
}

/// Split after `.`, `!` or `?` followed by whitespace. Leading whitespace is
/// dropped from each sentence and empty sentences are skipped.
pub fn split_sentences(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut sentence_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_idx, next)) = chars.peek() {
                if next.is_whitespace() {
                    push_segment(text, sentence_start, next_idx, &mut segments);
                    sentence_start = next_idx;
                }
            } else {
                push_segment(text, sentence_start, idx + c.len_utf8(), &mut segments);
                sentence_start = text.len();
            }
        }
    }
    push_segment(text, sentence_start, text.len(), &mut segments);
    segments
}

fn push_segment<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<Segment<'a>>) {
    let Some(slice) = text.get(start..end) else {
        return;
    };
    let trimmed = slice.trim_start();
    let offset = start + (slice.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        out.push(Segment { text: trimmed, start: offset });
    }
}

//! Annotated paragraph segments produced by the tokenizers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One displayed run of a paragraph.
///
/// `dict_key` is the Word the run is looked up under; `None` marks
/// punctuation and other non-lexical material. `space_after` records that
/// the run was followed by whitespace in the source paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSegment {
    pub text: String,
    pub dict_key: Option<String>,
    #[serde(default)]
    pub space_after: bool,
}

impl AnnotatedSegment {
    /// A segment looked up under `key`.
    pub fn keyed<T: Into<String>, K: Into<String>>(text: T, key: K) -> Self {
        AnnotatedSegment {
            text: text.into(),
            dict_key: Some(key.into()),
            space_after: false,
        }
    }

    /// A segment with no lookup key.
    pub fn plain<T: Into<String>>(text: T) -> Self {
        AnnotatedSegment {
            text: text.into(),
            dict_key: None,
            space_after: false,
        }
    }

    pub fn with_space_after(mut self, space_after: bool) -> Self {
        self.space_after = space_after;
        self
    }

    pub fn is_keyed(&self) -> bool {
        self.dict_key.is_some()
    }

    /// Whether this segment is looked up under `word`.
    pub fn has_key(&self, word: &str) -> bool {
        self.dict_key.as_deref() == Some(word)
    }
}

/// Display text of a paragraph, one space standing in for each run of
/// source whitespace.
pub fn paragraph_text(segments: &[AnnotatedSegment]) -> String {
    let mut text = String::new();
    for segment in segments {
        text.push_str(&segment.text);
        if segment.space_after {
            text.push(' ');
        }
    }
    text
}

/// Output of a tokenize call: the annotated paragraphs and the union of
/// their lookup keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedBatch {
    pub words: BTreeSet<String>,
    pub paragraphs: Vec<Vec<AnnotatedSegment>>,
}

impl TokenizedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph, collecting its keys into the word set.
    pub fn push_paragraph(&mut self, segments: Vec<AnnotatedSegment>) {
        self.words
            .extend(segments.iter().filter_map(|s| s.dict_key.clone()));
        self.paragraphs.push(segments);
    }

    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// First paragraph containing a segment keyed by `word`.
    pub fn paragraph_with(&self, word: &str) -> Option<&[AnnotatedSegment]> {
        self.paragraphs
            .iter()
            .find(|p| p.iter().any(|s| s.has_key(word)))
            .map(Vec::as_slice)
    }
}

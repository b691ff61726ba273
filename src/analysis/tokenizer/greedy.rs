//! Longest-match segmentation for scripts without word separators.

use std::sync::Arc;

use super::Tokenizer;

use crate::analysis::segment::{AnnotatedSegment, TokenizedBatch};
use crate::dictionary::store::DictionaryStore;
use crate::error::Result;

/// Consumes the longest registered dictionary key at every position, or a
/// single unkeyed character when no key matches.
#[derive(Debug, Clone)]
pub struct GreedyTokenizer {
    store: Arc<DictionaryStore>,
}

impl GreedyTokenizer {
    /// Segment against the keys of `store`.
    pub fn new(store: Arc<DictionaryStore>) -> Self {
        GreedyTokenizer { store }
    }

    /// The dictionary whose keys drive segmentation.
    pub fn store(&self) -> &DictionaryStore {
        &self.store
    }

    /// Segment one paragraph.
    pub fn tokenize_paragraph(&self, paragraph: &str) -> Vec<AnnotatedSegment> {
        let mut segments = Vec::new();
        let mut rest = paragraph;

        while let Some(c) = rest.chars().next() {
            let consumed = match self.store.longest_prefix(rest) {
                Some(prefix) if !prefix.is_empty() => {
                    let len = prefix.len();
                    segments.push(AnnotatedSegment::keyed(&rest[..len], prefix));
                    len
                }
                _ => {
                    segments.push(AnnotatedSegment::plain(c));
                    c.len_utf8()
                }
            };
            rest = &rest[consumed..];
        }
        segments
    }
}

impl Tokenizer for GreedyTokenizer {
    fn tokenize(&self, paragraphs: &[String]) -> Result<TokenizedBatch> {
        let mut batch = TokenizedBatch::new();
        for paragraph in paragraphs {
            batch.push_paragraph(self.tokenize_paragraph(paragraph));
        }
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

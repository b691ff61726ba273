//! Morphological segmentation through an external analyzer.

use std::sync::Arc;

use log::{debug, warn};

use super::Tokenizer;

use crate::analysis::mecab::{AnalyzerFactory, MorphAnalyzer, normalize_input};
use crate::analysis::merger::{MergeOptions, TokenMerger};
use crate::analysis::morph::MorphToken;
use crate::analysis::segment::{AnnotatedSegment, TokenizedBatch};
use crate::dictionary::entry::EntryLookup;
use crate::error::Result;

/// Analyzer tokens merged against a dictionary, one segment per merged
/// token.
///
/// Every call opens its own analyzer and releases it before returning,
/// whether tokenization succeeded or not.
pub struct MorphologicalTokenizer {
    analyzer: Box<dyn AnalyzerFactory>,
    lookup: Arc<dyn EntryLookup>,
    options: MergeOptions,
}

impl MorphologicalTokenizer {
    /// Analyze with a fresh `analyzer` per call and merge against `lookup`.
    pub fn new(analyzer: Box<dyn AnalyzerFactory>, lookup: Arc<dyn EntryLookup>) -> Self {
        MorphologicalTokenizer {
            analyzer,
            lookup,
            options: MergeOptions::default(),
        }
    }

    /// Replace the default merge options.
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    fn tokenize_with(
        &self,
        analyzer: &mut dyn MorphAnalyzer,
        paragraphs: &[String],
    ) -> Result<TokenizedBatch> {
        let merger = TokenMerger::new(self.lookup.as_ref()).with_options(self.options);
        let mut batch = TokenizedBatch::new();
        for paragraph in paragraphs {
            let tokens = analyzer.parse(paragraph)?;
            batch.push_paragraph(annotate(paragraph, merger.merge(tokens)));
        }
        Ok(batch)
    }
}

impl Tokenizer for MorphologicalTokenizer {
    fn tokenize(&self, paragraphs: &[String]) -> Result<TokenizedBatch> {
        let mut analyzer = self.analyzer.open()?;
        let result = self.tokenize_with(analyzer.as_mut(), paragraphs);
        match analyzer.close() {
            Ok(()) => debug!("analyzer closed after {} paragraphs", paragraphs.len()),
            Err(e) if result.is_err() => warn!("failed to close analyzer: {e}"),
            Err(e) => return Err(e),
        }
        result
    }

    fn name(&self) -> &'static str {
        "morphological"
    }
}

/// Turn merged tokens into segments, recovering the whitespace the analyzer
/// drops by locating each surface in the paragraph.
pub fn annotate(paragraph: &str, tokens: Vec<MorphToken>) -> Vec<AnnotatedSegment> {
    let text = normalize_input(paragraph.trim_end());
    let mut cursor = 0;

    tokens
        .into_iter()
        .map(|token| {
            if let Some(found) = text[cursor..].find(token.surface.as_str()) {
                cursor += found + token.surface.len();
            }
            let space_after = text[cursor..].starts_with(char::is_whitespace);
            let dict_key = token.word();
            AnnotatedSegment {
                text: token.surface,
                dict_key,
                space_after,
            }
        })
        .collect()
}

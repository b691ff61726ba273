//! Whitespace-delimited scripts.
//!
//! A word keeps its original text, but its lookup key holds only letters and
//! apostrophes, so digits and hyphens inside a word are dropped from the key:
//! `well-known` is keyed as `wellknown`.

use super::Tokenizer;

use crate::analysis::segment::{AnnotatedSegment, TokenizedBatch};
use crate::error::Result;

/// Punctuation allowed inside a word.
pub const INTRA_WORD_PUNCTUATION: char = '\'';

/// Typographic apostrophe, keyed as [`INTRA_WORD_PUNCTUATION`].
const RIGHT_SINGLE_QUOTE: char = '\u{2019}';

/// Splits paragraphs on whitespace and keys each word by its letters.
///
/// Leading and trailing punctuation of a piece becomes its own unkeyed
/// segment, so `"sat."` yields the keyed `sat` and an unkeyed `.`. Pieces
/// without letters (numbers, dashes) are a single unkeyed segment.
#[derive(Clone, Debug, Default)]
pub struct AlphabeticTokenizer;

impl AlphabeticTokenizer {
    pub fn new() -> Self {
        AlphabeticTokenizer
    }

    /// Segment one paragraph.
    pub fn tokenize_paragraph(&self, paragraph: &str) -> Vec<AnnotatedSegment> {
        let mut segments = Vec::new();
        let mut pieces = paragraph.split_whitespace().peekable();
        while let Some(piece) = pieces.next() {
            split_piece(piece, &mut segments);
            if pieces.peek().is_some() {
                if let Some(last) = segments.last_mut() {
                    last.space_after = true;
                }
            }
        }
        segments
    }
}

impl Tokenizer for AlphabeticTokenizer {
    fn tokenize(&self, paragraphs: &[String]) -> Result<TokenizedBatch> {
        let mut batch = TokenizedBatch::new();
        for paragraph in paragraphs {
            batch.push_paragraph(self.tokenize_paragraph(paragraph));
        }
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "alphabetic"
    }
}

/// Lookup key of a word: its letters and apostrophes, lower-cased.
pub fn word_key(word: &str) -> String {
    word.chars()
        .map(|c| if c == RIGHT_SINGLE_QUOTE { INTRA_WORD_PUNCTUATION } else { c })
        .filter(|c| c.is_alphabetic() || *c == INTRA_WORD_PUNCTUATION)
        .flat_map(char::to_lowercase)
        .collect()
}

fn split_piece(piece: &str, segments: &mut Vec<AnnotatedSegment>) {
    let start = piece.find(char::is_alphanumeric);
    let end = piece
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8());

    let (Some(start), Some(end)) = (start, end) else {
        segments.push(AnnotatedSegment::plain(piece));
        return;
    };

    let core = &piece[start..end];
    let key = word_key(core);
    if key.is_empty() {
        segments.push(AnnotatedSegment::plain(piece));
        return;
    }

    if start > 0 {
        segments.push(AnnotatedSegment::plain(&piece[..start]));
    }
    segments.push(AnnotatedSegment::keyed(core, key));
    if end < piece.len() {
        segments.push(AnnotatedSegment::plain(&piece[end..]));
    }
}

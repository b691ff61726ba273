//! Short illustrative snippets around a word.
//!
//! Given a Word and one annotated paragraph, the extractor emphasizes the
//! first run of segments keyed by the word and, when the paragraph is long,
//! cuts it down to the surrounding punctuation-delimited stretch.
//!
//! # Examples
//!
//! ```
//! use glossa::analysis::tokenizer::alphabetic::AlphabeticTokenizer;
//! use glossa::context::extract_context;
//!
//! let segments = AlphabeticTokenizer::new()
//!     .tokenize_paragraph("It was late. The old cat sat on the warm mat, and then it slept.");
//! assert_eq!(
//!     extract_context("mat", &segments).as_deref(),
//!     Some(". The old cat sat on the warm <b>mat</b>…")
//! );
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::segment::AnnotatedSegment;

/// Opening emphasis marker.
pub const EMPHASIS_OPEN: &str = "<b>";

/// Closing emphasis marker.
pub const EMPHASIS_CLOSE: &str = "</b>";

/// Snippets up to this many characters are returned untrimmed.
pub const DEFAULT_MAX_UNTRIMMED: usize = 30;

/// Marker replacing text cut mid-sentence.
pub const ELLIPSIS: &str = "…";

/// Marks after which a sentence is complete.
const SENTENCE_TERMINALS: &[char] = &['.', '\u{3002}'];

/// Whether `c` belongs to the Unicode "other punctuation" category (Po).
///
/// The apostrophe is excluded: it occurs inside words.
pub fn is_other_punctuation(c: char) -> bool {
    matches!(c,
        '!' | '"' | '#' | '%' | '&' | '*' | ',' | '.' | '/' | ':' | ';' | '?' | '@' | '\\' |
        '\u{A1}' | '\u{A7}' | '\u{B6}' | '\u{B7}' | '\u{BF}' |
        '\u{37E}' | '\u{387}' |
        '\u{55A}'..='\u{55F}' | '\u{589}' |
        '\u{5C0}' | '\u{5C3}' | '\u{5C6}' | '\u{5F3}' | '\u{5F4}' |
        '\u{60C}' | '\u{60D}' | '\u{61B}' | '\u{61F}' | '\u{66A}'..='\u{66D}' | '\u{6D4}' |
        '\u{964}' | '\u{965}' | '\u{970}' |
        '\u{E4F}' | '\u{E5A}' | '\u{E5B}' |
        '\u{2016}' | '\u{2017}' | '\u{2020}'..='\u{2027}' | '\u{2030}'..='\u{2038}' |
        '\u{203B}'..='\u{203E}' | '\u{2041}'..='\u{2043}' | '\u{2047}'..='\u{2051}' |
        '\u{2053}' | '\u{2055}'..='\u{205E}' |
        '\u{3001}'..='\u{3003}' | '\u{303D}' | '\u{30FB}' |
        '\u{FE10}'..='\u{FE16}' | '\u{FE19}' | '\u{FE30}' | '\u{FE45}' | '\u{FE46}' |
        '\u{FE49}'..='\u{FE4C}' | '\u{FE50}'..='\u{FE52}' | '\u{FE54}'..='\u{FE57}' |
        '\u{FF01}'..='\u{FF03}' | '\u{FF05}'..='\u{FF07}' | '\u{FF0A}' | '\u{FF0C}' |
        '\u{FF0E}' | '\u{FF0F}' | '\u{FF1A}' | '\u{FF1B}' | '\u{FF1F}' | '\u{FF20}' |
        '\u{FF3C}' | '\u{FF61}' | '\u{FF64}' | '\u{FF65}'
    )
}

fn is_sentence_terminal(c: char) -> bool {
    SENTENCE_TERMINALS.contains(&c)
}

/// Extracts context snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextExtractor {
    max_untrimmed: usize,
}

impl Default for ContextExtractor {
    fn default() -> Self {
        ContextExtractor {
            max_untrimmed: DEFAULT_MAX_UNTRIMMED,
        }
    }
}

impl ContextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length (in user-perceived characters) up to which snippets
    /// are returned whole.
    pub fn with_max_untrimmed(mut self, max_untrimmed: usize) -> Self {
        self.max_untrimmed = max_untrimmed;
        self
    }

    /// The snippet around the first run of segments keyed by `word`, or
    /// `None` when no segment is.
    pub fn extract(&self, word: &str, segments: &[AnnotatedSegment]) -> Option<String> {
        let run_start = segments.iter().position(|s| s.has_key(word))?;
        let run_len = segments[run_start..]
            .iter()
            .take_while(|s| s.has_key(word))
            .count();
        let run_end = run_start + run_len;

        let mut text = String::new();
        let mut start = 0;
        let mut end = 0;
        for (i, segment) in segments.iter().enumerate() {
            if i == run_start {
                start = text.len();
                text.push_str(EMPHASIS_OPEN);
            }
            text.push_str(&segment.text);
            let last_of_run = i + 1 == run_end;
            if segment.space_after && !last_of_run {
                text.push(' ');
            }
            if last_of_run {
                text.push_str(EMPHASIS_CLOSE);
                end = text.len();
                if segment.space_after {
                    text.push(' ');
                }
            }
        }

        if text.graphemes(true).count() <= self.max_untrimmed {
            return Some(text);
        }

        let mut snippet = trim_after(&text, end);
        let (head, prefixed) = trim_before(&snippet, start);
        if let Some(head) = head {
            snippet = if prefixed { format!("{ELLIPSIS}{head}") } else { head };
        }
        Some(snippet)
    }
}

/// Cut `text` at the first punctuation mark at or after byte `end`.
fn trim_after(text: &str, end: usize) -> String {
    let found = text[end..]
        .char_indices()
        .find(|(_, c)| is_other_punctuation(*c))
        .map(|(i, c)| (end + i, c));

    match found {
        Some((at, c)) if is_sentence_terminal(c) => text[..at + c.len_utf8()].to_string(),
        Some((at, _)) => format!("{}{ELLIPSIS}", text[..at].trim_end()),
        None => text.to_string(),
    }
}

/// The part of `text` from the last punctuation mark before byte `start`,
/// and whether it needs an ellipsis in front. `None` when nothing is cut.
fn trim_before(text: &str, start: usize) -> (Option<String>, bool) {
    let found = text[..start]
        .char_indices()
        .rev()
        .find(|(_, c)| is_other_punctuation(*c));

    match found {
        Some((at, c)) if is_sentence_terminal(c) => (Some(text[at..].to_string()), false),
        Some((at, c)) => (Some(text[at + c.len_utf8()..].trim_start().to_string()), true),
        None => (None, false),
    }
}

/// [`ContextExtractor::extract`] with the default settings.
pub fn extract_context(word: &str, segments: &[AnnotatedSegment]) -> Option<String> {
    ContextExtractor::default().extract(word, segments)
}

//! HTML rendering of annotated paragraphs.
//!
//! A paragraph renders as `<p>…</p>`. Keyed segments become
//! `<span data-src="KEY">TEXT</span>`, unkeyed segments are escaped text,
//! and the whitespace following a segment sits outside its span. Paragraphs
//! are separated by a newline. [`decode`] parses the format back.
//!
//! # Examples
//!
//! ```
//! use glossa::analysis::AnnotatedSegment;
//! use glossa::render::render_paragraph;
//!
//! let html = render_paragraph(&[
//!     AnnotatedSegment::keyed("Fish", "fish").with_space_after(true),
//!     AnnotatedSegment::keyed("&", "and"),
//! ]);
//! assert_eq!(
//!     html,
//!     r#"<p><span data-src="fish">Fish</span> <span data-src="and">&amp;</span></p>"#
//! );
//! ```

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::analysis::segment::{AnnotatedSegment, TokenizedBatch};

lazy_static! {
    static ref PARAGRAPH_RE: Regex = Regex::new(r"(?s)<p>(.*?)</p>").unwrap();
    static ref RUN_RE: Regex =
        Regex::new(r#"<span data-src="([^"]*)">([^<]*)</span>|([^<]+)"#).unwrap();
    static ref ENTITY_RE: Regex = Regex::new(r"&(amp|lt|gt|quot|#39|#x27);").unwrap();
}

/// Escape text for HTML content and attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Reverse [`escape`].
pub fn unescape(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &Captures| match &caps[1] {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        _ => "'",
    })
}

/// Render one paragraph.
pub fn render_paragraph(segments: &[AnnotatedSegment]) -> String {
    let mut html = String::from("<p>");
    for segment in segments {
        match &segment.dict_key {
            Some(key) => {
                html.push_str("<span data-src=\"");
                html.push_str(&escape(key));
                html.push_str("\">");
                html.push_str(&escape(&segment.text));
                html.push_str("</span>");
            }
            None => html.push_str(&escape(&segment.text)),
        }
        if segment.space_after {
            html.push(' ');
        }
    }
    html.push_str("</p>");
    html
}

/// Render paragraphs, one per line.
pub fn render_paragraphs(paragraphs: &[Vec<AnnotatedSegment>]) -> String {
    paragraphs
        .iter()
        .map(|p| render_paragraph(p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render every paragraph of a batch.
pub fn render_batch(batch: &TokenizedBatch) -> String {
    render_paragraphs(&batch.paragraphs)
}

/// Parse rendered paragraphs back into segments.
///
/// Adjacent unkeyed segments come back as one segment; the display text of
/// every paragraph is preserved. Text outside `<p>` elements is ignored.
pub fn decode(html: &str) -> Vec<Vec<AnnotatedSegment>> {
    PARAGRAPH_RE
        .captures_iter(html)
        .map(|caps| decode_paragraph(&caps[1]))
        .collect()
}

fn decode_paragraph(body: &str) -> Vec<AnnotatedSegment> {
    let mut segments = Vec::new();
    for caps in RUN_RE.captures_iter(body) {
        match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(key), Some(text), _) => segments.push(AnnotatedSegment::keyed(
                unescape(text.as_str()),
                unescape(key.as_str()),
            )),
            (_, _, Some(run)) => push_plain(&mut segments, &unescape(run.as_str())),
            _ => {}
        }
    }
    segments
}

fn push_plain(segments: &mut Vec<AnnotatedSegment>, run: &str) {
    let mut run = run;
    if let Some(rest) = run.strip_prefix(' ') {
        if let Some(prev) = segments.last_mut().filter(|prev| !prev.space_after) {
            prev.space_after = true;
            run = rest;
        }
    }
    if run.is_empty() {
        return;
    }
    let segment = match run.strip_suffix(' ') {
        Some(body) if !body.is_empty() => AnnotatedSegment::plain(body).with_space_after(true),
        _ => AnnotatedSegment::plain(run),
    };
    segments.push(segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::segment::paragraph_text;
    use crate::analysis::tokenizer::alphabetic::AlphabeticTokenizer;

    #[test]
    fn test_escape_unescape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(unescape("&lt;b&gt; &amp;lt; &#x27;&#39;"), "<b> &lt; ''");
    }

    #[test]
    fn test_render_the_cat_sat() {
        let segments = AlphabeticTokenizer::new().tokenize_paragraph("The cat sat.");
        assert_eq!(
            render_paragraph(&segments),
            r#"<p><span data-src="the">The</span> <span data-src="cat">cat</span> <span data-src="sat">sat</span>.</p>"#
        );
    }

    #[test]
    fn test_render_paragraphs() {
        let paragraphs = vec![vec![AnnotatedSegment::plain("a")], vec![AnnotatedSegment::plain("b")]];
        assert_eq!(render_paragraphs(&paragraphs), "<p>a</p>\n<p>b</p>");
        assert_eq!(render_paragraphs(&[]), "");
    }

    #[test]
    fn test_decode_round_trip() {
        let tokenizer = AlphabeticTokenizer::new();
        let texts = [
            "The cat sat.",
            "\"Fish & chips,\" she said -- <loudly>.",
            "It's   1984 again!",
        ];
        let paragraphs: Vec<_> = texts.iter().map(|t| tokenizer.tokenize_paragraph(t)).collect();
        let decoded = decode(&render_paragraphs(&paragraphs));

        assert_eq!(decoded.len(), paragraphs.len());
        for (original, decoded) in paragraphs.iter().zip(&decoded) {
            assert_eq!(paragraph_text(decoded), paragraph_text(original));
            let keys = |segments: &[AnnotatedSegment]| -> Vec<String> {
                segments.iter().filter_map(|s| s.dict_key.clone()).collect()
            };
            assert_eq!(keys(decoded), keys(original));
        }
        assert_eq!(paragraph_text(&decoded[2]), "It's 1984 again!");
    }

    #[test]
    fn test_decode_preserves_spacing_flags() {
        let segments = vec![
            AnnotatedSegment::keyed("cat", "cat").with_space_after(true),
            AnnotatedSegment::plain("--").with_space_after(true),
            AnnotatedSegment::keyed("dog", "dog"),
        ];
        assert_eq!(decode(&render_paragraph(&segments)), vec![segments]);
    }

    #[test]
    fn test_decode_ignores_stray_text() {
        assert!(decode("no paragraphs here").is_empty());
        assert_eq!(decode("<p></p>"), vec![Vec::<AnnotatedSegment>::new()]);
    }
}

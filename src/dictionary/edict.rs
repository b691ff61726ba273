//! EDICT-format lexicon.
//!
//! Each line reads `KEY [READING] /gloss/gloss/.../`; the reading part is
//! absent for words written in kana. The first line of a file is a header.
//! Entries are cross-referenced both by headword and by reading, so a
//! lookup on either returns the entry.
//!
//! Stock EDICT files are EUC-JP. Text that is valid UTF-8 is read as such;
//! anything else is decoded with the configured fallback encoding.

use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::Path;

use ahash::AHashMap;
use encoding_rs::{EUC_JP_INIT, Encoding};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::analysis::kana::is_kana_only;
use crate::dictionary::entry::{ARCHAIC_MARKER, DictEntry, EntryLookup, POPULAR_MARKER};
use crate::error::Result;

/// Encoding of EDICT files that are not UTF-8.
pub static DEFAULT_EDICT_ENCODING: &Encoding = &EUC_JP_INIT;

lazy_static! {
    static ref READING_RE: Regex = Regex::new(r"^\[([^\]]*)\]\s*(.*)$").unwrap();
}

/// In-memory EDICT lexicon.
#[derive(Debug, Clone, Default)]
pub struct EdictDictionary {
    by_key: AHashMap<String, Vec<DictEntry>>,
    entry_count: usize,
}

impl EdictDictionary {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an EDICT file, UTF-8 or EUC-JP.
    pub fn open<P: AsRef<Path>>(path: P, popular_only: bool) -> Result<Self> {
        Self::open_with_encoding(path, DEFAULT_EDICT_ENCODING, popular_only)
    }

    /// Load an EDICT file that is either UTF-8 or in `fallback`.
    pub fn open_with_encoding<P: AsRef<Path>>(
        path: P,
        fallback: &'static Encoding,
        popular_only: bool,
    ) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes, fallback, popular_only)
    }

    /// Read EDICT text from `reader`, UTF-8 or EUC-JP.
    pub fn from_reader<R: Read>(mut reader: R, popular_only: bool) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes, DEFAULT_EDICT_ENCODING, popular_only)
    }

    /// Parse EDICT bytes, skipping the header line.
    ///
    /// Archaic senses are never loaded. With `popular_only`, entries without
    /// the popular marker are dropped as well.
    pub fn from_bytes(
        bytes: &[u8],
        fallback: &'static Encoding,
        popular_only: bool,
    ) -> Result<Self> {
        let text = decode_text(bytes, fallback);
        let mut dict = EdictDictionary::new();
        for line in text.lines().skip(1) {
            if let Some(entry) = parse_line(line) {
                if entry.definition.contains(ARCHAIC_MARKER) {
                    continue;
                }
                if popular_only && !entry.definition.contains(POPULAR_MARKER) {
                    continue;
                }
                dict.insert(entry);
            }
        }
        debug!("loaded {} EDICT entries", dict.entry_count);
        Ok(dict)
    }

    /// Add an entry under its headword and its reading.
    pub fn insert(&mut self, entry: DictEntry) {
        let mut keys = vec![entry.headword.clone()];
        if let Some(reading) = &entry.reading {
            if *reading != entry.headword {
                keys.push(reading.clone());
            }
        }
        for key in keys {
            let bucket = self.by_key.entry(key).or_default();
            if !bucket.contains(&entry) {
                bucket.push(entry.clone());
            }
        }
        self.entry_count += 1;
    }

    /// Number of entries inserted.
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

impl EntryLookup for EdictDictionary {
    fn entries(&self, key: &str) -> Vec<DictEntry> {
        self.by_key.get(key).cloned().unwrap_or_default()
    }

    fn has_entries(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }
}

fn decode_text<'a>(bytes: &'a [u8], fallback: &'static Encoding) -> Cow<'a, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    let (text, malformed) = fallback.decode_without_bom_handling(bytes);
    if malformed {
        warn!("EDICT text is not valid {}, damaged characters replaced", fallback.name());
    }
    text
}

/// Parse one EDICT line. Comments and blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<DictEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, rest) = line.split_once([' ', '\t'])?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let rest = rest.trim_start();

    let (reading, definition) = match READING_RE.captures(rest) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (key.to_string(), rest.to_string()),
    };
    let reading = if is_kana_only(key) { None } else { Some(reading) };

    Some(DictEntry::new(key, reading, definition))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
　？？？ /EDICT header/
# comment
日本 [にほん] /(n) Japan/(P)/
日本 [にっぽん] /(n) Japan/
これ /(pn) this/(P)/
古語 [こご] /(n) old word/(arch)/
";

    #[test]
    fn test_parse_line_with_reading() {
        let entry = parse_line("日本 [にほん] /(n) Japan/(P)/").unwrap();
        assert_eq!(entry.headword, "日本");
        assert_eq!(entry.reading.as_deref(), Some("にほん"));
        assert_eq!(entry.definition, "/(n) Japan/(P)/");
        assert!(entry.is_popular());
    }

    #[test]
    fn test_kana_headword_has_no_reading() {
        let entry = parse_line("これ /(pn) this/").unwrap();
        assert_eq!(entry.reading, None);
        assert_eq!(entry.primary_reading(), "これ");

        let entry = parse_line("テレビ [テレビ] /(n) TV/").unwrap();
        assert_eq!(entry.reading, None);
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        assert!(parse_line("# nothing").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("lonely").is_none());
    }

    #[test]
    fn test_load_cross_references_readings() {
        let dict = EdictDictionary::from_reader(SAMPLE.as_bytes(), false).unwrap();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.entries("日本").len(), 2);
        assert_eq!(dict.entries("にほん").len(), 1);
        assert_eq!(dict.entries("にっぽん")[0].headword, "日本");
        assert!(dict.has_entries("これ"));
        assert!(!dict.has_entries("古語"));

        let readings = dict.readings("日本");
        assert_eq!(readings.len(), 2);
        assert!(dict.entry_with_reading("日本", "にっぽん").is_some());
    }

    #[test]
    fn test_load_euc_jp() {
        let (bytes, _, unmappable) = encoding_rs::EUC_JP.encode(SAMPLE);
        assert!(!unmappable);
        assert!(std::str::from_utf8(&bytes).is_err());

        let dict = EdictDictionary::from_reader(&bytes[..], false).unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.entries("にっぽん")[0].headword, "日本");
        assert_eq!(dict.entries("これ")[0].definition, "/(pn) this/(P)/");
    }

    #[test]
    fn test_open_with_explicit_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("edict");
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(SAMPLE);
        fs::write(&path, &bytes).unwrap();

        let dict = EdictDictionary::open_with_encoding(&path, encoding_rs::SHIFT_JIS, false).unwrap();
        assert_eq!(dict.entries("日本").len(), 2);

        fs::write(&path, SAMPLE).unwrap();
        let dict = EdictDictionary::open(&path, false).unwrap();
        assert_eq!(dict.entries("日本").len(), 2);
    }

    #[test]
    fn test_popular_only() {
        let dict = EdictDictionary::from_reader(SAMPLE.as_bytes(), true).unwrap();
        assert_eq!(dict.entries("日本").len(), 1);
        assert!(dict.entries("にっぽん").is_empty());
    }
}

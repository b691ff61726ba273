//! Sorted headword index for StarDict-style dictionaries.
//!
//! The on-disk index is a flat sequence of records:
//!
//! ```text
//! key-bytes 0x00 offset(u32, big-endian) size(u32, big-endian)
//! ```
//!
//! Records are parsed, sorted by raw key bytes and then never mutated again,
//! so every search below can rely on the ordering.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use ahash::AHashSet;
use byteorder::{BigEndian, ByteOrder};

use crate::error::{GlossaError, Result};

/// Size of the `(offset, size)` pair that follows every key.
const RECORD_TAIL_LEN: usize = 8;

/// Location of one headword's definition inside the data blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryIndexEntry {
    /// Raw key bytes (UTF-8 text for every dictionary we produce).
    pub key: Vec<u8>,
    /// Byte offset of the definition in the data file.
    pub offset: u32,
    /// Length of the definition in bytes.
    pub size: u32,
}

impl DictionaryIndexEntry {
    /// Create a new index entry.
    pub fn new<K: Into<Vec<u8>>>(key: K, offset: u32, size: u32) -> Self {
        DictionaryIndexEntry {
            key: key.into(),
            offset,
            size,
        }
    }

    /// The key as text, if it is valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }
}

/// Immutable, key-sorted sequence of index entries.
///
/// Several entries may share a key (homonyms or variant senses); they stay
/// in file order relative to each other.
#[derive(Debug, Default)]
pub struct DictionaryIndex {
    entries: Vec<DictionaryIndexEntry>,
    key_set: OnceLock<AHashSet<Vec<u8>>>,
}

impl DictionaryIndex {
    /// Build an index from unsorted entries.
    pub fn from_entries(mut entries: Vec<DictionaryIndexEntry>) -> Self {
        // Stable sort keeps homonyms in index order.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        DictionaryIndex {
            entries,
            key_set: OnceLock::new(),
        }
    }

    /// Parse the binary index format.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let nul = match bytes[pos..].iter().position(|&b| b == 0) {
                Some(rel) => pos + rel,
                None => {
                    return Err(GlossaError::format(format!(
                        "unterminated index key at byte {pos}"
                    )));
                }
            };
            let tail = nul + 1;
            if tail + RECORD_TAIL_LEN > bytes.len() {
                return Err(GlossaError::format(format!(
                    "truncated index record at byte {pos}"
                )));
            }

            let offset = BigEndian::read_u32(&bytes[tail..tail + 4]);
            let size = BigEndian::read_u32(&bytes[tail + 4..tail + RECORD_TAIL_LEN]);
            if nul > pos {
                entries.push(DictionaryIndexEntry::new(&bytes[pos..nul], offset, size));
            }
            pos = tail + RECORD_TAIL_LEN;
        }

        Ok(Self::from_entries(entries))
    }

    /// Read and parse an index file.
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    /// All entries in key order.
    pub fn entries(&self) -> &[DictionaryIndexEntry] {
        &self.entries
    }

    /// Number of entries (homonyms counted separately).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the first entry whose key is `>= key`.
    pub fn lower_bound(&self, key: &[u8]) -> usize {
        self.entries.partition_point(|e| e.key.as_slice() < key)
    }

    /// The maximal contiguous run of entries whose key equals `key`.
    pub fn matching(&self, key: &[u8]) -> &[DictionaryIndexEntry] {
        let start = self.lower_bound(key);
        let len = self.entries[start..]
            .iter()
            .take_while(|e| e.key == key)
            .count();
        &self.entries[start..start + len]
    }

    /// Set-backed membership test.
    ///
    /// The first call materializes every key into a hash set; later calls are
    /// O(1). The set is derived from `entries`, so it covers exactly the key
    /// space that [`DictionaryIndex::matching`] searches.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.key_set
            .get_or_init(|| self.entries.iter().map(|e| e.key.clone()).collect())
            .contains(key)
    }

    /// Longest registered key that is a prefix of `key`.
    ///
    /// Repeatedly locates the insertion point of the candidate, compares it
    /// with the neighbours on both sides and shrinks the candidate to the
    /// longer common prefix (or by one character when nothing is shared).
    /// Every registered prefix of the input sorts between itself and the
    /// input, so the left neighbour always shares at least that much and the
    /// search never skips past the answer.
    pub fn longest_prefix(&self, key: &str) -> Option<String> {
        let mut candidate = key;

        while !candidate.is_empty() {
            let bytes = candidate.as_bytes();
            let pos = self.lower_bound(bytes);

            let before = pos.checked_sub(1).map(|i| self.entries[i].key.as_slice());
            let at = self.entries.get(pos).map(|e| e.key.as_slice());

            if before == Some(bytes) || at == Some(bytes) {
                return Some(candidate.to_string());
            }

            let shared = [before, at]
                .into_iter()
                .flatten()
                .map(|neighbour| common_prefix_len(candidate, neighbour))
                .max()
                .unwrap_or(0);

            candidate = if shared == 0 || shared >= candidate.len() {
                drop_last_char(candidate)
            } else {
                &candidate[..shared]
            };
        }

        None
    }
}

/// Length in bytes of the common prefix of `text` and `other`, backed off to
/// a character boundary of `text`.
fn common_prefix_len(text: &str, other: &[u8]) -> usize {
    let mut len = text
        .as_bytes()
        .iter()
        .zip(other)
        .take_while(|(a, b)| a == b)
        .count();
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    len
}

fn drop_last_char(text: &str) -> &str {
    match text.char_indices().next_back() {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Encode entries in the binary index format, in the order given.
pub fn encode_entries(entries: &[DictionaryIndexEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut tail = [0u8; RECORD_TAIL_LEN];
    for entry in entries {
        out.extend_from_slice(&entry.key);
        out.push(0);
        BigEndian::write_u32(&mut tail[..4], entry.offset);
        BigEndian::write_u32(&mut tail[4..], entry.size);
        out.extend_from_slice(&tail);
    }
    out
}

//! Generic dictionary entries and the lookup seam used by the token merger.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Marker flagging the common sense of a word.
pub const POPULAR_MARKER: &str = "/(P)/";

/// Marker flagging an archaic sense.
pub const ARCHAIC_MARKER: &str = "/(arch)/";

/// One `(headword, reading, definition)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DictEntry {
    /// Citation form.
    pub headword: String,
    /// Phonetic reading; `None` when the headword is already phonetic or the
    /// source does not record one.
    pub reading: Option<String>,
    /// Definition text.
    pub definition: String,
}

impl DictEntry {
    /// Create a new entry.
    pub fn new<H, D>(headword: H, reading: Option<String>, definition: D) -> Self
    where
        H: Into<String>,
        D: Into<String>,
    {
        DictEntry {
            headword: headword.into(),
            reading,
            definition: definition.into(),
        }
    }

    /// The reading if recorded, otherwise the headword itself.
    pub fn primary_reading(&self) -> &str {
        self.reading.as_deref().unwrap_or(&self.headword)
    }

    /// Whether the definition carries the popular marker.
    pub fn is_popular(&self) -> bool {
        self.definition.contains(POPULAR_MARKER)
    }
}

/// Keyed access to dictionary entries.
///
/// Implementations never fail: an unknown key yields no entries.
pub trait EntryLookup: Send + Sync {
    /// All entries registered under `key`.
    fn entries(&self, key: &str) -> Vec<DictEntry>;

    /// Whether anything is registered under `key`.
    fn has_entries(&self, key: &str) -> bool {
        !self.entries(key).is_empty()
    }

    /// The entry for `key` whose recorded reading is exactly `reading`.
    fn entry_with_reading(&self, key: &str, reading: &str) -> Option<DictEntry> {
        self.entries(key)
            .into_iter()
            .find(|entry| entry.reading.as_deref() == Some(reading))
    }

    /// Distinct recorded readings of the entries under `key`.
    fn readings(&self, key: &str) -> BTreeSet<Option<String>> {
        self.entries(key)
            .into_iter()
            .map(|entry| entry.reading)
            .collect()
    }
}

/// A lookup that knows no words.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDictionary;

impl EntryLookup for NoDictionary {
    fn entries(&self, _key: &str) -> Vec<DictEntry> {
        Vec::new()
    }
}

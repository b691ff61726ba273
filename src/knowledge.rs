//! Vocabulary knowledge levels keyed by Word.
//!
//! Persistence is left to the embedding application; [`KnowledgeStore`] is
//! the seam and [`MemoryKnowledgeStore`] an in-process implementation.

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GlossaError, Result};

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"^(.*?)\s*\[(.*)\]\s*$").unwrap();
}

/// How well a word is known: 5 unknown, down to 1 well known; 0 means
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct KnowledgeLevel(u8);

impl KnowledgeLevel {
    pub const IGNORED: KnowledgeLevel = KnowledgeLevel(0);
    pub const WELL_KNOWN: KnowledgeLevel = KnowledgeLevel(1);
    pub const UNKNOWN: KnowledgeLevel = KnowledgeLevel(5);

    /// Validate a raw level.
    pub fn new(level: u8) -> Result<Self> {
        if level > Self::UNKNOWN.0 {
            return Err(GlossaError::format(format!(
                "knowledge level {level} is out of range 0..=5"
            )));
        }
        Ok(KnowledgeLevel(level))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Levels that carry no learning progress.
    pub fn is_untracked(self) -> bool {
        self == Self::IGNORED || self == Self::UNKNOWN
    }
}

impl Default for KnowledgeLevel {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl TryFrom<u8> for KnowledgeLevel {
    type Error = GlossaError;

    fn try_from(level: u8) -> Result<Self> {
        KnowledgeLevel::new(level)
    }
}

impl From<KnowledgeLevel> for u8 {
    fn from(level: KnowledgeLevel) -> u8 {
        level.0
    }
}

impl fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What is recorded about one word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordKnowledge {
    pub level: KnowledgeLevel,
    pub notes: String,
}

/// Split a Word into its base form and optional bracketed reading.
pub fn split_word(word: &str) -> (&str, Option<&str>) {
    match WORD_RE.captures(word) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(base), Some(reading)) => (base.as_str(), Some(reading.as_str())),
            _ => (word, None),
        },
        None => (word, None),
    }
}

/// Per-language storage of word knowledge.
pub trait KnowledgeStore: Send + Sync {
    /// What is known about `word`; unknown words get the default record.
    fn get(&self, language: &str, word: &str) -> WordKnowledge;

    /// Record `knowledge` for `word`.
    fn set(&self, language: &str, word: &str, knowledge: WordKnowledge) -> Result<()>;

    /// Every recorded word of `language`, in key order.
    fn words(&self, language: &str) -> Vec<(String, WordKnowledge)>;

    /// Records for several words at once.
    fn get_many(&self, language: &str, words: &[String]) -> BTreeMap<String, WordKnowledge> {
        words
            .iter()
            .map(|w| (w.clone(), self.get(language, w)))
            .collect()
    }

    /// Tab-separated export of the words being learnt: base form, reading,
    /// level and notes flattened to one line. Untracked words are skipped.
    fn export_tsv(&self, language: &str) -> String {
        self.words(language)
            .into_iter()
            .filter(|(_, k)| !k.level.is_untracked())
            .map(|(word, k)| {
                let (base, reading) = split_word(&word);
                let notes = k.notes.replace(['\n', '\t'], " ");
                format!("{base}\t{}\t{}\t{}", reading.unwrap_or(""), k.level, notes.trim())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A [`KnowledgeStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryKnowledgeStore {
    table: RwLock<AHashMap<String, BTreeMap<String, WordKnowledge>>>,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded words across languages.
    pub fn len(&self) -> usize {
        self.table.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KnowledgeStore for MemoryKnowledgeStore {
    fn get(&self, language: &str, word: &str) -> WordKnowledge {
        self.table
            .read()
            .get(language)
            .and_then(|words| words.get(word))
            .cloned()
            .unwrap_or_default()
    }

    fn set(&self, language: &str, word: &str, knowledge: WordKnowledge) -> Result<()> {
        self.table
            .write()
            .entry(language.to_string())
            .or_default()
            .insert(word.to_string(), knowledge);
        Ok(())
    }

    fn words(&self, language: &str) -> Vec<(String, WordKnowledge)> {
        self.table
            .read()
            .get(language)
            .map(|words| words.iter().map(|(w, k)| (w.clone(), k.clone())).collect())
            .unwrap_or_default()
    }
}

//! Tokenizer and per-language configuration.
//!
//! Configuration is plain serde data, usually read from a JSON file:
//!
//! ```
//! use glossa::config::{GlossaConfig, Strategy};
//!
//! let config = GlossaConfig::from_json(r#"{
//!     "tokenizer": { "max_distance": 3 },
//!     "languages": [
//!         { "code": "jpn", "dictionary": "/usr/share/stardict/dic/jmdict-ja-en" },
//!         { "code": "eng", "dict_url": "https://en.wiktionary.org/wiki/@WORD@" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.tokenizer.max_distance, 3);
//! assert_eq!(config.language("jpn").unwrap().strategy(), Strategy::Morphological);
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::analysis::merger::{DEFAULT_MAX_DISTANCE, MergeOptions};
use crate::dictionary::cache::{DEFAULT_INDEX_CACHE_CAPACITY, IndexCache};
use crate::dictionary::edict::DEFAULT_EDICT_ENCODING;
use crate::dictionary::store::{DEFAULT_DECOMPRESS_COMMAND, DictionaryOptions};
use crate::error::{GlossaError, Result};

/// Placeholder substituted by [`LanguageConfig::dict_url_for`].
pub const WORD_PLACEHOLDER: &str = "@WORD@";

/// Segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Whitespace-delimited alphabetic scripts.
    Alphabetic,
    /// External morphological analyzer plus token merging.
    Morphological,
    /// Longest dictionary prefix, character by character.
    Greedy,
}

impl Strategy {
    /// Default strategy for an ISO 639 language code.
    pub fn for_language(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "jpn" => Strategy::Morphological,
            "zho" | "chi" | "cmn" | "yue" => Strategy::Greedy,
            _ => Strategy::Alphabetic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Alphabetic => "alphabetic",
            Strategy::Morphological => "morphological",
            Strategy::Greedy => "greedy",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = GlossaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alphabetic" => Ok(Strategy::Alphabetic),
            "morphological" => Ok(Strategy::Morphological),
            "greedy" => Ok(Strategy::Greedy),
            other => Err(GlossaError::config(format!("unknown strategy: {other}"))),
        }
    }
}

/// Settings shared by every language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Morphological analyzer program followed by any leading arguments.
    pub analyzer_command: Vec<String>,

    /// Program and leading arguments expanding a dictzip file to stdout.
    pub decompress_command: Vec<String>,

    /// Lookahead window of the dictionary merge pass.
    pub max_distance: usize,

    /// Fold auxiliaries into conjugation chains.
    pub auxiliary: bool,

    /// Require merge candidates to agree with the analyzer's reading.
    pub reading_check: bool,

    /// Number of parsed dictionary indexes kept in memory.
    pub index_cache_capacity: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            analyzer_command: vec!["mecab".to_string()],
            decompress_command: DEFAULT_DECOMPRESS_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_distance: DEFAULT_MAX_DISTANCE,
            auxiliary: true,
            reading_check: false,
            index_cache_capacity: DEFAULT_INDEX_CACHE_CAPACITY,
        }
    }
}

impl TokenizerConfig {
    pub fn with_analyzer_command(mut self, command: Vec<String>) -> Self {
        self.analyzer_command = command;
        self
    }

    pub fn with_decompress_command(mut self, command: Vec<String>) -> Self {
        self.decompress_command = command;
        self
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_auxiliary(mut self, auxiliary: bool) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    pub fn with_reading_check(mut self, reading_check: bool) -> Self {
        self.reading_check = reading_check;
        self
    }

    pub fn with_index_cache_capacity(mut self, capacity: usize) -> Self {
        self.index_cache_capacity = capacity;
        self
    }

    /// Options for the token merger.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::default()
            .with_max_distance(self.max_distance)
            .with_auxiliary(self.auxiliary)
            .with_reading_check(self.reading_check)
    }

    /// Options for opening dictionaries through `cache`.
    pub fn dictionary_options(&self, cache: Arc<IndexCache>) -> DictionaryOptions {
        DictionaryOptions::default()
            .with_decompress_command(self.decompress_command.clone())
            .with_cache(cache)
    }

    /// A fresh index cache sized by this configuration.
    pub fn index_cache(&self) -> Arc<IndexCache> {
        Arc::new(IndexCache::new(self.index_cache_capacity))
    }
}

/// Settings of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// ISO 639 code, e.g. `jpn`.
    pub code: String,

    /// Strategy override; derived from `code` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Basename (or any file) of an index/data dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,

    /// EDICT lexicon used by the merger instead of `dictionary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edict: Option<PathBuf>,

    /// Encoding label of a non-UTF-8 `edict` file; EUC-JP when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edict_encoding: Option<String>,

    /// External dictionary URL template containing `@WORD@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_url: Option<String>,
}

impl LanguageConfig {
    pub fn new<S: Into<String>>(code: S) -> Self {
        LanguageConfig {
            code: code.into(),
            strategy: None,
            dictionary: None,
            edict: None,
            edict_encoding: None,
            dict_url: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_dictionary<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dictionary = Some(path.into());
        self
    }

    pub fn with_edict<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.edict = Some(path.into());
        self
    }

    pub fn with_edict_encoding<S: Into<String>>(mut self, label: S) -> Self {
        self.edict_encoding = Some(label.into());
        self
    }

    /// The fallback encoding of the EDICT file.
    pub fn edict_encoding(&self) -> Result<&'static Encoding> {
        match &self.edict_encoding {
            None => Ok(DEFAULT_EDICT_ENCODING),
            Some(label) => Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                GlossaError::config(format!("unknown EDICT encoding {label:?} for {}", self.code))
            }),
        }
    }

    pub fn with_dict_url<S: Into<String>>(mut self, template: S) -> Self {
        self.dict_url = Some(template.into());
        self
    }

    /// The effective strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
            .unwrap_or_else(|| Strategy::for_language(&self.code))
    }

    /// The external dictionary URL for `word`, if a template is configured.
    pub fn dict_url_for(&self, word: &str) -> Option<String> {
        self.dict_url
            .as_ref()
            .map(|template| template.replace(WORD_PLACEHOLDER, word))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaConfig {
    pub tokenizer: TokenizerConfig,
    pub languages: Vec<LanguageConfig>,
}

impl GlossaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Add or replace a language.
    pub fn with_language(mut self, language: LanguageConfig) -> Self {
        self.languages.retain(|l| l.code != language.code);
        self.languages.push(language);
        self
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GlossaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GlossaError::not_found(format!("config file {}", path.display()))
            } else {
                GlossaError::Io(e)
            }
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a configured language.
    pub fn language(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }

    /// The configured language, or a bare one using the default strategy.
    pub fn language_or_default(&self, code: &str) -> LanguageConfig {
        self.language(code)
            .cloned()
            .unwrap_or_else(|| LanguageConfig::new(code))
    }

    fn validate(&self) -> Result<()> {
        if self.tokenizer.analyzer_command.is_empty() {
            return Err(GlossaError::config("analyzer_command must not be empty"));
        }
        if self.tokenizer.decompress_command.is_empty() {
            return Err(GlossaError::config("decompress_command must not be empty"));
        }
        if let Some(language) = self.languages.iter().find(|l| l.code.trim().is_empty()) {
            return Err(GlossaError::config(format!(
                "language entry without a code: {language:?}"
            )));
        }
        for language in &self.languages {
            language.edict_encoding()?;
        }
        Ok(())
    }
}

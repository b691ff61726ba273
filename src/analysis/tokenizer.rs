//! Paragraph tokenizers and per-language dispatch.
//!
//! Three strategies are available:
//!
//! - [`alphabetic::AlphabeticTokenizer`] splits on whitespace and keys each
//!   word by its lower-cased letters.
//! - [`morphological::MorphologicalTokenizer`] runs an external analyzer and
//!   re-merges its tokens against a dictionary.
//! - [`greedy::GreedyTokenizer`] consumes the longest dictionary prefix at
//!   every position.
//!
//! [`tokenizer_for`] builds the right one from a [`LanguageConfig`].
//!
//! # Examples
//!
//! ```
//! use glossa::analysis::tokenizer::Tokenizer;
//! use glossa::analysis::tokenizer::alphabetic::AlphabeticTokenizer;
//!
//! let batch = AlphabeticTokenizer::new()
//!     .tokenize(&["The cat sat.".to_string()])
//!     .unwrap();
//! assert_eq!(batch.words.len(), 3);
//! assert_eq!(batch.paragraphs[0].len(), 4);
//! ```

use std::sync::Arc;

use log::debug;

use crate::analysis::mecab::MecabCommand;
use crate::analysis::segment::TokenizedBatch;
use crate::config::{LanguageConfig, Strategy, TokenizerConfig};
use crate::dictionary::cache::IndexCache;
use crate::dictionary::edict::EdictDictionary;
use crate::dictionary::entry::{EntryLookup, NoDictionary};
use crate::dictionary::store::DictionaryStore;
use crate::error::{GlossaError, Result};

/// Turns a batch of paragraphs into annotated segments.
///
/// Each call is independent; implementations hold no per-call state, so one
/// tokenizer may serve concurrent calls.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `paragraphs` in order.
    fn tokenize(&self, paragraphs: &[String]) -> Result<TokenizedBatch>;

    /// Name of the strategy.
    fn name(&self) -> &'static str;
}

/// Open the configured dictionary of `language`, if any.
pub fn open_store(
    language: &LanguageConfig,
    config: &TokenizerConfig,
    cache: Arc<IndexCache>,
) -> Result<Option<DictionaryStore>> {
    language
        .dictionary
        .as_ref()
        .map(|path| DictionaryStore::open(path, &config.dictionary_options(cache)))
        .transpose()
}

/// The lookup the merger disambiguates against: the EDICT lexicon when one
/// is configured, then the dictionary store, then nothing.
pub fn open_lookup(
    language: &LanguageConfig,
    config: &TokenizerConfig,
    cache: Arc<IndexCache>,
) -> Result<Arc<dyn EntryLookup>> {
    if let Some(path) = &language.edict {
        debug!("using EDICT lexicon {}", path.display());
        let encoding = language.edict_encoding()?;
        return Ok(Arc::new(EdictDictionary::open_with_encoding(path, encoding, false)?));
    }
    match open_store(language, config, cache)? {
        Some(store) => Ok(Arc::new(store)),
        None => Ok(Arc::new(NoDictionary)),
    }
}

/// Build the tokenizer for `language`.
pub fn tokenizer_for(
    language: &LanguageConfig,
    config: &TokenizerConfig,
    cache: Arc<IndexCache>,
) -> Result<Box<dyn Tokenizer>> {
    let strategy = language.strategy();
    debug!("tokenizing {} with the {strategy} strategy", language.code);

    match strategy {
        Strategy::Alphabetic => Ok(Box::new(alphabetic::AlphabeticTokenizer::new())),
        Strategy::Morphological => {
            let lookup = open_lookup(language, config, cache)?;
            let analyzer = MecabCommand::new(config.analyzer_command.clone());
            Ok(Box::new(
                morphological::MorphologicalTokenizer::new(Box::new(analyzer), lookup)
                    .with_options(config.merge_options()),
            ))
        }
        Strategy::Greedy => {
            let store = open_store(language, config, cache)?.ok_or_else(|| {
                GlossaError::config(format!(
                    "language {} uses greedy segmentation but has no dictionary",
                    language.code
                ))
            })?;
            Ok(Box::new(greedy::GreedyTokenizer::new(Arc::new(store))))
        }
    }
}

/// Tokenize `paragraphs` of `language` in one call.
pub fn tokenize(
    paragraphs: &[String],
    language: &LanguageConfig,
    config: &TokenizerConfig,
    cache: Arc<IndexCache>,
) -> Result<TokenizedBatch> {
    tokenizer_for(language, config, cache)?.tokenize(paragraphs)
}

pub mod alphabetic;
pub mod greedy;
pub mod morphological;

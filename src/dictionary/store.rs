//! Offline dictionary backed by an index/data file pair.
//!
//! # Examples
//!
//! ```no_run
//! use glossa::dictionary::DictionaryStore;
//!
//! let store = DictionaryStore::load("/usr/share/stardict/dic/jmdict-ja-en").unwrap();
//! for definition in store.lookup("猫") {
//!     println!("{definition}");
//! }
//! ```

use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::warn;

use crate::dictionary::cache::{IndexCache, global_index_cache};
use crate::dictionary::entry::{DictEntry, EntryLookup};
use crate::dictionary::files::{DataBlob, DictionaryFiles};
use crate::dictionary::index::DictionaryIndex;
use crate::error::{GlossaError, Result};

/// Default external utility used to expand `.dict.dz` files.
pub const DEFAULT_DECOMPRESS_COMMAND: &[&str] = &["dictunzip", "-d", "-k", "-c"];

/// Separator placed between homonym definitions by [`DictionaryStore::define`].
pub const DEFINITION_SEPARATOR: &str = "\n\n";

/// Options controlling how a store is opened.
#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// Program and leading arguments that expand a dictzip file to stdout.
    pub decompress_command: Vec<String>,
    /// Cache the parsed index is shared through.
    pub cache: Arc<IndexCache>,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        DictionaryOptions {
            decompress_command: DEFAULT_DECOMPRESS_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache: global_index_cache(),
        }
    }
}

impl DictionaryOptions {
    /// Set the decompression command.
    pub fn with_decompress_command(mut self, command: Vec<String>) -> Self {
        self.decompress_command = command;
        self
    }

    /// Use a private index cache instead of the global one.
    pub fn with_cache(mut self, cache: Arc<IndexCache>) -> Self {
        self.cache = cache;
        self
    }
}

/// A loaded dictionary.
///
/// The data blob is opened eagerly; the index is parsed on first use and
/// shared through the [`IndexCache`]. An index that cannot be read makes the
/// store behave like an empty dictionary; the failure is remembered, so the
/// file is not read again by this store.
#[derive(Debug)]
pub struct DictionaryStore {
    files: DictionaryFiles,
    data: DataBlob,
    cache: Arc<IndexCache>,
    unreadable: OnceLock<Arc<DictionaryIndex>>,
}

impl DictionaryStore {
    /// Open the dictionary at `path` with default options.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, &DictionaryOptions::default())
    }

    /// Open the dictionary at `path`.
    ///
    /// `path` may be the basename or any member file. Fails with
    /// [`GlossaError::NotFound`] when neither data variant exists.
    pub fn open<P: AsRef<Path>>(path: P, options: &DictionaryOptions) -> Result<Self> {
        let files = DictionaryFiles::locate(path.as_ref());
        let (data_path, variant) = files.data.clone().ok_or_else(|| {
            GlossaError::not_found(format!(
                "no .dict or .dict.dz file for dictionary {}",
                files.basename.display()
            ))
        })?;
        let data = DataBlob::open(&data_path, variant, &options.decompress_command)?;

        Ok(DictionaryStore {
            files,
            data,
            cache: Arc::clone(&options.cache),
            unreadable: OnceLock::new(),
        })
    }

    /// Paths this store was opened from.
    pub fn files(&self) -> &DictionaryFiles {
        &self.files
    }

    /// The parsed index, or an empty one if it cannot be read.
    pub fn index(&self) -> Arc<DictionaryIndex> {
        if let Some(empty) = self.unreadable.get() {
            return Arc::clone(empty);
        }
        match self.cache.load(&self.files.index) {
            Ok(index) => index,
            Err(e) => Arc::clone(self.unreadable.get_or_init(|| {
                warn!(
                    "dictionary index {} unavailable, treating the dictionary as empty: {e}",
                    self.files.index.display()
                );
                Arc::new(DictionaryIndex::default())
            })),
        }
    }

    /// All definitions for `key`, in index order.
    pub fn lookup(&self, key: &str) -> Vec<String> {
        let index = self.index();
        index
            .matching(key.as_bytes())
            .iter()
            .filter_map(|entry| match self.data.slice(entry.offset, entry.size) {
                Some(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                None => {
                    warn!(
                        "definition of {key:?} at {}+{} lies outside the data file",
                        entry.offset, entry.size
                    );
                    None
                }
            })
            .collect()
    }

    /// Whether `key` is a registered headword.
    pub fn contains(&self, key: &str) -> bool {
        self.index().contains(key.as_bytes())
    }

    /// Longest registered headword that is a prefix of `key`.
    pub fn longest_prefix(&self, key: &str) -> Option<String> {
        self.index().longest_prefix(key)
    }

    /// All definitions for `key` joined by a blank line, or `None`.
    pub fn define(&self, key: &str) -> Option<String> {
        let definitions = self.lookup(key);
        if definitions.is_empty() {
            None
        } else {
            Some(definitions.join(DEFINITION_SEPARATOR))
        }
    }

    /// Generic entry accessor: `(key, no reading, definition text)`.
    ///
    /// Returns `None` for keys that are not UTF-8 text or not registered.
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<DictEntry> {
        let key = std::str::from_utf8(key.as_ref()).ok()?;
        if !self.contains(key) {
            return None;
        }
        let definition = self.define(key)?;
        Some(DictEntry::new(key, None, definition))
    }
}

/// One entry per homonym record, so each sense is weighed on its own when
/// merge candidates are resolved.
impl EntryLookup for DictionaryStore {
    fn entries(&self, key: &str) -> Vec<DictEntry> {
        self.lookup(key)
            .into_iter()
            .map(|definition| DictEntry::new(key, None, definition))
            .collect()
    }

    fn has_entries(&self, key: &str) -> bool {
        self.contains(key)
    }
}

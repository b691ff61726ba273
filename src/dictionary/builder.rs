//! Writer for StarDict-style index/data pairs.

use std::fs;
use std::path::Path;

use crate::dictionary::files::{DictionaryFiles, INDEX_SUFFIX, INFO_SUFFIX, with_suffix};
use crate::dictionary::index::{DictionaryIndexEntry, encode_entries};
use crate::error::{GlossaError, Result};

/// Builder collecting `(key, definition)` pairs.
///
/// Pairs sharing a key are written as separate homonym records, in the
/// order they were added.
#[derive(Debug, Clone, Default)]
pub struct DictionaryBuilder {
    name: String,
    entries: Vec<(String, String)>,
}

impl DictionaryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the book name recorded in the `.ifo` file.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Add a definition for `key`.
    pub fn add_entry<K, D>(&mut self, key: K, definition: D) -> &mut Self
    where
        K: Into<String>,
        D: Into<String>,
    {
        self.entries.push((key.into(), definition.into()));
        self
    }

    /// Get the current number of definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode into `(index bytes, data bytes)`.
    pub fn encode(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut data = Vec::new();
        let mut records = Vec::with_capacity(self.entries.len());

        for (key, definition) in &self.entries {
            if key.is_empty() || key.contains('\0') {
                return Err(GlossaError::format(format!(
                    "dictionary key {key:?} is empty or contains NUL"
                )));
            }
            let offset = u32::try_from(data.len())
                .map_err(|_| GlossaError::format("dictionary data exceeds 4 GiB"))?;
            let size = u32::try_from(definition.len())
                .map_err(|_| GlossaError::format("definition exceeds 4 GiB"))?;
            data.extend_from_slice(definition.as_bytes());
            records.push(DictionaryIndexEntry::new(key.as_bytes(), offset, size));
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok((encode_entries(&records), data))
    }

    /// Write `.idx`, `.dict` and `.ifo` files next to `basename`.
    pub fn write(&self, basename: &Path) -> Result<DictionaryFiles> {
        let (index, data) = self.encode()?;
        fs::write(with_suffix(basename, ".dict"), &data)?;
        fs::write(with_suffix(basename, INDEX_SUFFIX), &index)?;

        let distinct = {
            let mut keys: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
            keys.sort_unstable();
            keys.dedup();
            keys.len()
        };
        let info = format!(
            "StarDict's dict ifo file\nversion=2.4.2\nwordcount={}\nidxfilesize={}\nbookname={}\n",
            distinct,
            index.len(),
            self.name
        );
        fs::write(with_suffix(basename, INFO_SUFFIX), info)?;

        Ok(DictionaryFiles::locate(basename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::index::DictionaryIndex;
    use tempfile::TempDir;

    #[test]
    fn test_encode_sorts_index_and_keeps_offsets() {
        let mut builder = DictionaryBuilder::new();
        builder.add_entry("zebra", "striped").add_entry("ant", "small");

        let (index, data) = builder.encode().unwrap();
        let parsed = DictionaryIndex::parse(&index).unwrap();

        let first = &parsed.entries()[0];
        assert_eq!(first.key, b"ant");
        let start = first.offset as usize;
        assert_eq!(&data[start..start + first.size as usize], b"small");
    }

    #[test]
    fn test_rejects_bad_keys() {
        let mut builder = DictionaryBuilder::new();
        builder.add_entry("", "nothing");
        assert!(builder.encode().is_err());

        let mut builder = DictionaryBuilder::new();
        builder.add_entry("a\0b", "nul");
        assert!(builder.encode().is_err());
    }

    #[test]
    fn test_write_creates_trio() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("tiny");
        let mut builder = DictionaryBuilder::new().with_name("tiny");
        builder.add_entry("cat", "a feline").add_entry("cat", "a jazz musician");

        let files = builder.write(&base).unwrap();
        assert!(files.index.is_file());
        assert!(files.info.is_file());
        assert!(files.data.is_some());

        let info = fs::read_to_string(&files.info).unwrap();
        assert!(info.contains("wordcount=1"));
        assert!(info.contains("bookname=tiny"));
    }
}

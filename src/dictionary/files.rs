//! Dictionary file discovery and data blob access.
//!
//! A dictionary is a trio of files sharing a basename: `.ifo` metadata, the
//! `.idx` index and the definition data, either plain (`.dict`) or dictzip
//! compressed (`.dict.dz`). Variants are recognised through explicit suffix
//! tables scanned in order.

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;
use memmap2::{Mmap, MmapOptions};

use crate::error::{GlossaError, Result};

/// Metadata file suffix.
pub const INFO_SUFFIX: &str = ".ifo";

/// Index file suffix.
pub const INDEX_SUFFIX: &str = ".idx";

/// How a data file variant is turned into readable bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataVariant {
    /// Uncompressed, mapped directly.
    Plain,
    /// Dictzip compressed, expanded once into a temporary file.
    Dictzip,
}

/// Data file variants in order of preference.
pub const DATA_VARIANTS: &[(&str, DataVariant)] = &[
    (".dict", DataVariant::Plain),
    (".dict.dz", DataVariant::Dictzip),
];

/// Every suffix that may be given in place of the bare basename, longest
/// first.
const KNOWN_SUFFIXES: &[&str] = &[".dict.dz", ".dict", INDEX_SUFFIX, INFO_SUFFIX];

/// Append `suffix` to the final path component.
pub fn with_suffix(basename: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = basename.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Strip a recognised dictionary suffix, if any.
pub fn basename_of(path: &Path) -> PathBuf {
    if let Some(text) = path.to_str() {
        for suffix in KNOWN_SUFFIXES {
            if let Some(stem) = text.strip_suffix(suffix) {
                if !stem.is_empty() {
                    return PathBuf::from(stem);
                }
            }
        }
    }
    path.to_path_buf()
}

/// Resolved paths of one dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryFiles {
    /// Shared basename.
    pub basename: PathBuf,
    /// `.ifo` path (may not exist).
    pub info: PathBuf,
    /// `.idx` path (may not exist).
    pub index: PathBuf,
    /// First data variant that exists on disk.
    pub data: Option<(PathBuf, DataVariant)>,
}

impl DictionaryFiles {
    /// Resolve the file trio for `path`, which may be the basename or any of
    /// the member files.
    pub fn locate(path: &Path) -> Self {
        let basename = basename_of(path);
        let data = DATA_VARIANTS.iter().find_map(|(suffix, variant)| {
            let candidate = with_suffix(&basename, suffix);
            candidate.is_file().then_some((candidate, *variant))
        });

        DictionaryFiles {
            info: with_suffix(&basename, INFO_SUFFIX),
            index: with_suffix(&basename, INDEX_SUFFIX),
            basename,
            data,
        }
    }
}

/// Read-only view of a dictionary's definition bytes.
#[derive(Debug)]
pub enum DataBlob {
    /// A memory-mapped file. For dictzip data the file is an anonymous
    /// temporary file that disappears once this value is dropped.
    Mapped {
        /// The mapping.
        map: Mmap,
        /// Backing file, kept open for the lifetime of the mapping.
        file: File,
    },
    /// A zero-length data file.
    Empty,
}

impl DataBlob {
    /// Open the data file of the given variant.
    pub fn open(path: &Path, variant: DataVariant, decompress_command: &[String]) -> Result<Self> {
        let file = match variant {
            DataVariant::Plain => File::open(path)?,
            DataVariant::Dictzip => decompress(path, decompress_command)?,
        };
        Self::map(file)
    }

    fn map(file: File) -> Result<Self> {
        if file.metadata()?.len() == 0 {
            return Ok(DataBlob::Empty);
        }
        // The data files are never written while a store is alive.
        let map = unsafe { MmapOptions::new().map(&file)? };
        Ok(DataBlob::Mapped { map, file })
    }

    /// All bytes of the blob.
    pub fn bytes(&self) -> &[u8] {
        match self {
            DataBlob::Mapped { map, .. } => &map[..],
            DataBlob::Empty => &[],
        }
    }

    /// Exactly `size` bytes at `offset`, or `None` when out of range.
    pub fn slice(&self, offset: u32, size: u32) -> Option<&[u8]> {
        let start = offset as usize;
        let end = start.checked_add(size as usize)?;
        self.bytes().get(start..end)
    }
}

/// Expand a dictzip file into an anonymous temporary file with the
/// configured external utility (its arguments are followed by the path and
/// it must write the expanded data to stdout).
fn decompress(path: &Path, command: &[String]) -> Result<File> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| GlossaError::config("decompress command is empty"))?;

    let out = tempfile::tempfile()?;
    debug!("expanding {} with {}", path.display(), program);
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(out.try_clone()?))
        .stderr(Stdio::null())
        .status()?;

    if !status.success() {
        return Err(GlossaError::Io(io::Error::other(format!(
            "{program} failed on {}: {status}",
            path.display()
        ))));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_basename_of_strips_known_suffixes() {
        assert_eq!(basename_of(Path::new("/d/jmdict.idx")), PathBuf::from("/d/jmdict"));
        assert_eq!(basename_of(Path::new("/d/jmdict.dict.dz")), PathBuf::from("/d/jmdict"));
        assert_eq!(basename_of(Path::new("/d/jmdict.dict")), PathBuf::from("/d/jmdict"));
        assert_eq!(basename_of(Path::new("/d/jmdict.ifo")), PathBuf::from("/d/jmdict"));
        assert_eq!(basename_of(Path::new("/d/jmdict")), PathBuf::from("/d/jmdict"));
        assert_eq!(basename_of(Path::new("/d/jmdict.txt")), PathBuf::from("/d/jmdict.txt"));
    }

    #[test]
    fn test_locate_prefers_plain_data() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("dict");
        fs::write(with_suffix(&base, ".dict"), b"plain").unwrap();
        fs::write(with_suffix(&base, ".dict.dz"), b"packed").unwrap();

        let files = DictionaryFiles::locate(&with_suffix(&base, ".idx"));
        assert_eq!(files.basename, base);
        assert_eq!(files.index, with_suffix(&base, ".idx"));
        assert_eq!(
            files.data,
            Some((with_suffix(&base, ".dict"), DataVariant::Plain))
        );
    }

    #[test]
    fn test_locate_falls_back_to_dictzip() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("dict");
        fs::write(with_suffix(&base, ".dict.dz"), b"packed").unwrap();

        let files = DictionaryFiles::locate(&base);
        assert_eq!(
            files.data,
            Some((with_suffix(&base, ".dict.dz"), DataVariant::Dictzip))
        );
    }

    #[test]
    fn test_locate_without_data() {
        let dir = TempDir::new().unwrap();
        let files = DictionaryFiles::locate(&dir.path().join("none"));
        assert!(files.data.is_none());
    }

    #[test]
    fn test_blob_slice_bounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.dict");
        fs::write(&path, b"hello world").unwrap();

        let blob = DataBlob::open(&path, DataVariant::Plain, &[]).unwrap();
        assert_eq!(blob.slice(6, 5), Some(&b"world"[..]));
        assert_eq!(blob.slice(6, 6), None);
        assert_eq!(blob.slice(u32::MAX, 2), None);
    }

    #[test]
    fn test_empty_data_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.dict");
        fs::write(&path, b"").unwrap();

        let blob = DataBlob::open(&path, DataVariant::Plain, &[]).unwrap();
        assert!(blob.bytes().is_empty());
        assert_eq!(blob.slice(0, 0), Some(&b""[..]));
    }

    #[cfg(unix)]
    #[test]
    fn test_dictzip_uses_external_command() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.dict.dz");
        fs::write(&path, b"expanded bytes").unwrap();

        let command = vec!["cat".to_string()];
        let blob = DataBlob::open(&path, DataVariant::Dictzip, &command).unwrap();
        assert_eq!(blob.bytes(), b"expanded bytes");
    }

    #[cfg(unix)]
    #[test]
    fn test_dictzip_failure_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.dict.dz");
        fs::write(&path, b"data").unwrap();

        let command = vec!["false".to_string()];
        let err = DataBlob::open(&path, DataVariant::Dictzip, &command).unwrap_err();
        assert!(matches!(err, GlossaError::Io(_)));

        let command = vec!["glossa-no-such-decompressor".to_string()];
        let err = DataBlob::open(&path, DataVariant::Dictzip, &command).unwrap_err();
        assert!(matches!(err, GlossaError::Io(_)));
    }
}

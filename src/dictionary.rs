//! Offline dictionaries.
//!
//! [`DictionaryStore`] reads StarDict-style index/data pairs and answers
//! exact, membership and longest-prefix queries. [`EdictDictionary`] is an
//! in-memory alternative for EDICT text files. Both implement
//! [`EntryLookup`], the interface the token merger disambiguates against.

pub mod builder;
pub mod cache;
pub mod edict;
pub mod entry;
pub mod files;
pub mod index;
pub mod store;

pub use builder::DictionaryBuilder;
pub use cache::{DEFAULT_INDEX_CACHE_CAPACITY, IndexCache, global_index_cache};
pub use edict::EdictDictionary;
pub use entry::{DictEntry, EntryLookup, NoDictionary};
pub use files::{DataVariant, DictionaryFiles};
pub use index::{DictionaryIndex, DictionaryIndexEntry};
pub use store::{DictionaryOptions, DictionaryStore};

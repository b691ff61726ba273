//! # Glossa
//!
//! Dictionary-backed multilingual tokenization for language-learning
//! readers.
//!
//! ## Features
//!
//! - StarDict-style index/data dictionaries with exact, membership and
//!   longest-prefix lookups
//! - Morphological analysis through an external MeCab-compatible process,
//!   with conjugation merging and dictionary-assisted re-segmentation
//! - Alphabetic, morphological and dictionary-greedy segmentation
//!   strategies selected per language
//! - Annotated HTML rendering and context snippet extraction
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use glossa::analysis::tokenize;
//! use glossa::config::{LanguageConfig, TokenizerConfig};
//! use glossa::dictionary::IndexCache;
//! use glossa::render::render_batch;
//!
//! let batch = tokenize(
//!     &["The cat sat.".to_string()],
//!     &LanguageConfig::new("eng"),
//!     &TokenizerConfig::default(),
//!     Arc::new(IndexCache::default()),
//! )
//! .unwrap();
//!
//! assert!(batch.words.contains("cat"));
//! assert!(render_batch(&batch).starts_with("<p><span data-src=\"the\">The</span>"));
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod knowledge;
pub mod render;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

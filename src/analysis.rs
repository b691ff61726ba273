//! Text analysis: morphological tokens, the analyzer channel, token merging
//! and the per-language tokenizers built on them.

pub mod kana;
pub mod mecab;
pub mod merger;
pub mod morph;
pub mod segment;
pub mod tokenizer;
pub mod worker;

pub use mecab::{AnalyzerFactory, MecabCommand, MorphAnalysisChannel, MorphAnalyzer};
pub use merger::{MergeOptions, TokenMerger, resolve};
pub use morph::MorphToken;
pub use segment::{AnnotatedSegment, TokenizedBatch, paragraph_text};
pub use tokenizer::{Tokenizer, tokenize, tokenizer_for};

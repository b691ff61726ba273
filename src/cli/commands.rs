//! Command implementations for the Glossa CLI.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::analysis::tokenizer::{open_store, tokenizer_for};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{GlossaConfig, LanguageConfig};
use crate::context::ContextExtractor;
use crate::dictionary::cache::IndexCache;
use crate::dictionary::store::DictionaryStore;
use crate::error::{GlossaError, Result};
use crate::render::render_batch;

/// Execute a CLI command.
pub fn execute_command(args: GlossaArgs) -> Result<()> {
    let config = load_config(&args)?;
    let cache = config.tokenizer.index_cache();

    match &args.command {
        Command::Tokenize(tokenize_args) => tokenize_file(tokenize_args, &args, &config, cache),
        Command::Define(define_args) => define_word(define_args, &args, &config, cache),
        Command::Prefix(prefix_args) => longest_prefix(prefix_args, &args, &config, cache),
        Command::Context(context_args) => show_context(context_args, &args, &config, cache),
    }
}

/// Load the configuration named on the command line, or the defaults.
pub fn load_config(args: &GlossaArgs) -> Result<GlossaConfig> {
    match &args.config {
        Some(path) => {
            debug!("loading configuration from {}", path.display());
            GlossaConfig::from_file(path)
        }
        None => Ok(GlossaConfig::default()),
    }
}

/// Split text into paragraphs at blank lines. Lines inside a paragraph are
/// joined with a space.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

/// Read a text file as paragraphs.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(split_paragraphs(&text))
}

fn require_store(
    language: &LanguageConfig,
    config: &GlossaConfig,
    cache: Arc<IndexCache>,
) -> Result<DictionaryStore> {
    open_store(language, &config.tokenizer, cache)?.ok_or_else(|| {
        GlossaError::config(format!("no dictionary configured for language {}", language.code))
    })
}

/// Tokenize a file.
fn tokenize_file(
    args: &TokenizeArgs,
    cli_args: &GlossaArgs,
    config: &GlossaConfig,
    cache: Arc<IndexCache>,
) -> Result<()> {
    let language = config.language_or_default(&args.language);
    let paragraphs = read_paragraphs(&args.file)?;
    info!("tokenizing {} paragraphs of {}", paragraphs.len(), args.file.display());

    let tokenizer = tokenizer_for(&language, &config.tokenizer, cache)?;
    let batch = tokenizer.tokenize(&paragraphs)?;

    let html = args.html.then(|| render_batch(&batch));
    let result = TokenizeResult {
        language: language.code.clone(),
        strategy: tokenizer.name().to_string(),
        words: batch.words.into_iter().collect(),
        paragraphs: batch.paragraphs,
        html,
    };
    output_result(&result, cli_args)
}

/// Look up a word.
fn define_word(
    args: &DefineArgs,
    cli_args: &GlossaArgs,
    config: &GlossaConfig,
    cache: Arc<IndexCache>,
) -> Result<()> {
    let language = config.language_or_default(&args.language);
    let store = require_store(&language, config, cache)?;

    let result = DefineResult {
        language: language.code.clone(),
        word: args.word.clone(),
        text: store.define(&args.word),
        dict_url: language.dict_url_for(&args.word),
    };
    output_result(&result, cli_args)
}

/// Longest dictionary prefix of a text.
fn longest_prefix(
    args: &PrefixArgs,
    cli_args: &GlossaArgs,
    config: &GlossaConfig,
    cache: Arc<IndexCache>,
) -> Result<()> {
    let language = config.language_or_default(&args.language);
    let store = require_store(&language, config, cache)?;

    let result = PrefixResult {
        language: language.code.clone(),
        text: args.text.clone(),
        prefix: store.longest_prefix(&args.text),
    };
    output_result(&result, cli_args)
}

/// Context of a word in a file.
fn show_context(
    args: &ContextArgs,
    cli_args: &GlossaArgs,
    config: &GlossaConfig,
    cache: Arc<IndexCache>,
) -> Result<()> {
    let language = config.language_or_default(&args.language);
    let paragraphs = read_paragraphs(&args.file)?;
    let batch = tokenizer_for(&language, &config.tokenizer, cache)?.tokenize(&paragraphs)?;

    let extractor = ContextExtractor::new().with_max_untrimmed(args.max_untrimmed);
    let found = batch
        .paragraphs
        .iter()
        .enumerate()
        .find_map(|(i, segments)| extractor.extract(&args.word, segments).map(|c| (i, c)));

    let result = ContextResult {
        language: language.code.clone(),
        word: args.word.clone(),
        paragraph: found.as_ref().map(|(i, _)| *i),
        context: found.map(|(_, context)| context),
    };
    output_result(&result, cli_args)
}

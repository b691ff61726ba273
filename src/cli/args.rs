//! Command line argument parsing for the Glossa CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Glossa - dictionary-backed multilingual tokenizer
#[derive(Parser, Debug, Clone)]
#[command(name = "glossa")]
#[command(about = "Segment text into dictionary words, look them up and extract context")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct GlossaArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG", env = "GLOSSA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl GlossaArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Tokenize the paragraphs of a text file
    Tokenize(TokenizeArgs),

    /// Look a word up in the language's dictionary
    Define(DefineArgs),

    /// Find the longest dictionary word at the start of a text
    Prefix(PrefixArgs),

    /// Show a word in context
    Context(ContextArgs),
}

/// Arguments for tokenizing a file
#[derive(Parser, Debug, Clone)]
pub struct TokenizeArgs {
    /// Language code (e.g. eng, jpn, zho)
    #[arg(value_name = "LANG")]
    pub language: String,

    /// Text file; paragraphs are separated by blank lines
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print rendered HTML instead of segment lists
    #[arg(long)]
    pub html: bool,
}

/// Arguments for dictionary lookups
#[derive(Parser, Debug, Clone)]
pub struct DefineArgs {
    /// Language code
    #[arg(value_name = "LANG")]
    pub language: String,

    /// Word to look up
    #[arg(value_name = "WORD")]
    pub word: String,
}

/// Arguments for longest-prefix queries
#[derive(Parser, Debug, Clone)]
pub struct PrefixArgs {
    /// Language code
    #[arg(value_name = "LANG")]
    pub language: String,

    /// Text whose longest dictionary prefix is wanted
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Arguments for context extraction
#[derive(Parser, Debug, Clone)]
pub struct ContextArgs {
    /// Language code
    #[arg(value_name = "LANG")]
    pub language: String,

    /// Word (lookup key) to find
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Text file; paragraphs are separated by blank lines
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Paragraphs up to this many characters are shown whole
    #[arg(long, default_value = "30")]
    pub max_untrimmed: usize,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

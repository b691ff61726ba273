//! Output formatting for CLI commands.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::analysis::segment::{AnnotatedSegment, paragraph_text};
use crate::cli::args::{GlossaArgs, OutputFormat};
use crate::error::Result;

/// Result of tokenizing a file.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenizeResult {
    pub language: String,
    pub strategy: String,
    pub words: Vec<String>,
    pub paragraphs: Vec<Vec<AnnotatedSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Result of a dictionary lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct DefineResult {
    pub language: String,
    pub word: String,
    pub text: Option<String>,
    pub dict_url: Option<String>,
}

/// Result of a longest-prefix query.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrefixResult {
    pub language: String,
    pub text: String,
    pub prefix: Option<String>,
}

/// Result of a context query.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContextResult {
    pub language: String,
    pub word: String,
    pub paragraph: Option<usize>,
    pub context: Option<String>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl HumanOutput for TokenizeResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        if let Some(html) = &self.html {
            return writeln!(out, "{html}");
        }
        writeln!(out, "Strategy: {} ({})", self.strategy, self.language)?;
        writeln!(out, "Distinct words: {}", self.words.len())?;
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "[{}] {}", i + 1, paragraph_text(paragraph))?;
            for segment in paragraph.iter().filter(|s| s.is_keyed()) {
                writeln!(
                    out,
                    "    {}\t{}",
                    segment.text,
                    segment.dict_key.as_deref().unwrap_or_default()
                )?;
            }
        }
        Ok(())
    }
}

impl HumanOutput for DefineResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        match &self.text {
            Some(text) => writeln!(out, "{text}")?,
            None => writeln!(out, "No results for '{}'", self.word)?,
        }
        if let Some(url) = &self.dict_url {
            writeln!(out)?;
            writeln!(out, "See also: {url}")?;
        }
        Ok(())
    }
}

impl HumanOutput for PrefixResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        match &self.prefix {
            Some(prefix) => writeln!(out, "{prefix}"),
            None => writeln!(out, "No dictionary word starts '{}'", self.text),
        }
    }
}

impl HumanOutput for ContextResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        match (&self.context, self.paragraph) {
            (Some(context), Some(paragraph)) => writeln!(out, "[{}] {context}", paragraph + 1),
            _ => writeln!(out, "'{}' does not occur in the text", self.word),
        }
    }
}

/// Write `result` in `format`.
pub fn write_result<T, W>(out: &mut W, result: &T, format: OutputFormat, pretty: bool) -> Result<()>
where
    T: Serialize + HumanOutput,
    W: Write,
{
    match format {
        OutputFormat::Human => result.write_human(out)?,
        OutputFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut *out, result)?;
            } else {
                serde_json::to_writer(&mut *out, result)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Output a result to stdout in the format selected on the command line.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &GlossaArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, args.output_format, args.pretty)
}

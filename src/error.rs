//! Error types for the Glossa library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`GlossaError`] enum. Query-side dictionary operations never fail; they
//! behave like an empty dictionary instead.
//!
//! # Examples
//!
//! ```
//! use glossa::error::{GlossaError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(GlossaError::config("analyzer output has no base form column"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Glossa operations.
#[derive(Error, Debug)]
pub enum GlossaError {
    /// I/O errors (opening, decompressing or mapping dictionary files, pipes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fatal configuration errors (missing analyzer binary, failed calibration)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised while talking to the morphological analyzer
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Malformed input data
    #[error("Format error: {0}")]
    Format(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with GlossaError.
pub type Result<T> = std::result::Result<T, GlossaError>;

impl GlossaError {
    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        GlossaError::NotFound(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GlossaError::Config(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        GlossaError::Analysis(msg.into())
    }

    /// Create a new format error.
    pub fn format<S: Into<String>>(msg: S) -> Self {
        GlossaError::Format(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        GlossaError::Other(msg.into())
    }

    /// Returns true if this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            GlossaError::NotFound(_) => true,
            GlossaError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

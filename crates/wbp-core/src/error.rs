//! Error types for the wbp-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the wbp library.
#[derive(Error, Debug)]
pub enum WbpError {
    /// Source document loading error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// JSON export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to locating and reading source documents.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Grant period outside the supported range.
    #[error("invalid grant period: {0} (expected 1-5)")]
    InvalidGrantPeriod(u8),

    /// No file matched the source pattern for a grant period.
    #[error("no source file for GP{grant_period} matching {pattern}")]
    NotFound { grant_period: u8, pattern: String },

    /// The source pattern itself is malformed.
    #[error("invalid source pattern {pattern}: {reason}")]
    Pattern { pattern: String, reason: String },

    /// The file exists but could not be read as UTF-8 text.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to writing JSON artifacts.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Serialization failed.
    #[error("failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the artifact failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the wbp library.
pub type Result<T> = std::result::Result<T, WbpError>;

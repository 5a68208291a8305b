//! Error types for civicstream

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for civicstream operations
pub type Result<T> = std::result::Result<T, CivicError>;

/// Violations of the CSV quoting grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// A quote character appeared inside an unquoted field
    UnexpectedQuote,
    /// Something other than quote, delimiter or line terminator followed a closing quote
    InvalidAfterClosingQuote(char),
    /// The stream ended while a quoted field was still open
    EofInQuotedField,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatErrorKind::UnexpectedQuote => write!(f, "unexpected quote in unquoted field"),
            FormatErrorKind::InvalidAfterClosingQuote(c) => write!(
                f,
                "invalid character {:?} immediately following a closing quote",
                c
            ),
            FormatErrorKind::EofInQuotedField => write!(f, "end of file inside quoted field"),
        }
    }
}

/// Main error type for civicstream
#[derive(Error, Debug)]
pub enum CivicError {
    /// A named file could not be opened or read
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error without file context (in-memory readers, stdout)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input does not conform to the CSV quoting grammar
    #[error("Malformed CSV at row {row} (byte {offset}): {kind}")]
    Format {
        kind: FormatErrorKind,
        row: u64,
        offset: u64,
    },

    /// JSON source could not be decoded
    #[error("Failed to parse JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Data source has an extension no loader understands
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Bad command-line configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CivicError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CivicError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for quoting-grammar violations, false for I/O and everything else
    pub fn is_format_error(&self) -> bool {
        matches!(self, CivicError::Format { .. })
    }

    /// Grammar violation kind, if this is a format error
    pub fn format_kind(&self) -> Option<FormatErrorKind> {
        match self {
            CivicError::Format { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

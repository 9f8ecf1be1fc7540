//! Error types that can be emitted from this library

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::validate::ValidationError;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// A directory field failed a sanity check
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The data is not in the format a parser expected
    #[error("not a {0} file")]
    FormatMismatch(String),

    /// The data starts like a known format but its structure is broken
    #[error("malformed {format} data: {reason}")]
    Malformed { format: &'static str, reason: String },

    /// A read would run past the end of the data
    #[error("unexpected end of data: {requested} bytes requested at offset {offset}")]
    UnexpectedEof { offset: u64, requested: u64 },

    /// An exporter could not produce the bytes of a resource
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Transparent wrapper for [`arcx_etc::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Texture(#[from] arcx_etc::Error),

    /// The external decompression tool cannot be run
    #[error("external tool `{0}` is unavailable")]
    #[diagnostic(help("set `tool.program` in arcx.toml to a working executable"))]
    ToolUnavailable(String),

    /// No registered format accepted the file
    #[error("no registered format recognised {}", .0.display())]
    NoMatchingFormat(PathBuf),

    /// A format id was requested that no plugin registered
    #[error("no format plugin with id `{0}`")]
    UnknownPlugin(String),

    /// Two plugins tried to register under the same id
    #[error("a format plugin with id `{0}` is already registered")]
    DuplicatePlugin(String),

    /// A resource name would be written outside the output directory
    #[error("`{0}` escapes the output directory")]
    PathEscape(String),

    /// A filter pattern does not apply to its column
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Transparent wrapper for [`regex::Error`]
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("unable to serialize configuration")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The operation was cancelled before it finished
    #[error("operation was cancelled")]
    Cancelled,

    /// Another long running task holds the task gate
    #[error("another task is already running")]
    Busy,
}

impl Error {
    /// Whether the error means "this parser does not apply" rather than a broken environment
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Error::FormatMismatch(_)
                | Error::Malformed { .. }
                | Error::Validation(_)
                | Error::UnexpectedEof { .. }
        )
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

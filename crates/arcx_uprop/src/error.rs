//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] arcx_core::Error),

    #[error(transparent)]
    Utf16Error(#[from] widestring::error::Utf16Error),

    /// A name reference points outside the names table
    #[error("name index {index} is outside the names table ({len} names)")]
    NameIndex { index: u64, len: usize },

    #[error("string is not terminated by a null character")]
    MissingTerminator,

    #[error("string ends in a null character where none is expected")]
    UnexpectedTerminator,

    /// Nesting went deeper than the configured limit
    #[error("properties nested deeper than {limit} levels")]
    #[diagnostic(help("raise `max_property_depth` in the [limits] table if the data is genuine"))]
    DepthExceeded { limit: usize },

    /// A property payload does not fit what remains of the stream
    #[error("property `{name}` declares {length} bytes, only {remaining} remain")]
    PayloadPastEnd {
        name: String,
        length: u64,
        remaining: u64,
    },

    /// Array elements of this type have no known size
    #[error("cannot split an array of `{0}`")]
    UnsplittableArray(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

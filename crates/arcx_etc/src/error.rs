//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::{BlockFormat, Mode};

/// Error type for library
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum Error {
    /// The block is valid but its mode was excluded by the caller
    #[error("{format} block in {mode} mode was declined")]
    Declined { format: BlockFormat, mode: Mode },

    /// Input slice does not have the size of one block
    #[error("expected a {expected} byte block, got {actual} bytes")]
    InvalidBlockLength { expected: usize, actual: usize },

    /// Image data is shorter than its dimensions require
    #[error("image needs {expected} bytes of block data, got {actual}")]
    TruncatedImage { expected: usize, actual: usize },

    /// Block `index` of an image was declined
    #[error("block {index} of the image could not be decoded")]
    #[diagnostic(help("the texture may use a mode its format does not allow"))]
    ImageBlock {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

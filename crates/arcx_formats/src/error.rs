//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`arcx_core::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] arcx_core::Error),

    /// Transparent wrapper for [`arcx_core::validate::ValidationError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] arcx_core::validate::ValidationError),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// A compressed directory block could not be inflated
    #[error("unable to inflate the {block} block")]
    Inflate {
        block: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A directory block holds fewer bytes than its entries need
    #[error("{block} block holds {actual} bytes, {expected} expected")]
    ShortBlock {
        block: &'static str,
        expected: u64,
        actual: u64,
    },

    /// A record points outside the name block
    #[error("name offset {offset} is outside the {len} byte name block")]
    NameOffset { offset: u32, len: usize },

    /// The texture header names a layout that cannot be decoded
    #[error("unsupported texture format {format} in version {version}")]
    UnsupportedTexture { version: String, format: u16 },

    /// Padded and real texture sizes disagree on the number of blocks
    #[error("padded size {padded_width}x{padded_height} does not cover {width}x{height}")]
    PaddedSize {
        padded_width: u16,
        padded_height: u16,
        width: u16,
        height: u16,
    },
}

impl Error {
    /// Convert into the error a format plugin reports, naming the format
    pub fn into_core(self, format: &'static str) -> arcx_core::Error {
        match self {
            Error::Core(error) => error,
            Error::Validation(error) => arcx_core::Error::Validation(error),
            Error::BinRWError(binrw::Error::BadMagic { .. }) => {
                arcx_core::Error::FormatMismatch(format.to_owned())
            }
            other => arcx_core::Error::Malformed {
                format,
                reason: other.to_string(),
            },
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

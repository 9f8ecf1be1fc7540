//! Sanity checks for directory fields.
//!
//! Parsers run these right after reading a field and before seeking to or allocating for it,
//! so a malformed archive is rejected instead of producing garbage entries.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::Limits;

/// Reason a directory field was rejected
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is negative ({value})")]
    Negative { field: &'static str, value: i64 },

    #[error("offset {offset} lies outside the archive ({size} bytes)")]
    OffsetOutOfRange { offset: u64, size: u64 },

    #[error("length {length} exceeds the archive size ({size} bytes)")]
    LengthOutOfRange { length: u64, size: u64 },

    #[error("{length} bytes at offset {offset} run past the end of the archive ({size} bytes)")]
    LengthPastEnd { length: u64, offset: u64, size: u64 },

    #[error("filename length {length} is outside 1..={max}")]
    FilenameLength { length: u64, max: u64 },

    #[error("unsupported color depth of {0} bits")]
    ColorDepth(u32),

    #[error("image dimensions {width}x{height} are outside 1..={max}")]
    Dimensions { width: u64, height: u64, max: u64 },

    #[error("count {count} exceeds the maximum of {max}")]
    Count { count: u64, max: u64 },
}

/// Result of a single check
pub type Validation = core::result::Result<(), ValidationError>;

/// Convert a signed field to unsigned, rejecting negative values
pub fn non_negative(field: &'static str, value: i64) -> core::result::Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::Negative { field, value })
}

/// `0 <= offset <= archive_size`
pub fn offset_in_range(offset: u64, archive_size: u64) -> Validation {
    if offset > archive_size {
        return Err(ValidationError::OffsetOutOfRange {
            offset,
            size: archive_size,
        });
    }
    Ok(())
}

/// A length no larger than the archive itself
pub fn length_in_range(length: u64, archive_size: u64) -> Validation {
    if length > archive_size {
        return Err(ValidationError::LengthOutOfRange {
            length,
            size: archive_size,
        });
    }
    Ok(())
}

/// `offset + length <= archive_size`, without overflowing
pub fn length_fits(length: u64, offset: u64, archive_size: u64) -> Validation {
    match offset.checked_add(length) {
        Some(end) if end <= archive_size => Ok(()),
        _ => Err(ValidationError::LengthPastEnd {
            length,
            offset,
            size: archive_size,
        }),
    }
}

pub fn filename_length_in_range(length: u64, limits: &Limits) -> Validation {
    if length == 0 || length > limits.max_filename_length {
        return Err(ValidationError::FilenameLength {
            length,
            max: limits.max_filename_length,
        });
    }
    Ok(())
}

/// Bits per pixel of a paletted or direct color image
pub fn color_depth_in_range(bits: u32) -> Validation {
    match bits {
        1 | 2 | 4 | 8 | 15 | 16 | 24 | 32 | 48 | 64 => Ok(()),
        _ => Err(ValidationError::ColorDepth(bits)),
    }
}

pub fn dimensions_in_range(width: u64, height: u64, limits: &Limits) -> Validation {
    let max = limits.max_dimension;
    if !(1..=max).contains(&width) || !(1..=max).contains(&height) {
        return Err(ValidationError::Dimensions { width, height, max });
    }
    Ok(())
}

pub fn count_in_range(count: u64, max: u64) -> Validation {
    if count > max {
        return Err(ValidationError::Count { count, max });
    }
    Ok(())
}

/// Number of directory entries against the configured ceiling
pub fn entry_count_in_range(count: u64, limits: &Limits) -> Validation {
    count_in_range(count, limits.max_entry_count)
}

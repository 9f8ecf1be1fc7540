//! The names table every name reference of a property stream points into.

use std::io::{Read, Seek};

use arcx_core::{validate, ByteSource, Limits};
use byteorder::LittleEndian;
use tracing::{debug, instrument, warn};
use widestring::U16String;

use crate::error::{Error, Result};

/// The name closing a property list
pub const NONE: &str = "None";

/// How the entries of a names table are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameLayout {
    /// `i32` length counting a trailing null, the characters, the null, a 4 byte hash
    #[default]
    Terminated,
    /// Same as [`NameLayout::Terminated`] without the null
    Unterminated,
}

/// Read a length prefixed string. Negative lengths count UTF-16 code units.
pub(crate) fn read_prefixed_string<S: Read + Seek>(
    source: &mut ByteSource<S>,
    terminated: bool,
) -> Result<String> {
    let length = source.read_i32::<LittleEndian>()?;
    if length == 0 {
        return Ok(String::new());
    }

    let units = u64::from(length.unsigned_abs());
    if length > 0 {
        let mut bytes = source.read_bytes(units)?;
        if !terminated && bytes.last() == Some(&0) {
            return Err(Error::UnexpectedTerminator);
        }
        if terminated && bytes.pop() != Some(0) {
            return Err(Error::MissingTerminator);
        }
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let bytes = source.read_bytes(units * 2)?;
    let mut wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if !terminated && wide.last() == Some(&0) {
        return Err(Error::UnexpectedTerminator);
    }
    if terminated && wide.pop() != Some(0) {
        return Err(Error::MissingTerminator);
    }
    Ok(U16String::from_vec(wide).to_string()?)
}

/// Flat list of names, built once per archive and read only afterwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamesTable {
    names: Vec<String>,
    layout: NameLayout,
}

impl NamesTable {
    /// Read `count` entries.
    ///
    /// The whole table is read with the terminated layout first. If any entry fails, the table
    /// is read again from the start with the unterminated layout; layouts are never mixed.
    #[instrument(skip(source, limits))]
    pub fn read<S: Read + Seek>(
        source: &mut ByteSource<S>,
        count: u64,
        limits: &Limits,
    ) -> Result<Self> {
        validate::entry_count_in_range(count, limits).map_err(arcx_core::Error::from)?;

        let start = source.position();
        match Self::read_layout(source, count, NameLayout::Terminated) {
            Ok(table) => Ok(table),
            Err(primary) => {
                warn!(%primary, "terminated names failed, retrying without terminators");
                source.seek(start)?;
                Self::read_layout(source, count, NameLayout::Unterminated).map_err(|alternate| {
                    debug!(%alternate, "unterminated names failed as well");
                    primary
                })
            }
        }
    }

    fn read_layout<S: Read + Seek>(
        source: &mut ByteSource<S>,
        count: u64,
        layout: NameLayout,
    ) -> Result<Self> {
        let terminated = layout == NameLayout::Terminated;
        let mut names = Vec::with_capacity(count.min(4096) as usize);
        for _ in 0..count {
            names.push(read_prefixed_string(source, terminated)?);
            // hash, unused
            source.skip(4)?;
        }
        Ok(NamesTable { names, layout })
    }

    /// Layout the table was read with
    pub fn layout(&self) -> NameLayout {
        self.layout
    }

    /// Resolve a name reference. Out of range references are an error, never a placeholder.
    pub fn get(&self, index: u64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(Error::NameIndex {
                index,
                len: self.names.len(),
            })
    }

    /// Index of the first entry equal to `name`
    pub fn find(&self, name: &str) -> Option<u64> {
        self.names.iter().position(|n| n == name).map(|i| i as u64)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<T: Into<String>> FromIterator<T> for NamesTable {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        NamesTable {
            names: iter.into_iter().map(Into::into).collect(),
            layout: NameLayout::default(),
        }
    }
}

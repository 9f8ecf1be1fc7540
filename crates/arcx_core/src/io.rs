//! Bounds-checked typed access to archive bytes.

use std::{
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use byteorder::{ByteOrder, WriteBytesExt};
use tracing::warn;

use crate::error::{Error, Result};

/// Anything an archive can be read from
pub trait Backing: Read + Seek + Send {}

impl<T: Read + Seek + Send> Backing for T {}

/// The byte source every parser and exporter works with
pub type ArchiveSource = ByteSource<Box<dyn Backing>>;

/// Seekable reader and writer that knows its length up front.
///
/// Reads never run past the end: a short read fails with [`Error::UnexpectedEof`]
/// and leaves the position untouched. Every multi-byte access names its byte order.
///
/// ```
/// use std::io::Cursor;
/// use arcx_core::ByteSource;
/// use byteorder::{BigEndian, LittleEndian};
///
/// let mut source = ByteSource::new(Cursor::new(vec![0x01, 0x02, 0x03, 0x04])).unwrap();
/// assert_eq!(source.read_u16::<LittleEndian>().unwrap(), 0x0201);
/// assert_eq!(source.read_u16::<BigEndian>().unwrap(), 0x0304);
/// assert!(source.read_u8().is_err());
/// ```
#[derive(Debug)]
pub struct ByteSource<S = Box<dyn Backing>> {
    inner: S,
    pos: u64,
    len: u64,
    fake_path: Option<PathBuf>,
}

impl<S: Seek> ByteSource<S> {
    /// Wrap `inner`, measuring its length and rewinding to the start
    pub fn new(mut inner: S) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(ByteSource {
            inner,
            pos: 0,
            len,
            fake_path: None,
        })
    }

    /// Attach a path used only for extension hints
    pub fn with_fake_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fake_path = Some(path.into());
        self
    }

    pub fn fake_path(&self) -> Option<&Path> {
        self.fake_path.as_deref()
    }

    /// Lowercase extension of the fake path, if any
    pub fn extension(&self) -> Option<String> {
        self.fake_path
            .as_deref()
            .and_then(Path::extension)
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes between the current position and the end
    pub fn remaining_length(&self) -> u64 {
        self.len - self.pos
    }

    /// Move to an absolute position, which may equal the length but not exceed it
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len {
            return Err(Error::UnexpectedEof {
                offset: pos,
                requested: 0,
            });
        }
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Move forward by `count` bytes
    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.ensure(count)?;
        self.seek(self.pos + count)
    }

    /// Fail unless `count` more bytes can be read
    pub fn ensure(&self, count: u64) -> Result<()> {
        match self.pos.checked_add(count) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(Error::UnexpectedEof {
                offset: self.pos,
                requested: count,
            }),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read + Seek> ByteSource<S> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure(buf.len() as u64)?;
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16<E: ByteOrder>(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(E::read_u16(&buf))
    }

    pub fn read_i16<E: ByteOrder>(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(E::read_i16(&buf))
    }

    pub fn read_u32<E: ByteOrder>(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(E::read_u32(&buf))
    }

    pub fn read_i32<E: ByteOrder>(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(E::read_i32(&buf))
    }

    pub fn read_u64<E: ByteOrder>(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(E::read_u64(&buf))
    }

    pub fn read_i64<E: ByteOrder>(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(E::read_i64(&buf))
    }

    pub fn read_f32<E: ByteOrder>(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(E::read_f32(&buf))
    }

    pub fn read_f64<E: ByteOrder>(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(E::read_f64(&buf))
    }

    /// Read exactly `count` bytes
    pub fn read_bytes(&mut self, count: u64) -> Result<Vec<u8>> {
        self.ensure(count)?;
        let mut buf = vec![0u8; count as usize];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read `count` bytes without moving the position
    pub fn peek_bytes(&mut self, count: u64) -> Result<Vec<u8>> {
        let start = self.pos;
        let bytes = self.read_bytes(count)?;
        self.seek(start)?;
        Ok(bytes)
    }

    /// Read a fixed-size string field, cut at the first null
    pub fn read_string(&mut self, count: u64) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read a string preceded by its byte length as a `u32`
    pub fn read_u32_prefixed_string<E: ByteOrder>(&mut self) -> Result<String> {
        let start = self.pos;
        let count = self.read_u32::<E>()?;
        self.read_string(u64::from(count)).inspect_err(|_| {
            if let Err(error) = self.seek(start) {
                warn!(%error, offset = start, "unable to restore position");
            }
        })
    }

    /// Read bytes up to and including a null terminator
    pub fn read_null_string(&mut self) -> Result<String> {
        let start = self.pos;
        let mut bytes = Vec::new();
        loop {
            match self.read_u8() {
                Ok(0) => break,
                Ok(byte) => bytes.push(byte),
                Err(_) => {
                    self.seek(start)?;
                    return Err(Error::UnexpectedEof {
                        offset: start,
                        requested: bytes.len() as u64 + 1,
                    });
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<S: Read + Seek> Read for ByteSource<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = buf.len().min(usize::try_from(self.remaining_length()).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..max])?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl<S: Write + Seek> ByteSource<S> {
    fn put(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        self.pos += buf.len() as u64;
        self.len = self.len.max(self.pos);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    pub fn write_u16<E: ByteOrder>(&mut self, value: u16) -> Result<()> {
        let mut buf = Vec::with_capacity(2);
        buf.write_u16::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_i16<E: ByteOrder>(&mut self, value: i16) -> Result<()> {
        let mut buf = Vec::with_capacity(2);
        buf.write_i16::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_u32<E: ByteOrder>(&mut self, value: u32) -> Result<()> {
        let mut buf = Vec::with_capacity(4);
        buf.write_u32::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_i32<E: ByteOrder>(&mut self, value: i32) -> Result<()> {
        let mut buf = Vec::with_capacity(4);
        buf.write_i32::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_u64<E: ByteOrder>(&mut self, value: u64) -> Result<()> {
        let mut buf = Vec::with_capacity(8);
        buf.write_u64::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_i64<E: ByteOrder>(&mut self, value: i64) -> Result<()> {
        let mut buf = Vec::with_capacity(8);
        buf.write_i64::<E>(value)?;
        self.put(&buf)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.put(bytes)
    }

    /// Write a string into a fixed-size field, padding with nulls
    pub fn write_string(&mut self, value: &str, count: u64) -> Result<()> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(count as usize, 0);
        self.put(&bytes)
    }

    pub fn write_u32_prefixed_string<E: ByteOrder>(&mut self, value: &str) -> Result<()> {
        let count = u32::try_from(value.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
        self.write_u32::<E>(count)?;
        self.put(value.as_bytes())
    }

    pub fn write_null_string(&mut self, value: &str) -> Result<()> {
        self.put(value.as_bytes())?;
        self.put(&[0])
    }

    /// Flush pending writes and release the backing
    pub fn close(mut self) -> Result<S> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

//! File backing that keeps a single page in memory.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::warn;

/// Size of the cached page
pub const PAGE_SIZE: usize = 64 * 1024;

/// Buffered file with one read-ahead page.
///
/// Writes land in the page and mark it dirty; a dirty page goes back to the file
/// when another page is loaded, on [`flush`](Write::flush), on [`close`](PagedFile::close)
/// and, as a last resort, on drop.
#[derive(Debug)]
pub struct PagedFile {
    file: File,
    page: Vec<u8>,
    page_start: Option<u64>,
    dirty: bool,
    pos: u64,
    len: u64,
}

impl PagedFile {
    /// Open an existing file for reading
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_file(File::open(path)?)
    }

    /// Open an existing file for reading and writing
    pub fn open_rw(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_file(OpenOptions::new().read(true).write(true).open(path)?)
    }

    /// Create (or truncate) a file for reading and writing
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_file(
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        )
    }

    pub fn from_file(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(PagedFile {
            file,
            page: Vec::with_capacity(PAGE_SIZE),
            page_start: None,
            dirty: false,
            pos: 0,
            len,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flush the page and the file, reporting any failure
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }

    fn write_back(&mut self) -> io::Result<()> {
        if let (true, Some(start)) = (self.dirty, self.page_start) {
            self.file.seek(SeekFrom::Start(start))?;
            self.file.write_all(&self.page)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Make the page holding `pos` current
    fn load(&mut self, pos: u64) -> io::Result<u64> {
        let start = pos - pos % PAGE_SIZE as u64;
        if self.page_start == Some(start) {
            return Ok(start);
        }

        self.write_back()?;
        self.page_start = None;
        self.page.clear();

        let on_disk = self.file.metadata()?.len();
        if start < on_disk {
            self.file.seek(SeekFrom::Start(start))?;
            (&mut self.file)
                .take(PAGE_SIZE as u64)
                .read_to_end(&mut self.page)?;
        }

        // Bytes written past the end of the file but not flushed yet are not on disk.
        let expected = (self.len.saturating_sub(start)).min(PAGE_SIZE as u64) as usize;
        if self.page.len() < expected {
            self.page.resize(expected, 0);
        }

        self.page_start = Some(start);
        Ok(start)
    }
}

impl Read for PagedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }

        let start = self.load(self.pos)?;
        let offset = (self.pos - start) as usize;
        let available = self.page.len().saturating_sub(offset);
        let count = buf.len().min(available);
        buf[..count].copy_from_slice(&self.page[offset..offset + count]);
        self.pos += count as u64;
        Ok(count)
    }
}

impl Write for PagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let start = self.load(self.pos)?;
        let offset = (self.pos - start) as usize;
        let count = buf.len().min(PAGE_SIZE - offset);
        if self.page.len() < offset + count {
            self.page.resize(offset + count, 0);
        }
        self.page[offset..offset + count].copy_from_slice(&buf[..count]);
        self.dirty = true;
        self.pos += count as u64;
        self.len = self.len.max(self.pos);
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write_back()?;
        self.file.flush()
    }
}

impl Seek for PagedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            )),
        }
    }
}

impl Drop for PagedFile {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(error) = self.write_back() {
                warn!(%error, "unable to write back paged file on drop");
            }
        }
    }
}

//! The file (or buffer) an archive lives in.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::Result,
    io::{ArchiveSource, Backing, ByteSource},
    paged::PagedFile,
};

#[derive(Debug, Clone)]
enum Storage {
    File,
    Memory(Arc<[u8]>),
}

/// An archive on disk or in memory, shared by every resource read from it
#[derive(Debug, Clone)]
pub struct Container {
    path: PathBuf,
    size: u64,
    storage: Storage,
}

impl Container {
    /// Refer to an archive on disk
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        Ok(Container {
            path,
            size,
            storage: Storage::File,
        })
    }

    /// Wrap bytes already in memory; `fake_path` only serves as a name and extension hint
    pub fn from_bytes(fake_path: impl Into<PathBuf>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Container {
            path: fake_path.into(),
            size: bytes.len() as u64,
            storage: Storage::Memory(bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the archive on disk, `None` for in-memory containers
    pub fn file_path(&self) -> Option<&Path> {
        match self.storage {
            Storage::File => Some(&self.path),
            Storage::Memory(_) => None,
        }
    }

    /// Raw bytes of an in-memory container
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::File => None,
            Storage::Memory(bytes) => Some(bytes),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercase file extension
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Open a fresh byte source positioned at the start
    pub fn open(&self) -> Result<ArchiveSource> {
        let backing: Box<dyn Backing> = match &self.storage {
            Storage::File => Box::new(PagedFile::open(&self.path)?),
            Storage::Memory(bytes) => Box::new(Cursor::new(bytes.clone())),
        };
        let source = ByteSource::new(backing)?;
        Ok(source.with_fake_path(&self.path))
    }
}

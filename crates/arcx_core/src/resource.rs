//! A single entry of an archive directory.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use bon::Builder;

use crate::{container::Container, error::Result, exporter::Exporter, io::ArchiveSource};

/// A named entry and the recipe for producing its bytes.
///
/// A resource does not hold its data. It knows where the bytes live in its
/// [`Container`] and which [`Exporter`] turns them into the decompressed file.
#[derive(Builder, Clone)]
pub struct Resource {
    #[builder(into)]
    name: String,

    offset: u64,

    compressed_length: u64,

    decompressed_length: u64,

    exporter: Arc<dyn Exporter>,

    container: Arc<Container>,

    #[builder(skip)]
    exported_path: Option<PathBuf>,

    #[builder(skip)]
    exported_at: Option<SystemTime>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("compressed_length", &self.compressed_length)
            .field("decompressed_length", &self.decompressed_length)
            .field("compression_tag", &self.compression_tag())
            .field("container", &self.container.path())
            .field("exported_path", &self.exported_path)
            .finish()
    }
}

impl Resource {
    /// Full name, possibly with a virtual directory
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Everything before the last path separator, or an empty string
    pub fn directory(&self) -> &str {
        match self.name.rfind(['/', '\\']) {
            Some(index) => &self.name[..index],
            None => "",
        }
    }

    /// Name without its directory
    pub fn filename(&self) -> &str {
        match self.name.rfind(['/', '\\']) {
            Some(index) => &self.name[index + 1..],
            None => &self.name,
        }
    }

    /// Text after the last dot of the filename, or an empty string
    pub fn extension(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(index) => &filename[index + 1..],
            None => "",
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn compressed_length(&self) -> u64 {
        self.compressed_length
    }

    pub fn decompressed_length(&self) -> u64 {
        self.decompressed_length
    }

    /// Identifies the exporter that produces this resource
    pub fn compression_tag(&self) -> &str {
        self.exporter.tag()
    }

    /// Whether producing the resource does more than copy bytes
    pub fn is_compressed(&self) -> bool {
        self.compression_tag() != crate::exporter::RAW_TAG
            || self.compressed_length != self.decompressed_length
    }

    pub fn exporter(&self) -> &Arc<dyn Exporter> {
        &self.exporter
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn exported_path(&self) -> Option<&Path> {
        self.exported_path.as_deref()
    }

    pub fn exported_at(&self) -> Option<SystemTime> {
        self.exported_at
    }

    pub fn is_exported(&self) -> bool {
        self.exported_path.is_some()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Record where and when the resource was written
    pub fn set_exported(&mut self, path: impl Into<PathBuf>, at: SystemTime) {
        self.exported_path = Some(path.into());
        self.exported_at = Some(at);
    }

    /// Produce the decompressed bytes from an already open source
    pub fn produce(&self, source: &mut ArchiveSource) -> Result<Vec<u8>> {
        self.exporter.produce(source, self)
    }

    /// Open the container and produce the decompressed bytes
    pub fn read(&self) -> Result<Vec<u8>> {
        let mut source = self.container.open()?;
        self.produce(&mut source)
    }
}

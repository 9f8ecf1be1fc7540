//! Strategies that turn a resource's stored bytes into its exported file.

use std::{
    fmt::Debug,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use derive_more::derive::Display;
use flate2::read::ZlibDecoder;

use crate::{
    container::Container,
    error::Result,
    io::{ArchiveSource, ByteSource},
    resource::Resource,
    validate,
};

pub mod etc;
pub mod external;
pub mod raw;
pub mod zlib;

pub use etc::EtcExporter;
pub use external::{ExternalTool, ExternalToolExporter, ToolMode};
pub use raw::RawExporter;
pub use zlib::ZlibExporter;

/// Tag of the exporter that copies bytes unchanged
pub const RAW_TAG: &str = "raw";

/// Produces the decompressed bytes of a resource.
///
/// Implementations read the window `[offset, offset + compressed_length)` of the
/// source once, front to back, and keep no per-resource state.
pub trait Exporter: Send + Sync + Debug {
    /// Short name identifying the compression, shown as the resource's compression tag
    fn tag(&self) -> &str;

    /// Produce the decompressed bytes of `resource`
    fn produce(&self, source: &mut ArchiveSource, resource: &Resource) -> Result<Vec<u8>>;

    /// Produce the decompressed bytes of `resource` into `out`, returning the byte count
    fn produce_to(
        &self,
        source: &mut ArchiveSource,
        resource: &Resource,
        out: &mut dyn Write,
    ) -> Result<u64> {
        let bytes = self.produce(source, resource)?;
        out.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    /// The batch interface, for exporters that handle many resources in one run
    fn as_batch(&self) -> Option<&dyn BatchExporter> {
        None
    }
}

/// An exporter that extracts many resources of one container in a single pass
pub trait BatchExporter: Exporter {
    /// Write every resource below `out_dir`, named after the resource
    fn produce_batch(
        &self,
        container: &Container,
        resources: &[&Resource],
        out_dir: &Path,
    ) -> Result<BatchOutcome>;
}

/// How much of a batch made it out
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum ExtractStatus {
    #[display("all")]
    All,
    #[display("some")]
    Some,
    #[display("none")]
    None,
}

impl ExtractStatus {
    /// Classify `succeeded` out of `total` (an empty batch counts as complete)
    pub fn from_counts(succeeded: usize, total: usize) -> Self {
        if succeeded == total {
            ExtractStatus::All
        } else if succeeded == 0 {
            ExtractStatus::None
        } else {
            ExtractStatus::Some
        }
    }
}

/// Result of a batch run, with one output slot per requested resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub status: ExtractStatus,
    pub outputs: Vec<Option<PathBuf>>,
}

impl BatchOutcome {
    pub fn new(outputs: Vec<Option<PathBuf>>) -> Self {
        let succeeded = outputs.iter().filter(|o| o.is_some()).count();
        BatchOutcome {
            status: ExtractStatus::from_counts(succeeded, outputs.len()),
            outputs,
        }
    }

    /// Every resource failed
    pub fn failed(count: usize) -> Self {
        Self::new(vec![None; count])
    }
}

/// Reader over the stored bytes of one resource
pub enum ResourceReader<'a, R: Read> {
    Raw(io::Take<&'a mut R>),
    Zlib(Box<ZlibDecoder<io::Take<&'a mut R>>>),
}

impl<'a, S: Read + std::io::Seek> ResourceReader<'a, ByteSource<S>> {
    fn window(
        source: &'a mut ByteSource<S>,
        resource: &Resource,
    ) -> Result<io::Take<&'a mut ByteSource<S>>> {
        validate::length_fits(resource.compressed_length(), resource.offset(), source.len())?;
        source.seek(resource.offset())?;
        Ok(source.take(resource.compressed_length()))
    }

    /// Stored bytes as they are
    #[tracing::instrument(skip_all, fields(name = resource.name()))]
    pub fn raw(source: &'a mut ByteSource<S>, resource: &Resource) -> Result<Self> {
        Ok(ResourceReader::Raw(Self::window(source, resource)?))
    }

    /// Stored bytes inflated as a zlib stream
    #[tracing::instrument(skip_all, fields(name = resource.name()))]
    pub fn zlib(source: &'a mut ByteSource<S>, resource: &Resource) -> Result<Self> {
        Ok(ResourceReader::Zlib(Box::new(ZlibDecoder::new(
            Self::window(source, resource)?,
        ))))
    }
}

impl<R: Read> Read for ResourceReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ResourceReader::Raw(r) => r.read(buf),
            ResourceReader::Zlib(r) => r.read(buf),
        }
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            ResourceReader::Raw(r) => r.read_to_end(buf),
            ResourceReader::Zlib(r) => r.read_to_end(buf),
        }
    }
}

/// Upper bound for buffers sized from untrusted length fields
pub(crate) fn initial_capacity(length: u64) -> usize {
    const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;
    length.min(MAX_PREALLOCATION) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_from_counts() {
        assert_eq!(ExtractStatus::from_counts(3, 3), ExtractStatus::All);
        assert_eq!(ExtractStatus::from_counts(0, 0), ExtractStatus::All);
        assert_eq!(ExtractStatus::from_counts(1, 3), ExtractStatus::Some);
        assert_eq!(ExtractStatus::from_counts(0, 3), ExtractStatus::None);
    }

    #[test]
    fn outcome_counts_outputs() {
        let outcome = BatchOutcome::new(vec![Some(PathBuf::from("a")), None]);
        assert_eq!(outcome.status, ExtractStatus::Some);
        assert_eq!(BatchOutcome::failed(2).status, ExtractStatus::None);
    }
}

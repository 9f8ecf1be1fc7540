//! This library is the engine behind **arcx**: it recognises archive formats, reads their
//! directories into resource tables and extracts resources on demand.
//!
//! # Overview
//!
//! - A [`FormatRegistry`] holds [`FormatPlugin`]s. To open a file every plugin rates it,
//!   the ratings are sorted (highest first, ties in registration order) and the candidates
//!   are tried until one produces a non-empty [`ResourceTable`].
//! - Parsers read through a [`ByteSource`], a bounds-checked reader over a [`PagedFile`] or
//!   an in-memory buffer, and run the checks in [`validate`] on every directory field.
//! - A [`Resource`] holds no data. It keeps its [`Container`], offset, lengths and the
//!   [`Exporter`] that produces its bytes when asked.
//! - [`export::export_all`] writes a whole table, handing resources that share an external
//!   tool to it in one batch.
//!
//! ```no_run
//! use std::sync::Arc;
//! use arcx_core::{Container, FormatRegistry, Settings};
//!
//! fn list(registry: &FormatRegistry, path: &str) -> arcx_core::Result<()> {
//!     let container = Arc::new(Container::from_path(path)?);
//!     let opened = registry.open(container, &Settings::default())?;
//!
//!     for resource in &opened.table {
//!         println!("{} ({} bytes)", resource.name(), resource.decompressed_length());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod export;
pub mod exporter;
pub mod io;
pub mod matcher;
pub mod paged;
pub mod resource;
pub mod table;
pub mod task;
pub mod validate;

pub use config::{Limits, Settings};
pub use container::Container;
pub use error::{Error, Result};
pub use exporter::{BatchExporter, Exporter, ExtractStatus};
pub use io::{ArchiveSource, ByteSource};
pub use matcher::{FormatPlugin, FormatRegistry, ReadContext};
pub use paged::PagedFile;
pub use resource::Resource;
pub use table::{Column, Filter, ResourceTable};
pub use task::{CancellationToken, TaskGate};

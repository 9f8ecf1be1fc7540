//! Format plugins shipped with arcx.
//!
//! - [`tre::TrePlugin`]: *Star Wars Galaxies* TRE archives, raw and zlib entries
//! - [`pkm::PkmPlugin`]: PKM textures, decoded from ETC1/ETC2 to RGBA8
//!
//! ```no_run
//! use std::sync::Arc;
//! use arcx_core::{Container, Settings};
//!
//! let registry = arcx_formats::builtin_registry();
//! let container = Arc::new(Container::from_path("data_00.tre")?);
//! let opened = registry.open(container, &Settings::default())?;
//! for resource in opened.table.iter() {
//!     println!("{} ({} bytes)", resource.name(), resource.decompressed_length());
//! }
//! # Ok::<(), arcx_core::Error>(())
//! ```

pub mod error;
pub mod pkm;
pub mod tre;

use arcx_core::FormatRegistry;

pub use pkm::PkmPlugin;
pub use tre::TrePlugin;

/// Register every built-in plugin, in a fixed order
pub fn register_builtin(registry: &mut FormatRegistry) -> arcx_core::Result<()> {
    registry.register(TrePlugin)?;
    registry.register(PkmPlugin)?;
    Ok(())
}

/// A registry holding only the built-in plugins
pub fn builtin_registry() -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    register_builtin(&mut registry).expect("built-in plugin ids are unique");
    registry
}

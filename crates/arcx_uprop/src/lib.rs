//! This library reads **tagged property streams** as written by Unreal Engine packages.
//!
//! # Stream Format
//!
//! A property list is a run of tagged properties closed by a tag whose name is `None`:
//!
//! | Field       | Size | Notes                                                 |
//! |-------------|------|-------------------------------------------------------|
//! | name        | 8    | index into the names table                            |
//! | type        | 8    | index into the names table, e.g. `IntProperty`        |
//! | length      | 8    | payload length in bytes                               |
//! | tag name    | 8    | struct, array, byte and enum properties only          |
//! | payload     | n    | `length` bytes                                        |
//!
//! Struct payloads either have a fixed layout (`Vector`, `Rotator`, `Guid`, ...) or are a nested
//! property list. Array payloads hold a `u32` element count followed by the elements; struct
//! arrays carry one extra tag describing every element.
//!
//! Names are stored in a [`NamesTable`] read ahead of the streams. Its entries are `i32` length
//! prefixed strings followed by a hash; negative lengths denote UTF-16.
//!
//! ```
//! use std::io::Cursor;
//! use arcx_core::ByteSource;
//! use arcx_uprop::{read_properties, NamesTable, PropertyContext, PropertyValue};
//!
//! let names: NamesTable = ["None", "Health", "IntProperty"].into_iter().collect();
//! let mut stream = Vec::new();
//! for field in [1u64, 2, 4] {
//!     stream.extend(field.to_le_bytes());
//! }
//! stream.extend(100i32.to_le_bytes());
//! stream.extend(0u64.to_le_bytes());
//!
//! let mut source = ByteSource::new(Cursor::new(stream)).unwrap();
//! let properties = read_properties(&mut source, &PropertyContext::new(&names)).unwrap();
//! assert_eq!(properties[0].value, Some(PropertyValue::Int(100)));
//! ```

pub mod error;
pub mod names;
pub mod property;
pub mod read;

pub use error::{Error, Result};
pub use names::{NameLayout, NamesTable};
pub use property::{find, KnownStruct, PropertyType, PropertyValue, UnrealProperty};
pub use read::{read_properties, read_property, PropertyContext};

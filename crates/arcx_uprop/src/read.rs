//! Tagged property stream decoding.
//!
//! Every property starts with a tag of little-endian `u64` fields: name reference, type name
//! reference, payload length. Struct, array, byte and enum tags carry one more name reference
//! (struct type, element type, enum type) before the payload. A name of `None` ends the list.

use std::io::{Read, Seek};

use arcx_core::{ByteSource, Limits};
use byteorder::LittleEndian;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    names::{read_prefixed_string, NamesTable, NONE},
    property::{KnownStruct, PropertyType, PropertyValue, UnrealProperty},
};

/// Everything decoding consults besides the stream itself
#[derive(Debug, Clone, Copy)]
pub struct PropertyContext<'a> {
    names: &'a NamesTable,
    max_depth: usize,
}

impl<'a> PropertyContext<'a> {
    pub fn new(names: &'a NamesTable) -> Self {
        Self::from_limits(names, &Limits::default())
    }

    pub fn from_limits(names: &'a NamesTable, limits: &Limits) -> Self {
        PropertyContext {
            names,
            max_depth: limits.max_property_depth,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn names(&self) -> &'a NamesTable {
        self.names
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn read_name<S: Read + Seek>(&self, source: &mut ByteSource<S>) -> Result<(u64, String)> {
        let id = source.read_u64::<LittleEndian>()?;
        Ok((id, self.names.get(id)?.to_owned()))
    }

    fn descend(&self, depth: usize) -> Result<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }
        Ok(next)
    }
}

#[derive(Debug)]
struct Tag {
    name: String,
    name_id: u64,
    type_name: String,
    type_id: u64,
    length: u64,
    kind: PropertyType,
    tag_name: Option<(u64, String)>,
}

impl Tag {
    fn property(&self, value: Option<PropertyValue>) -> UnrealProperty {
        UnrealProperty {
            name: self.name.clone(),
            name_id: self.name_id,
            type_name: self.type_name.clone(),
            type_id: self.type_id,
            length: self.length,
            value,
        }
    }

    fn tag_name(&self) -> &str {
        self.tag_name.as_ref().map_or(NONE, |(_, name)| name.as_str())
    }
}

/// `None` at the end of a list
fn read_tag<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
) -> Result<Option<Tag>> {
    let (name_id, name) = context.read_name(source)?;
    if name == NONE {
        return Ok(None);
    }

    let (type_id, type_name) = context.read_name(source)?;
    let length = source.read_u64::<LittleEndian>()?;
    let kind = PropertyType::from_name(&type_name);
    let tag_name = if kind.has_tag_name() {
        Some(context.read_name(source)?)
    } else {
        None
    };

    Ok(Some(Tag {
        name,
        name_id,
        type_name,
        type_id,
        length,
        kind,
        tag_name,
    }))
}

/// Read properties until the `None` terminator
#[instrument(skip_all)]
pub fn read_properties<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
) -> Result<Vec<UnrealProperty>> {
    read_list(source, context, 0)
}

fn read_list<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    depth: usize,
) -> Result<Vec<UnrealProperty>> {
    let mut properties = Vec::new();
    while let Some(property) = read_property(source, context, depth)? {
        properties.push(property);
    }
    Ok(properties)
}

/// Read one property, `None` at the terminator.
///
/// A payload that fails to decode is logged and skipped using its declared length; the
/// property is still returned, without a value. Broken tags and payloads running past the end
/// of the stream cannot be skipped and are errors.
pub fn read_property<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    depth: usize,
) -> Result<Option<UnrealProperty>> {
    let Some(tag) = read_tag(source, context)? else {
        return Ok(None);
    };

    let start = source.position();
    let remaining = source.remaining_length();
    if tag.length > remaining {
        return Err(Error::PayloadPastEnd {
            name: tag.name,
            length: tag.length,
            remaining,
        });
    }
    let end = start + tag.length;

    let value = match decode_value(source, context, &tag, depth) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(name = %tag.name, property_type = %tag.type_name, %error, "skipping property");
            None
        }
    };

    let consumed = source.position().wrapping_sub(start);
    if consumed != tag.length {
        if value.is_some() {
            debug!(name = %tag.name, consumed, declared = tag.length, "payload length mismatch");
        }
        source.seek(end)?;
    }

    Ok(Some(tag.property(value)))
}

fn decode_value<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    tag: &Tag,
    depth: usize,
) -> Result<PropertyValue> {
    match tag.kind {
        PropertyType::Struct => {
            let inner = decode_struct(source, context, tag.tag_name(), tag.length, depth)?;
            Ok(PropertyValue::Struct(Box::new(inner)))
        }
        PropertyType::Array => decode_array(source, context, tag, depth),
        PropertyType::Byte if tag.length == 1 => Ok(PropertyValue::Byte(source.read_u8()?)),
        PropertyType::Byte | PropertyType::Enum => {
            Ok(PropertyValue::Enum(context.read_name(source)?.1))
        }
        PropertyType::Unknown => {
            warn!(name = %tag.name, property_type = %tag.type_name, "unknown property type, keeping raw bytes");
            Ok(PropertyValue::Bytes(source.read_bytes(tag.length)?))
        }
        kind => decode_scalar(source, context, kind),
    }
}

fn decode_scalar<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    kind: PropertyType,
) -> Result<PropertyValue> {
    Ok(match kind {
        PropertyType::Bool => PropertyValue::Bool(source.read_u8()? != 0),
        PropertyType::Int8 => PropertyValue::Int8(source.read_i8()?),
        PropertyType::Int16 => PropertyValue::Int16(source.read_i16::<LittleEndian>()?),
        PropertyType::Int => PropertyValue::Int(source.read_i32::<LittleEndian>()?),
        PropertyType::Int64 => PropertyValue::Int64(source.read_i64::<LittleEndian>()?),
        PropertyType::UInt16 => PropertyValue::UInt16(source.read_u16::<LittleEndian>()?),
        PropertyType::UInt32 => PropertyValue::UInt32(source.read_u32::<LittleEndian>()?),
        PropertyType::UInt64 => PropertyValue::UInt64(source.read_u64::<LittleEndian>()?),
        PropertyType::Float => PropertyValue::Float(source.read_f32::<LittleEndian>()?),
        PropertyType::Double => PropertyValue::Double(source.read_f64::<LittleEndian>()?),
        PropertyType::Byte => PropertyValue::Byte(source.read_u8()?),
        PropertyType::Enum => PropertyValue::Enum(context.read_name(source)?.1),
        PropertyType::Name => PropertyValue::Name(context.read_name(source)?.1),
        PropertyType::Object => PropertyValue::Object(source.read_i32::<LittleEndian>()?),
        PropertyType::Str => PropertyValue::Str(read_prefixed_string(source, true)?),
        PropertyType::Guid => PropertyValue::Guid(read_guid(source)?),
        PropertyType::Struct | PropertyType::Array | PropertyType::Unknown => {
            return Err(Error::UnsplittableArray(format!("{kind:?}")))
        }
    })
}

fn read_guid<S: Read + Seek>(source: &mut ByteSource<S>) -> Result<[u8; 16]> {
    let mut guid = [0u8; 16];
    guid.copy_from_slice(&source.read_bytes(16)?);
    Ok(guid)
}

fn read_floats<S: Read + Seek, const N: usize>(source: &mut ByteSource<S>) -> Result<[f32; N]> {
    let mut values = [0f32; N];
    for value in &mut values {
        *value = source.read_f32::<LittleEndian>()?;
    }
    Ok(values)
}

fn decode_known<S: Read + Seek>(
    source: &mut ByteSource<S>,
    known: KnownStruct,
) -> Result<PropertyValue> {
    Ok(match known {
        KnownStruct::Vector => {
            let [x, y, z] = read_floats(source)?;
            PropertyValue::Vector { x, y, z }
        }
        KnownStruct::Vector2D => {
            let [x, y] = read_floats(source)?;
            PropertyValue::Vector2D { x, y }
        }
        KnownStruct::Rotator => {
            let [pitch, yaw, roll] = read_floats(source)?;
            PropertyValue::Rotator { pitch, yaw, roll }
        }
        KnownStruct::Quat => {
            let [x, y, z, w] = read_floats(source)?;
            PropertyValue::Quat { x, y, z, w }
        }
        KnownStruct::LinearColor => {
            let [r, g, b, a] = read_floats(source)?;
            PropertyValue::LinearColor { r, g, b, a }
        }
        KnownStruct::Color => {
            let [b, g, r, a]: [u8; 4] = [
                source.read_u8()?,
                source.read_u8()?,
                source.read_u8()?,
                source.read_u8()?,
            ];
            PropertyValue::Color { b, g, r, a }
        }
        KnownStruct::IntPoint => PropertyValue::IntPoint {
            x: source.read_i32::<LittleEndian>()?,
            y: source.read_i32::<LittleEndian>()?,
        },
        KnownStruct::Guid => PropertyValue::Guid(read_guid(source)?),
    })
}

/// Decode a struct body of `length` bytes into a property named after its type
fn decode_struct<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    struct_name: &str,
    length: u64,
    depth: usize,
) -> Result<UnrealProperty> {
    let value = match KnownStruct::from_name(struct_name) {
        Some(known) => decode_known(source, known)?,
        None => PropertyValue::Properties(read_list(source, context, context.descend(depth)?)?),
    };

    let type_id = context.names.find(struct_name).unwrap_or_default();
    Ok(UnrealProperty {
        name: struct_name.to_owned(),
        name_id: type_id,
        type_name: struct_name.to_owned(),
        type_id,
        length,
        value: Some(value),
    })
}

fn decode_array<S: Read + Seek>(
    source: &mut ByteSource<S>,
    context: &PropertyContext<'_>,
    tag: &Tag,
    depth: usize,
) -> Result<PropertyValue> {
    let (element_type_id, element_type) = tag.tag_name.clone().unwrap_or((0, NONE.to_owned()));
    let kind = PropertyType::from_name(&element_type);

    if kind == PropertyType::Unknown {
        warn!(name = %tag.name, %element_type, "unknown array element type, keeping raw bytes");
        return Ok(PropertyValue::Bytes(source.read_bytes(tag.length)?));
    }
    if kind == PropertyType::Array {
        return Err(Error::UnsplittableArray(element_type));
    }

    let depth = context.descend(depth)?;
    let count = source.read_u32::<LittleEndian>()?;
    let mut elements = Vec::with_capacity(count.min(1024) as usize);

    if kind == PropertyType::Struct {
        // One tag up front describes every element
        let Some(inner) = read_tag(source, context)? else {
            return Err(Error::UnsplittableArray(element_type));
        };
        let struct_name = inner.tag_name().to_owned();

        for _ in 0..count {
            let start = source.position();
            let mut value = decode_struct(source, context, &struct_name, 0, depth)?;
            value.length = source.position() - start;
            elements.push(UnrealProperty {
                length: value.length,
                value: Some(PropertyValue::Struct(Box::new(value))),
                ..inner.property(None)
            });
        }
        return Ok(PropertyValue::Array(elements));
    }

    for _ in 0..count {
        let start = source.position();
        let value = decode_scalar(source, context, kind)?;
        elements.push(UnrealProperty {
            name: tag.name.clone(),
            name_id: tag.name_id,
            type_name: element_type.clone(),
            type_id: element_type_id,
            length: source.position() - start,
            value: Some(value),
        });
    }
    Ok(PropertyValue::Array(elements))
}

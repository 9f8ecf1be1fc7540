//! Decoded properties and the type names they are tagged with.

/// Property types understood by the reader, keyed by their type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Bool,
    Int8,
    Int16,
    Int,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Byte,
    Enum,
    Name,
    Object,
    Str,
    Struct,
    Array,
    Guid,
    Unknown,
}

impl PropertyType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "BoolProperty" => PropertyType::Bool,
            "Int8Property" => PropertyType::Int8,
            "Int16Property" => PropertyType::Int16,
            "IntProperty" => PropertyType::Int,
            "Int64Property" => PropertyType::Int64,
            "UInt16Property" => PropertyType::UInt16,
            "UInt32Property" => PropertyType::UInt32,
            "UInt64Property" => PropertyType::UInt64,
            "FloatProperty" => PropertyType::Float,
            "DoubleProperty" => PropertyType::Double,
            "ByteProperty" => PropertyType::Byte,
            "EnumProperty" => PropertyType::Enum,
            "NameProperty" => PropertyType::Name,
            "ObjectProperty" => PropertyType::Object,
            "StrProperty" => PropertyType::Str,
            "StructProperty" => PropertyType::Struct,
            "ArrayProperty" => PropertyType::Array,
            "GuidProperty" => PropertyType::Guid,
            _ => PropertyType::Unknown,
        }
    }

    /// Whether the tag carries an extra name reference before the payload
    pub(crate) fn has_tag_name(self) -> bool {
        matches!(
            self,
            PropertyType::Struct | PropertyType::Array | PropertyType::Byte | PropertyType::Enum
        )
    }
}

/// Struct payloads with a fixed binary layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownStruct {
    Vector,
    Vector2D,
    Rotator,
    Quat,
    LinearColor,
    Color,
    IntPoint,
    Guid,
}

impl KnownStruct {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Vector" => KnownStruct::Vector,
            "Vector2D" => KnownStruct::Vector2D,
            "Rotator" => KnownStruct::Rotator,
            "Quat" => KnownStruct::Quat,
            "LinearColor" => KnownStruct::LinearColor,
            "Color" => KnownStruct::Color,
            "IntPoint" => KnownStruct::IntPoint,
            "Guid" => KnownStruct::Guid,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Plain byte, for byte properties without an enum
    Byte(u8),
    /// Enum value name, from byte and enum properties
    Enum(String),
    Name(String),
    /// Index into the object tables, negative for imports
    Object(i32),
    Str(String),
    Guid([u8; 16]),
    Vector { x: f32, y: f32, z: f32 },
    Vector2D { x: f32, y: f32 },
    Rotator { pitch: f32, yaw: f32, roll: f32 },
    Quat { x: f32, y: f32, z: f32, w: f32 },
    LinearColor { r: f32, g: f32, b: f32, a: f32 },
    Color { b: u8, g: u8, r: u8, a: u8 },
    IntPoint { x: i32, y: i32 },
    /// A struct property; the inner property is named after the struct type
    Struct(Box<UnrealProperty>),
    /// Fields of a struct without a fixed layout
    Properties(Vec<UnrealProperty>),
    Array(Vec<UnrealProperty>),
    /// Payload of a type the reader does not know, exactly as long as declared
    Bytes(Vec<u8>),
}

/// One tagged property
#[derive(Debug, Clone, PartialEq)]
pub struct UnrealProperty {
    pub name: String,
    pub name_id: u64,
    pub type_name: String,
    pub type_id: u64,
    /// Declared payload length
    pub length: u64,
    /// `None` when the payload could not be decoded and was skipped
    pub value: Option<PropertyValue>,
}

impl UnrealProperty {
    /// Field `name` of a struct property, looking through the struct wrapper
    pub fn field(&self, name: &str) -> Option<&UnrealProperty> {
        match self.value.as_ref()? {
            PropertyValue::Struct(inner) => inner.field(name),
            PropertyValue::Properties(fields) => find(fields, name),
            _ => None,
        }
    }
}

/// First property called `name`
pub fn find<'a>(properties: &'a [UnrealProperty], name: &str) -> Option<&'a UnrealProperty> {
    properties.iter().find(|p| p.name == name)
}

//! Fixture schemas shared by the tests of `hyaux` and of crates built on it.
use crate::{
    codec::{AuxDataCodec, CodecError, FromByteRange, ToByteRange},
    registry::SchemaRegistry,
    schema::AuxDataSchema,
};

/// `"registered type"`: a 64-bit integer, registered by [`fixture_registry`].
pub struct RegisteredType;
impl AuxDataSchema for RegisteredType {
    const NAME: &'static str = "registered type";
    type Type = i64;
}

/// `"unregistered type"`: never registered by [`fixture_registry`].
pub struct UnregisteredType;
impl AuxDataSchema for UnregisteredType {
    const NAME: &'static str = "unregistered type";
    type Type = i64;
}

/// Same name as [`RegisteredType`] with another value type.
pub struct DuplicateNameType;
impl AuxDataSchema for DuplicateNameType {
    const NAME: &'static str = "registered type";
    type Type = i32;
}

/// `"bad deserialization type"`: encodes fine, never decodes.
pub struct BadDeserializationType;
impl AuxDataSchema for BadDeserializationType {
    const NAME: &'static str = "bad deserialization type";
    type Type = BadPair;
}

/// Two little-endian `i32` whose decoder always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadPair {
    pub x: i32,
    pub y: i32,
}

impl AuxDataCodec for BadPair {
    fn type_name() -> String {
        "badbadbad".to_string()
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        self.x.encode_raw(out);
        self.y.encode_raw(out);
    }

    fn decode_raw(_input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        Err(CodecError::Custom("BadPair never decodes".to_string()))
    }
}

/// Registry with [`RegisteredType`] and [`BadDeserializationType`].
pub fn fixture_registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry
        .register::<RegisteredType>()
        .expect("fresh registry accepts RegisteredType");
    registry
        .register::<BadDeserializationType>()
        .expect("fresh registry accepts BadDeserializationType");
    registry
}

//! Schemas describe one kind of aux data: a stable name and the value type
//! stored under it.
use std::any::TypeId;

use crate::{
    codec::{AuxDataCodec, CodecError},
    opaque::BoxedAuxValue,
};

/// Compile-time description of an aux data schema.
///
/// Schemas are usually zero-sized marker types:
///
/// ```rust
/// # use hyaux::schema::AuxDataSchema;
/// # use std::collections::BTreeMap;
/// pub struct FunctionNames;
///
/// impl AuxDataSchema for FunctionNames {
///     const NAME: &'static str = "functionNames";
///     type Type = BTreeMap<uuid::Uuid, String>;
/// }
/// ```
///
/// Two schemas sharing a `NAME` are the same schema only if they also share
/// `Type`. Otherwise the second one conflicts with the first.
pub trait AuxDataSchema: 'static {
    /// Unique name under which values are stored.
    const NAME: &'static str;

    /// Value type, encoded through its [`AuxDataCodec`].
    type Type: AuxDataCodec + Send + Sync + 'static;
}

/// Type-erased decoder of a registered schema.
pub type DecodeFn = fn(&[u8]) -> Result<BoxedAuxValue, CodecError>;

/// Runtime descriptor of a registered schema.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    name: &'static str,
    type_id: TypeId,
    rust_type: &'static str,
    type_tag: String,
    decode: DecodeFn,
}

fn decode_erased<T: AuxDataCodec + Send + Sync + 'static>(
    bytes: &[u8],
) -> Result<BoxedAuxValue, CodecError> {
    T::from_bytes(bytes).map(|value| Box::new(value) as BoxedAuxValue)
}

impl SchemaDescriptor {
    /// Build the descriptor of schema `S`.
    pub fn of<S: AuxDataSchema>() -> Self {
        Self {
            name: S::NAME,
            type_id: TypeId::of::<S::Type>(),
            rust_type: std::any::type_name::<S::Type>(),
            type_tag: <S::Type as AuxDataCodec>::type_name(),
            decode: decode_erased::<S::Type>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity of the value type.
    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust name of the value type, for diagnostics only.
    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// Codec tag (see [`AuxDataCodec::type_name`]).
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Whether this descriptor stores values of type `T`.
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Decode `bytes` into a type-erased value.
    pub fn decode(&self, bytes: &[u8]) -> Result<BoxedAuxValue, CodecError> {
        (self.decode)(bytes)
    }
}

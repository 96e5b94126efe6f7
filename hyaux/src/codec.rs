//! Byte codecs for aux data values.
//!
//! Every value stored in an [`crate::container::AuxDataContainer`] goes through
//! an [`AuxDataCodec`]. The codec turns the value into an opaque byte payload
//! (the representation kept at rest) and back. Encoding is total; decoding may
//! fail, in which case the container keeps the raw bytes untouched.
//!
//! Built-in codecs use the following wire conventions:
//! - Fixed-width numbers are stored little-endian (`int8_t` … `uint64_t`,
//!   `float`, `double`).
//! - `bool` is a single byte, `0` or `1`.
//! - Lengths and element counts are `u64` little-endian.
//! - `string` is a length followed by UTF-8 bytes.
//! - `sequence<T>`, `set<T>` and `mapping<K,V>` are a count followed by their
//!   elements (keys and values interleaved for mappings).
//! - `tuple<A,B,...>` is the concatenation of its fields.
//! - `optional<T>` is a presence byte, followed by the value when present.
//! - `UUID` is its 16 raw bytes.
//!
//! ```rust
//! # use hyaux::codec::AuxDataCodec;
//! let bytes = (5i32, 10i32).to_bytes();
//! assert_eq!(bytes, [5, 0, 0, 0, 10, 0, 0, 0]);
//! assert_eq!(<(i32, i32)>::type_name(), "tuple<int32_t,int32_t>");
//! assert_eq!(<(i32, i32)>::from_bytes(&bytes), Ok((5, 10)));
//! ```
use std::collections::{BTreeMap, BTreeSet};

use strum::EnumIs;
use thiserror::Error;
use uuid::Uuid;

/// Failure to decode a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum CodecError {
    #[error("Unexpected end of payload: needed {needed} more bytes but only {remaining} remain.")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("Payload was decoded but {0} trailing bytes were left unconsumed.")]
    TrailingBytes(usize),

    #[error("Invalid boolean byte 0x{0:02x}, expected 0x00 or 0x01.")]
    InvalidBool(u8),

    #[error("String payload is not valid UTF-8.")]
    InvalidUtf8,

    #[error("Invalid presence tag 0x{0:02x}.")]
    InvalidTag(u8),

    #[error("Declared length {0} exceeds the size of the payload.")]
    LengthOverflow(u64),

    #[error("{0}")]
    Custom(String),
}

/// Append-only byte sink used while encoding.
pub struct ToByteRange<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> ToByteRange<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    /// Append raw bytes.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append a length or element count as a `u64` little-endian.
    #[inline]
    pub fn write_len(&mut self, len: usize) {
        self.write(&(len as u64).to_le_bytes());
    }

    /// Number of bytes written so far (including bytes present before this range was created).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Cursor over a payload being decoded. Every read consumes bytes from the front.
#[derive(Debug, Clone, Copy)]
pub struct FromByteRange<'a> {
    buf: &'a [u8],
}

impl<'a> FromByteRange<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Consume exactly `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.buf.len() {
            return Err(CodecError::UnexpectedEnd {
                needed: n,
                remaining: self.buf.len(),
            });
        }

        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Consume exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Consume a `u64` little-endian byte length.
    ///
    /// The bytes must all be present, so a length larger than the remaining
    /// payload is rejected before anything is allocated.
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let len = u64::from_le_bytes(self.read_array()?);
        match usize::try_from(len) {
            Ok(len) if len <= self.buf.len() => Ok(len),
            _ => Err(CodecError::LengthOverflow(len)),
        }
    }

    /// Consume a `u64` little-endian element count.
    ///
    /// Elements may encode to zero bytes, so the count is not bounded by the
    /// payload. Preallocate with [`Self::capacity_hint`].
    pub fn read_count(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Capacity worth reserving for `count` elements.
    pub fn capacity_hint(&self, count: u64) -> usize {
        usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(self.buf.len())
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Encode/decode contract of a value type that can be stored as aux data.
///
/// `type_name` describes the wire representation (e.g. `mapping<UUID,string>`)
/// and is stored next to the payload. It is distinct from the schema name and
/// lets a reader detect payloads written with an incompatible codec.
pub trait AuxDataCodec: Sized {
    /// Stable tag describing the encoding produced by [`Self::encode_raw`].
    fn type_name() -> String;

    /// Append the encoding of `self`. Must be deterministic and cannot fail.
    fn encode_raw(&self, out: &mut ToByteRange<'_>);

    /// Decode one value from the front of `input`.
    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError>;

    /// Encode `self` into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_raw(&mut ToByteRange::new(&mut buf));
        buf
    }

    /// Decode a complete payload. Fails if bytes remain after the value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut input = FromByteRange::new(bytes);
        let value = Self::decode_raw(&mut input)?;
        match input.remaining() {
            0 => Ok(value),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

macro_rules! impl_codec_le {
    (
        $( $ty:ty => $name:literal ),+
        $(,)?
    ) => {
        $(
            impl AuxDataCodec for $ty {
                fn type_name() -> String {
                    $name.to_string()
                }

                #[inline]
                fn encode_raw(&self, out: &mut ToByteRange<'_>) {
                    out.write(&self.to_le_bytes());
                }

                #[inline]
                fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
                    Ok(<$ty>::from_le_bytes(input.read_array()?))
                }
            }
        )+
    };
}

impl_codec_le! {
    i8 => "int8_t",
    i16 => "int16_t",
    i32 => "int32_t",
    i64 => "int64_t",
    u8 => "uint8_t",
    u16 => "uint16_t",
    u32 => "uint32_t",
    u64 => "uint64_t",
    f32 => "float",
    f64 => "double",
}

impl AuxDataCodec for bool {
    fn type_name() -> String {
        "bool".to_string()
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write_u8(*self as u8);
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        match input.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

impl AuxDataCodec for String {
    fn type_name() -> String {
        "string".to_string()
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write_len(self.len());
        out.write(self.as_bytes());
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        let len = input.read_len()?;
        let bytes = input.read(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl AuxDataCodec for Uuid {
    fn type_name() -> String {
        "UUID".to_string()
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write(self.as_bytes());
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        Ok(Uuid::from_bytes(input.read_array()?))
    }
}

impl<T: AuxDataCodec> AuxDataCodec for Vec<T> {
    fn type_name() -> String {
        format!("sequence<{}>", T::type_name())
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write_len(self.len());
        for elem in self {
            elem.encode_raw(out);
        }
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        let count = input.read_count()?;
        let mut elems = Vec::with_capacity(input.capacity_hint(count));
        for _ in 0..count {
            elems.push(T::decode_raw(input)?);
        }
        Ok(elems)
    }
}

impl<T: AuxDataCodec + Ord> AuxDataCodec for BTreeSet<T> {
    fn type_name() -> String {
        format!("set<{}>", T::type_name())
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write_len(self.len());
        for elem in self {
            elem.encode_raw(out);
        }
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        let count = input.read_count()?;
        (0..count).map(|_| T::decode_raw(input)).collect()
    }
}

impl<K: AuxDataCodec + Ord, V: AuxDataCodec> AuxDataCodec for BTreeMap<K, V> {
    fn type_name() -> String {
        format!("mapping<{},{}>", K::type_name(), V::type_name())
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        out.write_len(self.len());
        for (key, value) in self {
            key.encode_raw(out);
            value.encode_raw(out);
        }
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        let count = input.read_count()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = K::decode_raw(input)?;
            let value = V::decode_raw(input)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: AuxDataCodec> AuxDataCodec for Option<T> {
    fn type_name() -> String {
        format!("optional<{}>", T::type_name())
    }

    fn encode_raw(&self, out: &mut ToByteRange<'_>) {
        match self {
            Some(value) => {
                out.write_u8(1);
                value.encode_raw(out);
            }
            None => out.write_u8(0),
        }
    }

    fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
        match input.read_u8()? {
            0 => Ok(None),
            1 => T::decode_raw(input).map(Some),
            other => Err(CodecError::InvalidTag(other)),
        }
    }
}

macro_rules! impl_codec_tuple {
    (
        $( $name:ident . $idx:tt ),+
    ) => {
        impl<$( $name: AuxDataCodec ),+> AuxDataCodec for ($( $name, )+) {
            fn type_name() -> String {
                let fields: Vec<String> = vec![$( $name::type_name() ),+];
                format!("tuple<{}>", fields.join(","))
            }

            fn encode_raw(&self, out: &mut ToByteRange<'_>) {
                $( self.$idx.encode_raw(out); )+
            }

            fn decode_raw(input: &mut FromByteRange<'_>) -> Result<Self, CodecError> {
                Ok(($( $name::decode_raw(input)?, )+))
            }
        }
    };
}

impl_codec_tuple!(A.0, B.1);
impl_codec_tuple!(A.0, B.1, C.2);
impl_codec_tuple!(A.0, B.1, C.2, D.3);

//! At-rest representation of a single aux data value.
use borsh::{BorshDeserialize, BorshSerialize};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};

use crate::{codec::AuxDataCodec, opaque::BoxedAuxValue};

/// The persisted triple of an entry.
///
/// This is the only part of an entry written to disk. It survives loading in a
/// process that does not know (or disagrees about) the schema, and is written
/// back byte for byte.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct RawAuxData {
    /// Schema name at the time the value was stored.
    pub key: String,
    /// Codec tag at the time the value was stored.
    pub type_tag: String,
    /// Encoded payload.
    pub raw_bytes: Vec<u8>,
}

/// Decoding state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum EntryState {
    /// Only raw bytes are available (freshly loaded, or every decode attempt failed).
    RawOnly,
    /// A decoded value is cached next to the raw bytes.
    Decoded,
}

/// One aux data value inside a container: raw triple plus a lazily filled cache.
pub struct AuxDataEntry {
    pub(crate) raw: RawAuxData,
    pub(crate) cache: OnceCell<BoxedAuxValue>,
}

impl AuxDataEntry {
    /// Encode `value` right away and keep it as the decoded cache.
    pub(crate) fn from_value<T: AuxDataCodec + Send + Sync + 'static>(key: &str, value: T) -> Self {
        let raw = RawAuxData {
            key: key.to_string(),
            type_tag: T::type_name(),
            raw_bytes: value.to_bytes(),
        };

        Self {
            raw,
            cache: OnceCell::with_value(Box::new(value) as BoxedAuxValue),
        }
    }

    /// Wrap a loaded triple without decoding it.
    pub fn from_raw(raw: RawAuxData) -> Self {
        Self {
            raw,
            cache: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &RawAuxData {
        &self.raw
    }

    pub fn into_raw(self) -> RawAuxData {
        self.raw
    }

    pub fn key(&self) -> &str {
        &self.raw.key
    }

    pub fn type_tag(&self) -> &str {
        &self.raw.type_tag
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw.raw_bytes
    }

    pub fn state(&self) -> EntryState {
        match self.cache.get() {
            Some(_) => EntryState::Decoded,
            None => EntryState::RawOnly,
        }
    }
}

/// Cloning keeps the raw triple only; the clone decodes again on first access.
impl Clone for AuxDataEntry {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl std::fmt::Debug for AuxDataEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuxDataEntry")
            .field("key", &self.raw.key)
            .field("type_tag", &self.raw.type_tag)
            .field("len", &self.raw.raw_bytes.len())
            .field("state", &self.state())
            .finish()
    }
}

impl From<RawAuxData> for AuxDataEntry {
    fn from(raw: RawAuxData) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_is_decoded_and_encoded() {
        let entry = AuxDataEntry::from_value("answer", 42u16);
        assert_eq!(entry.key(), "answer");
        assert_eq!(entry.type_tag(), "uint16_t");
        assert_eq!(entry.raw_bytes(), &[42, 0]);
        assert!(entry.state().is_decoded());
    }

    #[test]
    fn clone_drops_cache_but_keeps_bytes() {
        let entry = AuxDataEntry::from_value("answer", 42u16);
        let copy = entry.clone();
        assert_eq!(copy.raw(), entry.raw());
        assert!(copy.state().is_raw_only());
    }
}

//! Aux data container
//!
//! An [`AuxDataContainer`] is embedded in every IR entity that can carry aux
//! data. It maps schema names to [`AuxDataEntry`] values, in insertion order.
//!
//! Typed operations ([`add`](AuxDataContainer::add),
//! [`get`](AuxDataContainer::get), [`get_mut`](AuxDataContainer::get_mut))
//! consult a [`SchemaRegistry`] and report misuse of a schema as a
//! [`SchemaError`]. Data problems never surface as errors: an entry that cannot
//! be decoded is reported as absent by the typed accessors but stays in the
//! container, visible through [`aux_data`](AuxDataContainer::aux_data), and is
//! written back unchanged.
//!
//! ```rust
//! # use hyaux::{container::AuxDataContainer, registry::SchemaRegistry, schema::AuxDataSchema};
//! struct Answer;
//! impl AuxDataSchema for Answer {
//!     const NAME: &'static str = "answer";
//!     type Type = i64;
//! }
//!
//! let registry = SchemaRegistry::new();
//! registry.register::<Answer>().unwrap();
//!
//! let mut container = AuxDataContainer::new();
//! container.add::<Answer>(&registry, 42).unwrap();
//! assert_eq!(container.get::<Answer>(&registry).unwrap(), Some(&42));
//!
//! let raw = container.aux_data().iter().next().unwrap();
//! assert_eq!(raw.key, "answer");
//! assert_eq!(raw.type_tag, "int64_t");
//! assert_eq!(raw.raw_bytes, 42i64.to_le_bytes());
//! ```
use std::{
    any::type_name,
    iter::FusedIterator,
    ops::{Deref, DerefMut},
};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{
    codec::AuxDataCodec,
    entry::{AuxDataEntry, RawAuxData},
    error::SchemaError,
    opaque::BoxedAuxValue,
    registry::SchemaRegistry,
    schema::AuxDataSchema,
};

/// Ordered collection of aux data entries owned by one IR entity.
#[derive(Debug, Clone, Default)]
pub struct AuxDataContainer {
    entries: IndexMap<String, AuxDataEntry>,
}

/// Outcome of [`AuxDataContainer::decode_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Entries that hold a decoded value.
    pub decoded: Vec<String>,
    /// Entries whose schema is registered but whose payload could not be decoded.
    pub undecodable: Vec<String>,
    /// Entries whose schema is not registered in this process.
    pub unregistered: Vec<String>,
}

impl DecodeReport {
    /// Whether every entry was decoded.
    pub fn is_complete(&self) -> bool {
        self.undecodable.is_empty() && self.unregistered.is_empty()
    }
}

impl AuxDataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` under schema `S`, replacing any previous entry with the same name.
    ///
    /// The value is encoded immediately and also kept as the decoded cache. A
    /// replaced entry keeps its position in iteration order.
    ///
    /// Fails, without modifying the container, if `S` is not registered or if
    /// its name is registered for another type.
    pub fn add<S: AuxDataSchema>(
        &mut self,
        registry: &SchemaRegistry,
        value: S::Type,
    ) -> Result<(), SchemaError> {
        registry.check::<S>()?;

        let entry = AuxDataEntry::from_value(S::NAME, value);
        let len = entry.raw_bytes().len();
        if self.entries.insert(S::NAME.to_string(), entry).is_some() {
            debug!("Replaced aux data `{}` ({} bytes).", S::NAME, len);
        } else {
            debug!("Added aux data `{}` ({} bytes).", S::NAME, len);
        }

        Ok(())
    }

    /// Retrieve the value stored under schema `S`.
    ///
    /// - `Ok(None)` if there is no entry named `S::NAME`.
    /// - `Err(_)` if there is one but `S` is unregistered or conflicts with the
    ///   registered type.
    /// - `Ok(None)` if the entry cannot be decoded (codec failure, or a codec
    ///   tag mismatch while [`strict_type_tags`](crate::conf::RegistryOptions::strict_type_tags)
    ///   is set). The entry is left untouched.
    ///
    /// The first successful decode is cached; later calls return the cache.
    pub fn get<S: AuxDataSchema>(
        &self,
        registry: &SchemaRegistry,
    ) -> Result<Option<&S::Type>, SchemaError> {
        let Some(entry) = self.entries.get(S::NAME) else {
            return Ok(None);
        };

        let descriptor = registry.check::<S>()?;

        if let Some(cached) = entry.cache.get() {
            return match (**cached).downcast_ref::<S::Type>() {
                Some(value) => Ok(Some(value)),
                None => Err(SchemaError::TypeConflict {
                    name: S::NAME.to_string(),
                    registered: "a cached value of another type".to_string(),
                    requested: type_name::<S::Type>().to_string(),
                }),
            };
        }

        if registry.options().strict_type_tags && entry.type_tag() != descriptor.type_tag() {
            warn!(
                "Aux data `{}` was stored with codec tag `{}` but the registered schema uses `{}`. Keeping the raw bytes.",
                S::NAME,
                entry.type_tag(),
                descriptor.type_tag()
            );
            return Ok(None);
        }
        drop(descriptor);

        let decoded = entry.cache.get_or_try_init(|| {
            <S::Type as AuxDataCodec>::from_bytes(entry.raw_bytes())
                .map(|value| Box::new(value) as BoxedAuxValue)
        });

        match decoded {
            Ok(value) => Ok((**value).downcast_ref::<S::Type>()),
            Err(err) => {
                warn!(
                    "Failed to decode aux data `{}` ({} bytes, codec tag `{}`): {} Keeping the raw bytes.",
                    S::NAME,
                    entry.raw_bytes().len(),
                    entry.type_tag(),
                    err
                );
                Ok(None)
            }
        }
    }

    /// Mutable variant of [`Self::get`].
    ///
    /// The returned guard re-encodes the value into the entry's raw bytes when
    /// it is dropped, so the persisted payload always reflects the value.
    pub fn get_mut<S: AuxDataSchema>(
        &mut self,
        registry: &SchemaRegistry,
    ) -> Result<Option<AuxDataMut<'_, S::Type>>, SchemaError> {
        if self.get::<S>(registry)?.is_none() {
            return Ok(None);
        }

        let Some(entry) = self.entries.get_mut(S::NAME) else {
            return Ok(None);
        };

        let AuxDataEntry { raw, cache } = entry;
        Ok(cache
            .get_mut()
            .and_then(|value| (**value).downcast_mut::<S::Type>())
            .map(|value| AuxDataMut { value, raw }))
    }

    /// Remove the entry of schema `S`. Returns whether an entry was removed.
    ///
    /// Removal is keyed by name only and never checks the registry.
    pub fn remove<S: AuxDataSchema>(&mut self) -> bool {
        self.remove_by_name(S::NAME)
    }

    /// Remove the entry named `name`. Returns whether an entry was removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        let removed = self.entries.shift_remove(name).is_some();
        if removed {
            debug!("Removed aux data `{}`.", name);
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, decodable or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry named `name`, regardless of its schema.
    pub fn entry(&self, name: &str) -> Option<&AuxDataEntry> {
        self.entries.get(name)
    }

    /// Raw triple of the entry named `name`, regardless of its schema.
    pub fn get_raw(&self, name: &str) -> Option<&RawAuxData> {
        self.entries.get(name).map(AuxDataEntry::raw)
    }

    /// View over the raw triples of every entry, in insertion order.
    pub fn aux_data(&self) -> AuxDataRange<'_> {
        AuxDataRange {
            entries: &self.entries,
        }
    }

    /// Cursor positioned on the first entry. Equal to `self.aux_data().begin()`.
    pub fn aux_data_begin(&self) -> AuxDataIter<'_> {
        self.aux_data().begin()
    }

    /// Exhausted cursor. Equal to `self.aux_data().end()`.
    pub fn aux_data_end(&self) -> AuxDataIter<'_> {
        self.aux_data().end()
    }

    pub fn iter(&self) -> AuxDataIter<'_> {
        self.aux_data_begin()
    }

    /// Insert a loaded triple verbatim, without decoding it.
    ///
    /// Returns the raw triple previously stored under the same key.
    pub fn insert_raw(&mut self, raw: RawAuxData) -> Option<RawAuxData> {
        self.entries
            .insert(raw.key.clone(), AuxDataEntry::from_raw(raw))
            .map(AuxDataEntry::into_raw)
    }

    /// Build a container from loaded triples, without decoding them.
    ///
    /// Later triples replace earlier ones with the same key.
    pub fn from_raw_entries(entries: impl IntoIterator<Item = RawAuxData>) -> Self {
        entries.into_iter().collect()
    }

    /// Copy of every raw triple, in insertion order.
    pub fn to_raw_entries(&self) -> Vec<RawAuxData> {
        self.iter().cloned().collect()
    }

    pub fn into_raw_entries(self) -> Vec<RawAuxData> {
        self.entries
            .into_values()
            .map(AuxDataEntry::into_raw)
            .collect()
    }

    /// Try to decode every entry whose schema is registered, filling the caches.
    pub fn decode_all(&self, registry: &SchemaRegistry) -> DecodeReport {
        let mut report = DecodeReport::default();

        for entry in self.entries.values() {
            let key = entry.key().to_string();
            if entry.state().is_decoded() {
                report.decoded.push(key);
                continue;
            }

            let Some(descriptor) = registry.lookup_by_name(entry.key()) else {
                report.unregistered.push(key);
                continue;
            };

            if registry.options().strict_type_tags && descriptor.type_tag() != entry.type_tag() {
                report.undecodable.push(key);
                continue;
            }

            match entry
                .cache
                .get_or_try_init(|| descriptor.decode(entry.raw_bytes()))
            {
                Ok(_) => report.decoded.push(key),
                Err(err) => {
                    warn!("Failed to decode aux data `{}`: {}", key, err);
                    report.undecodable.push(key);
                }
            }
        }

        report
    }
}

impl FromIterator<RawAuxData> for AuxDataContainer {
    /// Later triples replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = RawAuxData>>(iter: I) -> Self {
        let mut container = Self::new();
        container.extend(iter);
        container
    }
}

impl Extend<RawAuxData> for AuxDataContainer {
    fn extend<I: IntoIterator<Item = RawAuxData>>(&mut self, iter: I) {
        for raw in iter {
            self.insert_raw(raw);
        }
    }
}

impl<'a> IntoIterator for &'a AuxDataContainer {
    type Item = &'a RawAuxData;
    type IntoIter = AuxDataIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Whole-range view returned by [`AuxDataContainer::aux_data`].
#[derive(Debug, Clone, Copy)]
pub struct AuxDataRange<'a> {
    entries: &'a IndexMap<String, AuxDataEntry>,
}

impl<'a> AuxDataRange<'a> {
    pub fn begin(&self) -> AuxDataIter<'a> {
        AuxDataIter {
            entries: self.entries,
            front: 0,
            back: self.entries.len(),
        }
    }

    pub fn end(&self) -> AuxDataIter<'a> {
        AuxDataIter {
            entries: self.entries,
            front: self.entries.len(),
            back: self.entries.len(),
        }
    }

    pub fn iter(&self) -> AuxDataIter<'a> {
        self.begin()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for AuxDataRange<'a> {
    type Item = &'a RawAuxData;
    type IntoIter = AuxDataIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.begin()
    }
}

/// Iterator over raw triples, doubling as a position in the container.
///
/// Two iterators compare equal when they walk the same container and have the
/// same remaining range, so `begin() == end()` exactly when the container is
/// empty.
#[derive(Debug, Clone)]
pub struct AuxDataIter<'a> {
    entries: &'a IndexMap<String, AuxDataEntry>,
    front: usize,
    back: usize,
}

impl PartialEq for AuxDataIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.entries, other.entries)
            && self.front == other.front
            && self.back == other.back
    }
}

impl Eq for AuxDataIter<'_> {}

impl<'a> Iterator for AuxDataIter<'a> {
    type Item = &'a RawAuxData;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        let (_, entry) = self.entries.get_index(self.front)?;
        self.front += 1;
        Some(entry.raw())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back.saturating_sub(self.front);
        (len, Some(len))
    }
}

impl DoubleEndedIterator for AuxDataIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        self.back -= 1;
        self.entries.get_index(self.back).map(|(_, entry)| entry.raw())
    }
}

impl ExactSizeIterator for AuxDataIter<'_> {}
impl FusedIterator for AuxDataIter<'_> {}

/// Mutable access to a decoded aux data value.
///
/// Dropping the guard writes the (possibly modified) value back into the raw
/// bytes of its entry.
pub struct AuxDataMut<'a, T: AuxDataCodec> {
    value: &'a mut T,
    raw: &'a mut RawAuxData,
}

impl<T: AuxDataCodec> Deref for AuxDataMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value
    }
}

impl<T: AuxDataCodec> DerefMut for AuxDataMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value
    }
}

impl<T: AuxDataCodec> Drop for AuxDataMut<'_, T> {
    fn drop(&mut self) {
        self.raw.raw_bytes = self.value.to_bytes();
        self.raw.type_tag = T::type_name();
    }
}

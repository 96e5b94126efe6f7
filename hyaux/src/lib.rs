//! Extensible aux data for the Hyperion IR.
//!
//! Tools attach arbitrary auxiliary data (analysis results, annotations, ...)
//! to IR entities through an [`AuxDataContainer`]. Each kind of data is a
//! schema: a unique name plus a value type with a byte codec. Schemas are
//! registered in a [`SchemaRegistry`] before any IR is saved or loaded.
//!
//! Values are kept as raw bytes at rest and decoded lazily. Entries whose
//! schema is unknown to the current process, or whose payload cannot be
//! decoded, are preserved as raw bytes so that files round-trip through tools
//! that do not understand every schema.
//!
//! The crate is organised as follows:
//! - [`codec`]: the [`AuxDataCodec`] contract and built-in codecs.
//! - [`schema`]: the [`AuxDataSchema`] trait and runtime descriptors.
//! - [`registry`]: the [`SchemaRegistry`] and static schema submission.
//! - [`entry`]: at-rest entries and their raw triple.
//! - [`container`]: the [`AuxDataContainer`] and its iterators.

pub mod codec;
pub mod conf;
pub mod container;
pub mod entry;
pub mod error;
pub mod opaque;
pub mod registry;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;

pub extern crate inventory;

pub use codec::{AuxDataCodec, CodecError};
pub use container::{AuxDataContainer, AuxDataIter, AuxDataMut, AuxDataRange, DecodeReport};
pub use entry::{AuxDataEntry, EntryState, RawAuxData};
pub use error::{RegistryError, SchemaError};
pub use registry::SchemaRegistry;
pub use schema::{AuxDataSchema, SchemaDescriptor};

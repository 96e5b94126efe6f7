use strum::EnumIs;
use thiserror::Error;

/// Misuse of a schema by client code.
///
/// These errors mean the program itself is wrong: a schema was used without
/// being registered, or two modules registered different types under the same
/// name. They are not recoverable at the call site and must be propagated up to
/// a layer that reports them and stops, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum SchemaError {
    /// No schema was registered under the requested name.
    #[error(
        "Attempting to access aux data `{name}` with unregistered or incorrect type. No schema with this name was registered."
    )]
    Unregistered { name: String },

    /// The name is registered, but for a different value type.
    #[error(
        "Attempting to access aux data `{name}` with unregistered or incorrect type. The schema is registered for `{registered}` but was used with `{requested}`."
    )]
    TypeConflict {
        name: String,
        registered: String,
        requested: String,
    },
}

impl SchemaError {
    /// Name of the schema this error is about.
    pub fn name(&self) -> &str {
        match self {
            SchemaError::Unregistered { name } => name,
            SchemaError::TypeConflict { name, .. } => name,
        }
    }
}

/// Failure to add a schema to a [`crate::registry::SchemaRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum RegistryError {
    /// The registry was locked by a serialization pass (or explicitly) before
    /// this registration happened.
    #[error(
        "Cannot register aux data schema `{name}`: the schema registry is locked. All schemas must be registered before the first save or load."
    )]
    Locked { name: String },

    /// Another type is already registered under this name.
    #[error(
        "Cannot register aux data schema `{name}` for `{requested}`: the name is already registered for `{registered}`."
    )]
    TypeConflict {
        name: String,
        registered: String,
        requested: String,
    },
}

use serde::{Deserialize, Serialize};

/// Behavior switches of a [`crate::registry::SchemaRegistry`].
///
/// Usually loaded as the `[registry]` table of the IR configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Refuse to decode an entry whose stored codec tag differs from the tag of
    /// the registered schema. Such entries stay available as raw bytes.
    pub strict_type_tags: bool,

    /// Lock the registry on the first save or load. Registering a schema after
    /// that fails with [`crate::error::RegistryError::Locked`].
    pub lock_on_serialize: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            strict_type_tags: true,
            lock_on_serialize: true,
        }
    }
}

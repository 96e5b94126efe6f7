//! Schema registry
//!
//! A [`SchemaRegistry`] maps schema names to their [`SchemaDescriptor`]. Every
//! module that attaches aux data registers its schemas before any container is
//! saved or loaded. The first serialization pass locks the registry; from then
//! on the set of schemas is frozen and further registrations are rejected.
//!
//! Registries are plain values passed by reference to container operations.
//! There is no process-wide instance, so independent registries (e.g. one per
//! test) never interfere with each other.
//!
//! Schemas can also be submitted statically with
//! [`register_aux_data_schema!`](crate::register_aux_data_schema) and picked up
//! by [`SchemaRegistry::register_submitted`].
use std::{
    any::{TypeId, type_name},
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::{
    conf::RegistryOptions,
    error::{RegistryError, SchemaError},
    schema::{AuxDataSchema, SchemaDescriptor},
};

/// Static schema submission collected through `inventory`.
///
/// Do not build this by hand, use [`register_aux_data_schema!`](crate::register_aux_data_schema).
pub struct SchemaSubmission {
    pub descriptor: fn() -> SchemaDescriptor,
}
inventory::collect!(SchemaSubmission);

/// Submit one or more schemas for registration by
/// [`SchemaRegistry::register_submitted`].
#[macro_export]
macro_rules! register_aux_data_schema {
    (
        $( $schema:ty ),+
        $(,)?
    ) => {
        $(
            $crate::inventory::submit! {
                $crate::registry::SchemaSubmission {
                    descriptor: $crate::schema::SchemaDescriptor::of::<$schema>,
                }
            }
        )+
    };
}

/// Table of registered aux data schemas.
///
/// ```rust
/// # use hyaux::{registry::SchemaRegistry, schema::AuxDataSchema};
/// struct Comments;
/// impl AuxDataSchema for Comments {
///     const NAME: &'static str = "comments";
///     type Type = Vec<String>;
/// }
///
/// let registry = SchemaRegistry::new();
/// registry.register::<Comments>().unwrap();
/// // Registering the same schema twice is harmless.
/// registry.register::<Comments>().unwrap();
/// assert_eq!(registry.lookup_by_name("comments").unwrap().type_tag(), "sequence<string>");
///
/// registry.lock();
/// assert!(registry.register::<Comments>().unwrap_err().is_locked());
/// ```
pub struct SchemaRegistry {
    schemas: RwLock<BTreeMap<&'static str, SchemaDescriptor>>,
    locked: AtomicBool,
    options: RegistryOptions,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.names())
            .field("locked", &self.is_locked())
            .field("options", &self.options)
            .finish()
    }
}

impl SchemaRegistry {
    /// Create an empty, unlocked registry with default options.
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create an empty, unlocked registry.
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            schemas: Default::default(),
            locked: AtomicBool::new(false),
            options,
        }
    }

    /// Create a registry holding every statically submitted schema.
    pub fn with_submitted(options: RegistryOptions) -> Result<Self, RegistryError> {
        let registry = Self::with_options(options);
        registry.register_submitted()?;
        Ok(registry)
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Register schema `S`.
    ///
    /// Fails if the registry is locked (even when `S` is already registered), or
    /// if `S::NAME` is registered for another type.
    pub fn register<S: AuxDataSchema>(&self) -> Result<(), RegistryError> {
        self.register_descriptor(SchemaDescriptor::of::<S>())
    }

    /// Register an already built descriptor. See [`Self::register`].
    pub fn register_descriptor(&self, descriptor: SchemaDescriptor) -> Result<(), RegistryError> {
        // The write lock orders this registration against a concurrent `lock()`.
        let mut schemas = self.schemas.write();

        if self.locked.load(Ordering::Acquire) {
            return Err(RegistryError::Locked {
                name: descriptor.name().to_string(),
            });
        }

        match schemas.get(descriptor.name()) {
            Some(existing) if existing.value_type_id() == descriptor.value_type_id() => {
                debug!(
                    "Aux data schema `{}` ({}) is already registered.",
                    descriptor.name(),
                    descriptor.rust_type()
                );
                Ok(())
            }
            Some(existing) => Err(RegistryError::TypeConflict {
                name: descriptor.name().to_string(),
                registered: existing.rust_type().to_string(),
                requested: descriptor.rust_type().to_string(),
            }),
            None => {
                debug!(
                    "Registered aux data schema `{}` for {} (codec tag `{}`).",
                    descriptor.name(),
                    descriptor.rust_type(),
                    descriptor.type_tag()
                );
                schemas.insert(descriptor.name(), descriptor);
                Ok(())
            }
        }
    }

    /// Register every schema submitted with
    /// [`register_aux_data_schema!`](crate::register_aux_data_schema).
    ///
    /// Returns the number of submissions processed, or the first error.
    pub fn register_submitted(&self) -> Result<usize, RegistryError> {
        let mut count = 0;
        for submission in inventory::iter::<SchemaSubmission> {
            self.register_descriptor((submission.descriptor)())?;
            count += 1;
        }

        debug!("Processed {} statically submitted aux data schemas.", count);
        Ok(count)
    }

    /// Retrieve the descriptor registered under `name`, if any.
    ///
    /// The returned guard holds a read lock on the registry; drop it before
    /// registering new schemas from the same thread.
    pub fn lookup_by_name(&self, name: &str) -> Option<MappedRwLockReadGuard<'_, SchemaDescriptor>> {
        let schemas = self.schemas.read_recursive();
        RwLockReadGuard::try_map(schemas, |map| map.get(name)).ok()
    }

    /// Every descriptor whose value type is `T`.
    pub fn lookup_by_type<T: 'static>(&self) -> Vec<SchemaDescriptor> {
        self.schemas
            .read_recursive()
            .values()
            .filter(|desc| desc.is_type::<T>())
            .cloned()
            .collect()
    }

    /// Confirm that `S` may be used: its name is registered and bound to `S::Type`.
    pub fn check<S: AuxDataSchema>(
        &self,
    ) -> Result<MappedRwLockReadGuard<'_, SchemaDescriptor>, SchemaError> {
        let descriptor = self
            .lookup_by_name(S::NAME)
            .ok_or_else(|| SchemaError::Unregistered {
                name: S::NAME.to_string(),
            })?;

        if descriptor.value_type_id() != TypeId::of::<S::Type>() {
            return Err(SchemaError::TypeConflict {
                name: S::NAME.to_string(),
                registered: descriptor.rust_type().to_string(),
                requested: type_name::<S::Type>().to_string(),
            });
        }

        Ok(descriptor)
    }

    /// Freeze the set of registered schemas.
    pub fn lock(&self) {
        let schemas = self.schemas.write();
        if !self.locked.swap(true, Ordering::AcqRel) {
            info!("Aux data schema registry locked with {} schemas.", schemas.len());
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all registered schemas, in lexicographic order.
    pub fn names(&self) -> Vec<&'static str> {
        self.schemas.read_recursive().keys().copied().collect()
    }

    /// Forget every schema and unlock the registry.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn reset(&self) {
        let mut schemas = self.schemas.write();
        schemas.clear();
        self.locked.store(false, Ordering::Release);
    }
}

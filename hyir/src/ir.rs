//! IR entities carrying aux data.
use hyaux::{
    AuxDataContainer, AuxDataIter, AuxDataMut, AuxDataRange, AuxDataSchema, SchemaError,
};
use log::debug;
use uuid::Uuid;

use crate::context::Context;

/// An entity owning exactly one [`AuxDataContainer`].
///
/// The provided methods are thin wrappers over the container, resolving
/// schemas against the registry of the given [`Context`].
pub trait AuxDataHolder {
    fn aux_data_container(&self) -> &AuxDataContainer;
    fn aux_data_container_mut(&mut self) -> &mut AuxDataContainer;

    /// See [`AuxDataContainer::add`].
    fn add_aux_data<S: AuxDataSchema>(
        &mut self,
        ctx: &Context,
        value: S::Type,
    ) -> Result<(), SchemaError> {
        self.aux_data_container_mut().add::<S>(ctx.registry(), value)
    }

    /// See [`AuxDataContainer::get`].
    fn get_aux_data<S: AuxDataSchema>(
        &self,
        ctx: &Context,
    ) -> Result<Option<&S::Type>, SchemaError> {
        self.aux_data_container().get::<S>(ctx.registry())
    }

    /// See [`AuxDataContainer::get_mut`].
    fn get_aux_data_mut<S: AuxDataSchema>(
        &mut self,
        ctx: &Context,
    ) -> Result<Option<AuxDataMut<'_, S::Type>>, SchemaError> {
        self.aux_data_container_mut().get_mut::<S>(ctx.registry())
    }

    fn remove_aux_data<S: AuxDataSchema>(&mut self) -> bool {
        self.aux_data_container_mut().remove::<S>()
    }

    fn clear_aux_data(&mut self) {
        self.aux_data_container_mut().clear()
    }

    fn aux_data_size(&self) -> usize {
        self.aux_data_container().len()
    }

    fn aux_data_empty(&self) -> bool {
        self.aux_data_container().is_empty()
    }

    fn aux_data(&self) -> AuxDataRange<'_> {
        self.aux_data_container().aux_data()
    }

    fn aux_data_begin(&self) -> AuxDataIter<'_> {
        self.aux_data_container().aux_data_begin()
    }

    fn aux_data_end(&self) -> AuxDataIter<'_> {
        self.aux_data_container().aux_data_end()
    }
}

/// A named module of an [`Ir`].
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) uuid: Uuid,
    pub(crate) name: String,
    pub(crate) aux_data: AuxDataContainer,
}

impl Module {
    pub fn create(ctx: &Context, name: impl Into<String>) -> Self {
        let module = Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            aux_data: AuxDataContainer::new(),
        };
        debug!(
            "Created module `{}` ({}) against a registry of {} schemas",
            module.name,
            module.uuid,
            ctx.registry().len()
        );
        module
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl AuxDataHolder for Module {
    fn aux_data_container(&self) -> &AuxDataContainer {
        &self.aux_data
    }

    fn aux_data_container_mut(&mut self) -> &mut AuxDataContainer {
        &mut self.aux_data
    }
}

/// Root of an IR document: its own aux data plus the modules it owns.
#[derive(Debug, Clone)]
pub struct Ir {
    pub(crate) uuid: Uuid,
    pub(crate) aux_data: AuxDataContainer,
    pub(crate) modules: Vec<Module>,
}

impl Ir {
    pub fn create(ctx: &Context) -> Self {
        let ir = Self {
            uuid: Uuid::new_v4(),
            aux_data: AuxDataContainer::new(),
            modules: Vec::new(),
        };
        debug!(
            "Created IR {} against a registry of {} schemas",
            ir.uuid,
            ctx.registry().len()
        );
        ir
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [Module] {
        &mut self.modules
    }

    /// Take ownership of `module`. Returns a handle to it.
    pub fn add_module(&mut self, module: Module) -> &mut Module {
        self.modules.push(module);
        let last = self.modules.len() - 1;
        &mut self.modules[last]
    }

    /// First module named `name`.
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn find_module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|module| module.name == name)
    }

    /// Remove and return the module with the given uuid.
    pub fn remove_module(&mut self, uuid: Uuid) -> Option<Module> {
        let index = self.modules.iter().position(|module| module.uuid == uuid)?;
        Some(self.modules.remove(index))
    }
}

impl AuxDataHolder for Ir {
    fn aux_data_container(&self) -> &AuxDataContainer {
        &self.aux_data
    }

    fn aux_data_container_mut(&mut self) -> &mut AuxDataContainer {
        &mut self.aux_data
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyaux::tests_utils::{
        BadDeserializationType, BadPair, DuplicateNameType, RegisteredType, UnregisteredType,
        fixture_registry,
    };

    use super::*;

    fn context() -> Context {
        Context::new(Arc::new(fixture_registry()))
    }

    #[test]
    fn holder_wraps_the_container() {
        let ctx = context();
        let mut ir = Ir::create(&ctx);
        assert!(ir.aux_data_empty());
        assert_eq!(ir.aux_data_begin(), ir.aux_data_end());

        ir.add_aux_data::<RegisteredType>(&ctx, 5).unwrap();
        ir.add_aux_data::<BadDeserializationType>(&ctx, BadPair { x: 5, y: 10 })
            .unwrap();
        assert_eq!(ir.aux_data_size(), 2);
        assert_eq!(ir.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&5));
        assert_ne!(ir.aux_data_begin(), ir.aux_data_end());

        let keys: Vec<_> = ir.aux_data().iter().map(|raw| raw.key.as_str()).collect();
        assert_eq!(keys, ["registered type", "bad deserialization type"]);

        assert!(ir.remove_aux_data::<RegisteredType>());
        assert!(!ir.remove_aux_data::<RegisteredType>());
        ir.clear_aux_data();
        assert!(ir.aux_data_empty());
    }

    #[test]
    fn holder_reports_contract_violations() {
        let ctx = context();
        let mut module = Module::create(&ctx, "main");

        assert!(
            module
                .add_aux_data::<UnregisteredType>(&ctx, 1)
                .unwrap_err()
                .is_unregistered()
        );
        assert!(
            module
                .add_aux_data::<DuplicateNameType>(&ctx, 1)
                .unwrap_err()
                .is_type_conflict()
        );
        assert!(module.aux_data_empty());

        module.add_aux_data::<RegisteredType>(&ctx, 1).unwrap();
        assert!(
            module
                .get_aux_data::<DuplicateNameType>(&ctx)
                .unwrap_err()
                .is_type_conflict()
        );
        assert_eq!(module.get_aux_data::<UnregisteredType>(&ctx).unwrap(), None);
    }

    #[test]
    fn mutable_access_updates_raw_bytes() {
        let ctx = context();
        let mut module = Module::create(&ctx, "main");
        module.add_aux_data::<RegisteredType>(&ctx, 1).unwrap();

        *module
            .get_aux_data_mut::<RegisteredType>(&ctx)
            .unwrap()
            .unwrap() += 41;

        assert_eq!(module.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&42));
        assert_eq!(
            module.aux_data().iter().next().unwrap().raw_bytes,
            42i64.to_le_bytes()
        );
    }

    #[test]
    fn modules_are_owned_by_the_ir() {
        let ctx = context();
        let mut ir = Ir::create(&ctx);
        let uuid = ir.add_module(Module::create(&ctx, "a")).uuid();
        ir.add_module(Module::create(&ctx, "b"));

        ir.find_module_mut("b")
            .unwrap()
            .add_aux_data::<RegisteredType>(&ctx, 7)
            .unwrap();
        assert_eq!(
            ir.find_module("b")
                .unwrap()
                .get_aux_data::<RegisteredType>(&ctx)
                .unwrap(),
            Some(&7)
        );
        assert!(ir.find_module("a").unwrap().aux_data_empty());

        assert_eq!(ir.remove_module(uuid).map(|m| m.name().to_string()), Some("a".to_string()));
        assert_eq!(ir.modules().len(), 1);
        assert!(ir.remove_module(uuid).is_none());
    }
}

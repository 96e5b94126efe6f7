use std::sync::Arc;

use hyaux::SchemaRegistry;
use log::info;

use crate::{
    conf::IrConfig,
    error::IrResult,
    node::{NodeArena, NodeData, NodeError, NodeId, Symbol},
};

/// Everything IR entities are created and (de)serialized against: the schema
/// registry, the configuration, and the structural nodes.
///
/// The registry is shared: several contexts may use the same one, e.g. to load
/// files written by each other.
#[derive(Debug)]
pub struct Context {
    registry: Arc<SchemaRegistry>,
    config: IrConfig,
    nodes: NodeArena,
}

impl Context {
    /// Create a context around `registry` with the default configuration.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, IrConfig::default())
    }

    /// Create a context around `registry`.
    ///
    /// The registry keeps its own options; `config.registry` only matters for
    /// [`Self::from_config`].
    pub fn with_config(registry: Arc<SchemaRegistry>, config: IrConfig) -> Self {
        Self {
            registry,
            config,
            nodes: NodeArena::new(),
        }
    }

    /// Create a context with a fresh registry holding every statically
    /// submitted schema.
    pub fn from_config(config: IrConfig) -> IrResult<Self> {
        let registry = SchemaRegistry::with_submitted(config.registry.clone())?;
        info!(
            "Created IR context with {} submitted aux data schemas",
            registry.len()
        );
        Ok(Self::with_config(Arc::new(registry), config))
    }

    /// [`Self::from_config`] with the configuration at [`IrConfig::default_path`].
    pub fn from_default_config() -> IrResult<Self> {
        Self::from_config(IrConfig::load_or_default()?)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<SchemaRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &IrConfig {
        &self.config
    }

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeArena {
        &mut self.nodes
    }

    /// Insert a detached node into the arena.
    pub fn create_node(&mut self, data: impl Into<NodeData>) -> NodeId {
        self.nodes.insert(data)
    }

    /// See [`NodeArena::attach`].
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), NodeError> {
        self.nodes.attach(child, parent)
    }

    /// See [`NodeArena::remove`].
    pub fn remove_node(&mut self, id: NodeId) -> usize {
        self.nodes.remove(id)
    }

    /// See [`NodeArena::set_procedure_name_symbol`].
    pub fn set_procedure_name_symbol(
        &mut self,
        info: NodeId,
        symbol: Option<NodeId>,
    ) -> Result<(), NodeError> {
        self.nodes.set_procedure_name_symbol(info, symbol)
    }

    /// See [`NodeArena::procedure_name_symbol`].
    pub fn procedure_name_symbol(&self, info: NodeId) -> Option<&Symbol> {
        self.nodes.procedure_name_symbol(info)
    }
}

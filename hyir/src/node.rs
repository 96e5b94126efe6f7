//! Structural nodes of the IR.
//!
//! Nodes live in a [`NodeArena`] and refer to each other through [`NodeId`]
//! handles. Handles are versioned: once a node is removed, every handle to it
//! resolves to nothing, even if its slot is reused. This is how a
//! [`CfgNodeInfo`] refers to its procedure name [`Symbol`] without owning it.
//!
//! Each node kind carries a set of [`ParentValidator`]s checked whenever the
//! node is attached to a parent.
use log::debug;
use slotmap::{SlotMap, new_key_type};
use smallvec::{SmallVec, smallvec};
use strum::{Display, EnumDiscriminants, EnumIs};
use thiserror::Error;
use uuid::Uuid;

new_key_type! {
    /// Handle to a node of a [`NodeArena`].
    pub struct NodeId;
}

/// A node of the control flow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgNode {
    pub address: Option<u64>,
}

/// Extra information about a [`CfgNode`]. At most one per node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgNodeInfo {
    procedure_name_symbol: Option<NodeId>,
}

impl CfgNodeInfo {
    /// Raw handle to the procedure name symbol. Use
    /// [`NodeArena::procedure_name_symbol`] to resolve it.
    pub fn procedure_name_handle(&self) -> Option<NodeId> {
        self.procedure_name_symbol
    }
}

/// A named location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: Option<u64>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIs, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, Display))]
#[strum_discriminants(name(NodeKind))]
pub enum NodeData {
    CfgNode(CfgNode),
    CfgNodeInfo(CfgNodeInfo),
    Symbol(Symbol),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from(self)
    }

    fn default_validators(&self) -> SmallVec<ParentValidator, 2> {
        match self {
            NodeData::CfgNodeInfo(_) => smallvec![
                ParentValidator::HasParentOfType(NodeKind::CfgNode),
                ParentValidator::HasNoSiblingsOfType(NodeKind::CfgNodeInfo),
            ],
            NodeData::CfgNode(_) | NodeData::Symbol(_) => SmallVec::new(),
        }
    }
}

impl From<CfgNode> for NodeData {
    fn from(value: CfgNode) -> Self {
        NodeData::CfgNode(value)
    }
}

impl From<CfgNodeInfo> for NodeData {
    fn from(value: CfgNodeInfo) -> Self {
        NodeData::CfgNodeInfo(value)
    }
}

impl From<Symbol> for NodeData {
    fn from(value: Symbol) -> Self {
        NodeData::Symbol(value)
    }
}

/// Constraint checked when a node is attached to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum ParentValidator {
    /// The parent must be of the given kind.
    HasParentOfType(NodeKind),
    /// The parent must not already have another child of the given kind.
    HasNoSiblingsOfType(NodeKind),
}

impl ParentValidator {
    fn validate(
        &self,
        arena: &NodeArena,
        child: NodeId,
        parent: NodeId,
    ) -> Result<(), NodeError> {
        let child_kind = arena.kind(child).ok_or(NodeError::Missing(child))?;
        let parent_node = arena.nodes.get(parent).ok_or(NodeError::Missing(parent))?;

        match *self {
            ParentValidator::HasParentOfType(expected) if parent_node.data.kind() != expected => {
                Err(NodeError::InvalidParent {
                    child: child_kind,
                    parent: parent_node.data.kind(),
                    expected,
                })
            }
            ParentValidator::HasNoSiblingsOfType(kind) => {
                let duplicate = parent_node
                    .children
                    .iter()
                    .filter(|&&sibling| sibling != child)
                    .any(|&sibling| arena.kind(sibling) == Some(kind));

                if duplicate {
                    Err(NodeError::DuplicateSibling {
                        child: child_kind,
                        kind,
                    })
                } else {
                    Ok(())
                }
            }
            ParentValidator::HasParentOfType(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum NodeError {
    #[error("Node {0:?} does not exist (it may have been removed).")]
    Missing(NodeId),

    #[error("A {child} cannot be attached to a {parent}: its parent must be a {expected}.")]
    InvalidParent {
        child: NodeKind,
        parent: NodeKind,
        expected: NodeKind,
    },

    #[error("A {child} cannot be attached: its parent already has a {kind} child.")]
    DuplicateSibling { child: NodeKind, kind: NodeKind },

    #[error("Expected a {expected} node, found a {found} node.")]
    WrongKind { expected: NodeKind, found: NodeKind },

    #[error("Attaching {child:?} under {parent:?} would create a cycle.")]
    Cycle { child: NodeId, parent: NodeId },
}

#[derive(Debug, Clone)]
pub struct Node {
    uuid: Uuid,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    validators: SmallVec<ParentValidator, 2>,
    data: NodeData,
}

impl Node {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn validators(&self) -> &[ParentValidator] {
        &self.validators
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// Owner of every structural node of a context.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: SlotMap<NodeId, Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node. Its validators are the defaults of its kind.
    pub fn insert(&mut self, data: impl Into<NodeData>) -> NodeId {
        let data = data.into();
        let node = Node {
            uuid: Uuid::new_v4(),
            parent: None,
            children: Vec::new(),
            validators: data.default_validators(),
            data,
        };
        self.nodes.insert(node)
    }

    /// Add a validator to `id`. It applies to later attachments only.
    pub fn add_parent_validator(
        &mut self,
        id: NodeId,
        validator: ParentValidator,
    ) -> Result<(), NodeError> {
        let node = self.nodes.get_mut(id).ok_or(NodeError::Missing(id))?;
        if !node.validators.contains(&validator) {
            node.validators.push(validator);
        }
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id).map(|node| &mut node.data)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(Node::kind)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Attach `child` under `parent`, moving it away from its previous parent.
    ///
    /// Every validator of `child` must accept `parent`; otherwise nothing changes.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), NodeError> {
        if !self.contains(child) {
            return Err(NodeError::Missing(child));
        }
        if !self.contains(parent) {
            return Err(NodeError::Missing(parent));
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(NodeError::Cycle { child, parent });
            }
            cursor = self.parent(current);
        }

        for validator in &self.nodes[child].validators {
            validator.validate(self, child, parent)?;
        }

        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        debug!(
            "Attached {} {:?} under {} {:?}",
            self.nodes[child].kind(),
            child,
            self.nodes[parent].kind(),
            parent
        );
        Ok(())
    }

    /// Detach `child` from its parent. Returns the former parent.
    pub fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(child)?.parent.take()?;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&id| id != child);
        }
        Some(parent)
    }

    /// Remove `id` and its whole subtree. Returns the number of removed nodes.
    ///
    /// Handles to removed nodes, including procedure name references, resolve
    /// to nothing afterwards.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }

        self.detach(id);

        let mut removed = 0;
        let mut stack: SmallVec<NodeId, 8> = smallvec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed += 1;
            }
        }

        debug!("Removed {} nodes rooted at {:?}", removed, id);
        removed
    }

    /// Point the [`CfgNodeInfo`] `info` at the [`Symbol`] `symbol`, or clear it with `None`.
    pub fn set_procedure_name_symbol(
        &mut self,
        info: NodeId,
        symbol: Option<NodeId>,
    ) -> Result<(), NodeError> {
        if let Some(symbol) = symbol {
            let found = self.kind(symbol).ok_or(NodeError::Missing(symbol))?;
            if found != NodeKind::Symbol {
                return Err(NodeError::WrongKind {
                    expected: NodeKind::Symbol,
                    found,
                });
            }
        }

        match self.data_mut(info) {
            Some(NodeData::CfgNodeInfo(data)) => {
                data.procedure_name_symbol = symbol;
                Ok(())
            }
            Some(other) => Err(NodeError::WrongKind {
                expected: NodeKind::CfgNodeInfo,
                found: other.kind(),
            }),
            None => Err(NodeError::Missing(info)),
        }
    }

    /// Resolve the procedure name symbol of `info`.
    ///
    /// `None` if `info` is not a live [`CfgNodeInfo`], if no symbol was set, or
    /// if the symbol has been removed since.
    pub fn procedure_name_symbol(&self, info: NodeId) -> Option<&Symbol> {
        let NodeData::CfgNodeInfo(data) = &self.nodes.get(info)?.data else {
            return None;
        };

        match &self.nodes.get(data.procedure_name_symbol?)?.data {
            NodeData::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }
}

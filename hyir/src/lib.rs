//! IR entities carrying aux data.
//!
//! This crate provides the collaborators of the [`hyaux`] subsystem:
//!
//! - [`Ir`] and [`Module`], entities each owning one aux data container and
//!   exposing it through [`AuxDataHolder`];
//! - a [`Context`] holding the shared schema registry, the configuration and
//!   the structural nodes ([`node`]), whose attachment is checked by parent
//!   validators;
//! - the IR file format ([`io`]), which keeps aux data as raw bytes so that
//!   values of unknown schemas survive a load/save cycle.
//!
//! ```rust
//! # use std::sync::Arc;
//! # use hyaux::{AuxDataSchema, SchemaRegistry};
//! # use hyir::{AuxDataHolder, Context, Ir};
//! struct Comments;
//! impl AuxDataSchema for Comments {
//!     const NAME: &'static str = "comments";
//!     type Type = Vec<String>;
//! }
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! registry.register::<Comments>().unwrap();
//! let ctx = Context::new(registry);
//!
//! let mut ir = Ir::create(&ctx);
//! ir.add_aux_data::<Comments>(&ctx, vec!["entry point".to_string()]).unwrap();
//!
//! let mut file = Vec::new();
//! ir.save(&ctx, &mut file).unwrap();
//!
//! let loaded = Ir::load(&ctx, file.as_slice()).unwrap();
//! assert_eq!(loaded.uuid(), ir.uuid());
//! assert_eq!(
//!     loaded.get_aux_data::<Comments>(&ctx).unwrap().map(Vec::as_slice),
//!     Some(&["entry point".to_string()][..])
//! );
//! ```
pub mod conf;
pub mod context;
pub mod error;
pub mod io;
pub mod ir;
pub mod magic;
pub mod node;

pub use conf::{IoOptions, IrConfig};
pub use context::Context;
pub use error::{IrError, IrResult};
pub use ir::{AuxDataHolder, Ir, Module};
pub use node::{
    CfgNode, CfgNodeInfo, NodeArena, NodeData, NodeError, NodeId, NodeKind, ParentValidator,
    Symbol,
};

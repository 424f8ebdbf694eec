//! Type resolution engine for documentation trees.
//!
//! A [`oracle::TypeOracle`] answers type-checker queries; the [`resolve`]
//! module walks its type graph into a serializable [`ir::TypeNode`] tree
//! (prop tables, API references). [`oracle::SnapshotOracle`] provides the
//! oracle over a JSON type graph dumped by a checker integration.
pub mod defaults;
pub mod ir;
pub mod jq_exec;
pub mod logging;
pub mod metadata;
pub mod oracle;
pub mod path_de;
pub mod resolve;

pub use resolve::{ResolveOptions, TypeResolver, resolve_exports, resolve_type, resolve_type_properties};

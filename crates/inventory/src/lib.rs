//! Inventory model and variable resolver.
//!
//! This crate provides:
//! - Host/group declarations with serde deserialization
//! - Referential-integrity and cycle validation of the group DAG
//! - Deterministic ancestor ordering per host
//! - Variable resolution across global, group, and host scopes

pub mod model;
pub mod resolver;

pub use model::{Group, GroupDecl, Host, HostDecl, Inventory, InventoryDoc, VarMap};
pub use resolver::{deep_merge, resolve, VariableSet};

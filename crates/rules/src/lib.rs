//! Alert-rule templates: schema, rendering, validation, and compilation.
//!
//! This crate provides:
//! - YAML template documents with serde deserialization and scope predicates
//! - Minijinja rendering of template bodies against resolved variable sets
//! - Prometheus alert-rule output-schema validation
//! - The staged compiler driving the per-host pipeline on a rayon pool

pub mod compiler;
pub mod output;
pub mod render;
pub mod schema;
pub mod validate;

pub use compiler::{Compilation, Compiler, CompilerState};
pub use output::OutputDocument;
pub use schema::{AlertRule, RuleGroup, RuleTemplate, Scope};

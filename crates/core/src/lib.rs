//! Shared types for the alertbook compiler.
//!
//! This crate holds the pieces every stage of the pipeline needs:
//! - [`CompileError`]: the single error enum for all compile stages
//! - [`CompileOptions`]: knobs controlling merge and output grouping

pub mod error;
pub mod options;

pub use error::{CompileError, Result};
pub use options::{CompileOptions, GroupBy};

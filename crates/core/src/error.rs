//! Compile error taxonomy.
//!
//! Structural errors (`Schema`, `Cycle`, `Io`, `Parse`) abort a run before
//! any per-host work starts. Per-target errors (`UndefinedVariable`,
//! `TemplateSyntax`, `Validation`) are collected across all (host, template)
//! pairs and reported together at the end of the run.

use thiserror::Error;

/// All errors the compiler can produce.
///
/// Every variant carries enough context (host id, template id, variable
/// key, or schema path) to locate the fault without re-running.
#[derive(Error, Debug)]
pub enum CompileError {
    /// Malformed inventory or template structure.
    #[error("schema error at {path}: {message}")]
    Schema { path: String, message: String },

    /// Cycle in the group parent graph.
    #[error("group cycle detected involving '{group}'")]
    Cycle { group: String },

    /// A template referenced a variable absent from the resolved set,
    /// with no default declared.
    #[error("undefined variable '{variable}' (host '{host}', template '{template}')")]
    UndefinedVariable {
        host: String,
        template: String,
        variable: String,
    },

    /// Malformed template directive.
    #[error("template syntax error in '{template}': {message}")]
    TemplateSyntax {
        template: String,
        /// Line within the template body, when the engine reports one.
        line: Option<usize>,
        message: String,
    },

    /// Rendered rule violates the Prometheus alert-rule schema.
    #[error("validation error (host '{host}', template '{template}'): {constraint}")]
    Validation {
        host: String,
        template: String,
        constraint: String,
    },

    /// Filesystem I/O error while loading inputs or writing outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl CompileError {
    /// Whether this error aborts the whole run.
    ///
    /// Per-target errors are collected instead; see the crate docs.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompileError::Schema { .. }
                | CompileError::Cycle { .. }
                | CompileError::Io(_)
                | CompileError::Parse(_)
                | CompileError::Other(_)
        )
    }
}

/// Result alias for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

//! Output documents: ordered rule groups bound for one rule file.

use serde::Serialize;

use alertbook_core::Result;

use crate::schema::RuleGroup;

/// An ordered collection of rule groups destined for one serialized
/// Prometheus rule file (`groups:` top-level key).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    /// Logical source (host id, or `all` in single-document mode). Drives
    /// the output filename; not part of the serialized document.
    #[serde(skip)]
    pub name: String,
    pub groups: Vec<RuleGroup>,
}

impl OutputDocument {
    /// Serialize to the Prometheus rule-file YAML shape.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

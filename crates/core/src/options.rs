//! Compile-run options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How rendered rule groups are bundled into output documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One output document per host (the default).
    #[default]
    Host,
    /// A single merged document containing every host's groups.
    Single,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Host => write!(f, "host"),
            GroupBy::Single => write!(f, "single"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "host" => Ok(GroupBy::Host),
            "single" => Ok(GroupBy::Single),
            other => Err(format!("unknown grouping mode: '{}'", other)),
        }
    }
}

/// Options controlling variable merging and output assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Recursively merge mapping-typed variables instead of replacing them
    /// wholesale. Scalars and lists always replace. Off by default.
    #[serde(default)]
    pub deep_merge: bool,

    /// Output document grouping mode.
    #[serde(default)]
    pub group_by: GroupBy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_shallow_per_host() {
        let opts = CompileOptions::default();
        assert!(!opts.deep_merge);
        assert_eq!(opts.group_by, GroupBy::Host);
    }

    #[test]
    fn group_by_round_trips_from_str() {
        assert_eq!("host".parse::<GroupBy>().unwrap(), GroupBy::Host);
        assert_eq!("single".parse::<GroupBy>().unwrap(), GroupBy::Single);
        assert!("per-rack".parse::<GroupBy>().is_err());
    }
}

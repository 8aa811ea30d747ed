//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use alertbook_core::GroupBy;

/// Compile Ansible-style inventories and alert-rule templates into
/// Prometheus rule files.
#[derive(Parser, Debug)]
#[command(name = "alertbook", version, about)]
pub struct CliArgs {
    /// Inventory YAML file. `group_vars/` and `host_vars/` directories are
    /// discovered next to it.
    #[arg(short, long, env = "ALERTBOOK_INVENTORY")]
    pub inventory: PathBuf,

    /// Directory containing rule-template YAML files.
    #[arg(short, long, env = "ALERTBOOK_RULES")]
    pub rules: PathBuf,

    /// Output directory for compiled rule files; prints to stdout when
    /// omitted.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output grouping mode: `host` (one document per host) or `single`
    /// (one merged document).
    #[arg(long, default_value_t = GroupBy::Host, value_parser = parse_group_by)]
    pub group_by: GroupBy,

    /// Recursively merge mapping-typed variables instead of replacing
    /// them wholesale.
    #[arg(long)]
    pub deep_merge: bool,
}

fn parse_group_by(s: &str) -> Result<GroupBy, String> {
    s.parse()
}

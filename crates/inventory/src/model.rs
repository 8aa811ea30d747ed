//! Host/group inventory with serde deserialization and validation.
//!
//! Groups may belong to multiple parent groups, forming a DAG (not
//! necessarily a tree). Construction validates referential integrity and
//! rejects cycles before any per-host work begins.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::Deserialize;

use alertbook_core::{CompileError, Result};

/// Ordered variable mapping. Insertion order is semantically meaningful:
/// it drives deterministic output.
pub type VarMap = IndexMap<String, serde_yaml::Value>;

// ── Raw declarations (serde input) ──────────────────────────────────

/// Raw inventory document as parsed from YAML.
///
/// Hosts and groups may be declared bare (`db1: ~`) when they carry no
/// memberships or variables of their own.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryDoc {
    #[serde(default)]
    pub hosts: IndexMap<String, Option<HostDecl>>,
    #[serde(default)]
    pub groups: IndexMap<String, Option<GroupDecl>>,
    /// Global default variables, lowest precedence scope.
    #[serde(default)]
    pub defaults: VarMap,
}

/// A host declaration: group memberships (in declaration order) plus
/// host-scoped variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostDecl {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub vars: VarMap,
}

/// A group declaration: parent groups (in declaration order) plus
/// group-scoped variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupDecl {
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub vars: VarMap,
}

// ── Validated entities ──────────────────────────────────────────────

/// A validated host.
#[derive(Debug, Clone)]
pub struct Host {
    pub id: String,
    /// Direct group memberships, in declaration order.
    pub groups: Vec<String>,
    pub vars: VarMap,
}

/// A validated group.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    /// Direct parent groups, in declaration order.
    pub parents: Vec<String>,
    pub vars: VarMap,
}

/// A validated inventory: hosts, groups, and the global default scope.
///
/// Immutable after construction; one instance is shared read-only across
/// the whole compile run.
#[derive(Debug, Clone)]
pub struct Inventory {
    hosts: IndexMap<String, Host>,
    groups: IndexMap<String, Group>,
    defaults: VarMap,
}

impl Inventory {
    /// Build and validate an inventory from raw declarations.
    ///
    /// Fails with [`CompileError::Schema`] when a host membership or group
    /// parent references an undeclared group, and with
    /// [`CompileError::Cycle`] when the parent graph contains a cycle.
    pub fn from_doc(doc: InventoryDoc) -> Result<Self> {
        let groups: IndexMap<String, Group> = doc
            .groups
            .into_iter()
            .map(|(id, decl)| {
                let decl = decl.unwrap_or_default();
                let group = Group {
                    id: id.clone(),
                    parents: decl.parents,
                    vars: decl.vars,
                };
                (id, group)
            })
            .collect();

        let hosts: IndexMap<String, Host> = doc
            .hosts
            .into_iter()
            .map(|(id, decl)| {
                let decl = decl.unwrap_or_default();
                let host = Host {
                    id: id.clone(),
                    groups: decl.groups,
                    vars: decl.vars,
                };
                (id, host)
            })
            .collect();

        // Referential integrity: every membership and parent must name a
        // declared group.
        for host in hosts.values() {
            for gid in &host.groups {
                if !groups.contains_key(gid) {
                    return Err(CompileError::Schema {
                        path: format!("hosts.{}.groups", host.id),
                        message: format!("references undeclared group '{}'", gid),
                    });
                }
            }
        }
        for group in groups.values() {
            for pid in &group.parents {
                if !groups.contains_key(pid) {
                    return Err(CompileError::Schema {
                        path: format!("groups.{}.parents", group.id),
                        message: format!("references undeclared group '{}'", pid),
                    });
                }
            }
        }

        check_cycles(&groups)?;

        tracing::debug!(
            hosts = hosts.len(),
            groups = groups.len(),
            "inventory validated"
        );

        Ok(Self {
            hosts,
            groups,
            defaults: doc.defaults,
        })
    }

    /// Hosts in declaration order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Global default variables (lowest precedence scope).
    pub fn defaults(&self) -> &VarMap {
        &self.defaults
    }

    /// All groups a host belongs to, direct and transitive, in stable
    /// order: declared direct memberships first, then breadth-first
    /// ancestor expansion. Duplicates removed keeping the first occurrence.
    pub fn ancestor_groups(&self, host: &Host) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = host.groups.iter().map(String::as_str).collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id.to_string());
            if let Some(group) = self.groups.get(id) {
                queue.extend(group.parents.iter().map(String::as_str));
            }
        }

        order
    }
}

// ── Cycle detection ─────────────────────────────────────────────────

/// DFS over the parent graph with an in-progress set. A back edge means
/// a cycle.
fn check_cycles(groups: &IndexMap<String, Group>) -> Result<()> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut in_progress: HashSet<&str> = HashSet::new();

    for id in groups.keys() {
        visit(id, groups, &mut done, &mut in_progress)?;
    }
    Ok(())
}

fn visit<'a>(
    id: &'a str,
    groups: &'a IndexMap<String, Group>,
    done: &mut HashSet<&'a str>,
    in_progress: &mut HashSet<&'a str>,
) -> Result<()> {
    if done.contains(id) {
        return Ok(());
    }
    if !in_progress.insert(id) {
        return Err(CompileError::Cycle {
            group: id.to_string(),
        });
    }
    if let Some(group) = groups.get(id) {
        for parent in &group.parents {
            visit(parent, groups, done, in_progress)?;
        }
    }
    in_progress.remove(id);
    done.insert(id);
    Ok(())
}

//! The staged rule compiler.
//!
//! Drives the full pipeline: inventory validation (Loading), per-host
//! variable resolution (Resolving), template rendering (Rendering),
//! output-schema checks (Validating), and document assembly (Assembled).
//!
//! The per-host stages run on a rayon worker pool bounded by available
//! cores. Inputs are immutable shared snapshots; each worker produces its
//! own results, collected in input order so output stays deterministic
//! despite concurrent execution.

use std::mem;

use rayon::prelude::*;
use tracing::{debug, info};

use alertbook_core::{CompileError, CompileOptions, GroupBy, Result};
use alertbook_inventory::{resolve, Inventory, InventoryDoc, VariableSet};

use crate::output::OutputDocument;
use crate::render;
use crate::schema::{AlertRule, RuleGroup, RuleTemplate};
use crate::validate;

// ── Compiler state machine ──────────────────────────────────────────

/// Lifecycle of one compile run. `Failed` is terminal and reachable from
/// any state on an unrecoverable structural error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerState {
    Initialized,
    Loading,
    Resolving,
    Rendering,
    Validating,
    Assembled,
    Failed,
}

// ── Intermediate pipeline types ─────────────────────────────────────

/// One host after the Resolving stage: its ancestor order and effective
/// variable set, computed once per run.
struct ResolvedHost {
    id: String,
    ancestors: Vec<String>,
    vars: VariableSet,
}

/// One successfully rendered (host, template) pair.
struct RenderedGroup {
    host: String,
    template: String,
    rules: Vec<AlertRule>,
}

// ── Compiler ────────────────────────────────────────────────────────

/// Compiles an inventory plus a template set into output documents.
pub struct Compiler {
    doc: InventoryDoc,
    templates: Vec<RuleTemplate>,
    options: CompileOptions,
    state: CompilerState,
}

/// Result of a compile run: the assembled documents plus every collected
/// per-target error. An empty `issues` list means the run is clean.
#[derive(Debug)]
pub struct Compilation {
    pub documents: Vec<OutputDocument>,
    pub issues: Vec<CompileError>,
}

impl Compiler {
    pub fn new(doc: InventoryDoc, templates: Vec<RuleTemplate>, options: CompileOptions) -> Self {
        Self {
            doc,
            templates,
            options,
            state: CompilerState::Initialized,
        }
    }

    pub fn state(&self) -> CompilerState {
        self.state
    }

    /// Run the full pipeline.
    ///
    /// Structural errors (bad inventory) return `Err` and leave the
    /// compiler in `Failed`; per-target errors are collected into
    /// [`Compilation::issues`] without stopping unrelated pairs.
    pub fn compile(&mut self) -> Result<Compilation> {
        match self.run() {
            Ok(compilation) => {
                self.state = CompilerState::Assembled;
                Ok(compilation)
            }
            Err(e) => {
                self.state = CompilerState::Failed;
                Err(e)
            }
        }
    }

    fn run(&mut self) -> Result<Compilation> {
        let mut issues = Vec::new();

        // Loading: validate the inventory (fatal on cycle / bad reference)
        // and syntax-check every template once up front. A template with a
        // malformed directive is reported a single time and dropped from
        // the working set; it must not fail once per host.
        self.state = CompilerState::Loading;
        let inventory = Inventory::from_doc(mem::take(&mut self.doc))?;
        let templates: Vec<RuleTemplate> = mem::take(&mut self.templates)
            .into_iter()
            .filter_map(|template| match render::check_syntax(&template) {
                Ok(()) => Some(template),
                Err(e) => {
                    issues.push(e);
                    None
                }
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .build()
            .map_err(|e| CompileError::Other(format!("failed to build worker pool: {}", e)))?;

        // Resolving: ancestor order + variable set, once per host.
        self.state = CompilerState::Resolving;
        let hosts: Vec<_> = inventory.hosts().collect();
        let resolved: Vec<ResolvedHost> = pool.install(|| {
            hosts
                .par_iter()
                .map(|&host| ResolvedHost {
                    id: host.id.clone(),
                    ancestors: inventory.ancestor_groups(host),
                    vars: resolve(&inventory, host, &self.options),
                })
                .collect()
        });
        debug!(hosts = resolved.len(), templates = templates.len(), "resolved variable sets");

        // Rendering: every matching (host, template) pair, in host-then-
        // template declaration order. Parallel map; ordered collect.
        self.state = CompilerState::Rendering;
        let pairs: Vec<(&ResolvedHost, &RuleTemplate)> = resolved
            .iter()
            .flat_map(|host| {
                templates
                    .iter()
                    .filter(|t| t.applies_to(&host.id, &host.ancestors))
                    .map(move |t| (host, t))
            })
            .collect();
        let outcomes: Vec<Result<RenderedGroup>> = pool.install(|| {
            pairs
                .par_iter()
                .map(|&(host, template)| {
                    render::render(template, &host.vars, &host.id).map(|rules| RenderedGroup {
                        host: host.id.clone(),
                        template: template.name.clone(),
                        rules,
                    })
                })
                .collect()
        });

        let mut groups = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(group) => groups.push(group),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => issues.push(e),
            }
        }

        // Validating: output-schema checks per rendered group. Groups with
        // violations are excluded from output; their errors are collected.
        self.state = CompilerState::Validating;
        let verdicts: Vec<Vec<CompileError>> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| validate::validate_rules(&group.rules, &group.host, &group.template))
                .collect()
        });
        let mut valid_groups = Vec::new();
        for (group, errors) in groups.into_iter().zip(verdicts) {
            if errors.is_empty() {
                valid_groups.push(group);
            } else {
                issues.extend(errors);
            }
        }

        let documents = assemble(valid_groups, self.options.group_by);
        info!(
            documents = documents.len(),
            issues = issues.len(),
            "compilation assembled"
        );

        Ok(Compilation { documents, issues })
    }
}

// ── Assembly ────────────────────────────────────────────────────────

/// Bundle rendered groups into output documents.
///
/// Input arrives in host-then-template declaration order and that order
/// is preserved. Hosts with no valid groups produce no document.
fn assemble(groups: Vec<RenderedGroup>, group_by: GroupBy) -> Vec<OutputDocument> {
    match group_by {
        GroupBy::Host => {
            let mut documents: Vec<OutputDocument> = Vec::new();
            for group in groups {
                let rule_group = RuleGroup {
                    name: group.template,
                    rules: group.rules,
                };
                match documents.last_mut() {
                    Some(doc) if doc.name == group.host => doc.groups.push(rule_group),
                    _ => documents.push(OutputDocument {
                        name: group.host,
                        groups: vec![rule_group],
                    }),
                }
            }
            documents
        }
        GroupBy::Single => {
            if groups.is_empty() {
                return Vec::new();
            }
            let merged = groups
                .into_iter()
                .map(|group| RuleGroup {
                    // Group names must stay unique across the merged file.
                    name: format!("{}-{}", group.host, group.template),
                    rules: group.rules,
                })
                .collect();
            vec![OutputDocument {
                name: "all".to_string(),
                groups: merged,
            }]
        }
    }
}

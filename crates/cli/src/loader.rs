//! Input file discovery and loading.
//!
//! The on-disk layout is Ansible-inspired: one inventory YAML file with
//! optional `group_vars/` and `host_vars/` directories next to it, and a
//! rules directory scanned for template files. Dotfiles and non-YAML
//! files are skipped. All ordering is made stable (sorted file names) so
//! repeated runs see identical input order.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use alertbook_core::{CompileError, Result};
use alertbook_inventory::{GroupDecl, HostDecl, InventoryDoc, VarMap};
use alertbook_rules::RuleTemplate;

/// Load the inventory document and fold in `group_vars/` / `host_vars/`
/// files found next to it.
///
/// Per-scope file variables override the inline `vars:` of the same
/// scope. A vars file naming an undeclared group or host is a schema
/// error, consistent with host memberships referencing undeclared groups.
pub fn load_inventory(path: &Path) -> Result<InventoryDoc> {
    let contents = fs::read_to_string(path)?;
    let mut doc: InventoryDoc = serde_yaml::from_str(&contents).map_err(|e| CompileError::Schema {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    merge_group_vars(&mut doc, &base.join("group_vars"))?;
    merge_host_vars(&mut doc, &base.join("host_vars"))?;

    info!(
        path = %path.display(),
        hosts = doc.hosts.len(),
        groups = doc.groups.len(),
        "loaded inventory"
    );
    Ok(doc)
}

fn merge_group_vars(doc: &mut InventoryDoc, dir: &Path) -> Result<()> {
    for (name, vars) in scope_var_files(dir)? {
        match doc.groups.get_mut(&name) {
            Some(decl) => {
                let decl = decl.get_or_insert_with(GroupDecl::default);
                decl.vars.extend(vars);
                debug!(group = %name, "merged group_vars file");
            }
            None => {
                return Err(CompileError::Schema {
                    path: format!("group_vars/{}.yml", name),
                    message: format!("references undeclared group '{}'", name),
                });
            }
        }
    }
    Ok(())
}

fn merge_host_vars(doc: &mut InventoryDoc, dir: &Path) -> Result<()> {
    for (name, vars) in scope_var_files(dir)? {
        match doc.hosts.get_mut(&name) {
            Some(decl) => {
                let decl = decl.get_or_insert_with(HostDecl::default);
                decl.vars.extend(vars);
                debug!(host = %name, "merged host_vars file");
            }
            None => {
                return Err(CompileError::Schema {
                    path: format!("host_vars/{}.yml", name),
                    message: format!("references undeclared host '{}'", name),
                });
            }
        }
    }
    Ok(())
}

/// Read every YAML file in a scope-vars directory as `(stem, vars)`, in
/// sorted filename order. A missing directory is fine.
fn scope_var_files(dir: &Path) -> Result<Vec<(String, VarMap)>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_yaml(p) && !is_dotfile(p))
        .collect();
    paths.sort();

    for path in paths {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let contents = fs::read_to_string(&path)?;
        let vars: VarMap = serde_yaml::from_str(&contents).map_err(|e| CompileError::Schema {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        files.push((stem, vars));
    }
    Ok(files)
}

/// Scan the rules directory for template files, in sorted path order.
///
/// Template declaration order is the sorted file order; it fixes the
/// group order inside each output document.
pub fn load_templates(dir: &Path) -> Result<Vec<RuleTemplate>> {
    if !dir.is_dir() {
        return Err(CompileError::Schema {
            path: dir.display().to_string(),
            message: "rules directory not found".to_string(),
        });
    }

    let mut templates: Vec<RuleTemplate> = Vec::new();

    let mut paths: Vec<_> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_yaml(path) && !is_dotfile(path))
        .collect();
    paths.sort();

    for path in paths {
        let contents = fs::read_to_string(&path)?;
        let template: RuleTemplate =
            serde_yaml::from_str(&contents).map_err(|e| CompileError::Schema {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        if templates.iter().any(|t| t.name == template.name) {
            return Err(CompileError::Schema {
                path: path.display().to_string(),
                message: format!("duplicate template name '{}'", template.name),
            });
        }

        debug!(template = %template.name, path = %path.display(), "loaded template");
        templates.push(template);
    }

    info!(count = templates.len(), dir = %dir.display(), "loaded templates");
    Ok(templates)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

//! Variable resolution across global, group, and host scopes.
//!
//! Precedence, lowest to highest: global defaults < group variables
//! (ancestors first, descendants override) < host variables. The ancestor
//! order comes from [`Inventory::ancestor_groups`] and is applied in
//! reverse, so the most general group lands first and each re-application
//! overwrites earlier values for the same key.

use serde::Serialize;

use alertbook_core::CompileOptions;

use crate::model::{Host, Inventory, VarMap};

/// The effective variable set for exactly one host.
///
/// Immutable once produced; key order is deterministic given the same
/// input declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableSet {
    vars: VarMap,
}

impl VariableSet {
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.vars.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Resolve the variable set for one host.
///
/// Pure with respect to the (immutable) inventory: same input, same
/// output. Missing variables are not an error here; absence only surfaces
/// at render time.
pub fn resolve(inventory: &Inventory, host: &Host, options: &CompileOptions) -> VariableSet {
    let mut vars = inventory.defaults().clone();

    let ancestors = inventory.ancestor_groups(host);
    for gid in ancestors.iter().rev() {
        if let Some(group) = inventory.group(gid) {
            apply(&mut vars, &group.vars, options.deep_merge);
        }
    }

    apply(&mut vars, &host.vars, options.deep_merge);

    tracing::trace!(host = %host.id, keys = vars.len(), "resolved variable set");
    VariableSet { vars }
}

/// Overlay one scope onto the accumulated set.
///
/// Shallow by default: any key present in the overlay replaces the
/// accumulated value wholesale. In deep-merge mode, mapping-over-mapping
/// merges recursively; scalars and lists still replace.
fn apply(target: &mut VarMap, overlay: &VarMap, deep: bool) {
    for (key, value) in overlay {
        let merged = match target.get(key) {
            Some(existing) if deep && existing.is_mapping() && value.is_mapping() => {
                deep_merge(existing, value)
            }
            _ => value.clone(),
        };
        target.insert(key.clone(), merged);
    }
}

/// Deep-merge two YAML values: descendant fields win, arrays replace
/// entirely.
///
/// For map values: recursively merge. For all other types (scalars,
/// arrays): the descendant value replaces the ancestor one.
pub fn deep_merge(ancestor: &serde_yaml::Value, descendant: &serde_yaml::Value) -> serde_yaml::Value {
    match (ancestor, descendant) {
        (serde_yaml::Value::Mapping(am), serde_yaml::Value::Mapping(dm)) => {
            let mut merged = am.clone();
            for (key, dval) in dm {
                if let Some(aval) = am.get(key) {
                    merged.insert(key.clone(), deep_merge(aval, dval));
                } else {
                    merged.insert(key.clone(), dval.clone());
                }
            }
            serde_yaml::Value::Mapping(merged)
        }
        // For scalars, arrays, etc.: descendant wins.
        (_, descendant) => descendant.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InventoryDoc;

    fn inventory(yaml: &str) -> Inventory {
        let doc: InventoryDoc = serde_yaml::from_str(yaml).unwrap();
        Inventory::from_doc(doc).unwrap()
    }

    fn resolve_for<'a>(inv: &'a Inventory, host: &str, opts: &CompileOptions) -> VariableSet {
        resolve(inv, inv.host(host).unwrap(), opts)
    }

    fn str_var(set: &VariableSet, key: &str) -> Option<String> {
        set.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    #[test]
    fn worked_example_precedence() {
        // Host db1 in group db (port: 5432) in group prod (retention: 30d);
        // global default retention 15d; host var alertname.
        let inv = inventory(
            r#"
hosts:
  db1:
    groups: [db]
    vars:
      alertname: DBDown
groups:
  db:
    parents: [prod]
    vars:
      port: 5432
  prod:
    vars:
      retention: 30d
defaults:
  retention: 15d
"#,
        );
        let set = resolve_for(&inv, "db1", &CompileOptions::default());
        assert_eq!(set.get("port").and_then(|v| v.as_i64()), Some(5432));
        assert_eq!(str_var(&set, "retention").as_deref(), Some("30d"));
        assert_eq!(str_var(&set, "alertname").as_deref(), Some("DBDown"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn groupless_host_gets_defaults_plus_own_vars() {
        let inv = inventory(
            r#"
hosts:
  lonely:
    vars:
      who: me
defaults:
  retention: 15d
"#,
        );
        let set = resolve_for(&inv, "lonely", &CompileOptions::default());
        assert_eq!(str_var(&set, "retention").as_deref(), Some("15d"));
        assert_eq!(str_var(&set, "who").as_deref(), Some("me"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn host_vars_beat_every_group() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [g]
    vars:
      key: host-wins
groups:
  g:
    vars:
      key: group-value
defaults:
  key: default-value
"#,
        );
        let set = resolve_for(&inv, "h1", &CompileOptions::default());
        assert_eq!(str_var(&set, "key").as_deref(), Some("host-wins"));
    }

    #[test]
    fn descendant_group_overrides_ancestor() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [child]
groups:
  child:
    parents: [parent]
    vars:
      key: child
  parent:
    vars:
      key: parent
"#,
        );
        let set = resolve_for(&inv, "h1", &CompileOptions::default());
        assert_eq!(str_var(&set, "key").as_deref(), Some("child"));
    }

    #[test]
    fn sibling_order_independent_for_disjoint_keys() {
        let a = inventory(
            "hosts:\n  h1:\n    groups: [g1, g2]\ngroups:\n  g1:\n    vars: {a: 1}\n  g2:\n    vars: {b: 2}\n",
        );
        let b = inventory(
            "hosts:\n  h1:\n    groups: [g2, g1]\ngroups:\n  g2:\n    vars: {b: 2}\n  g1:\n    vars: {a: 1}\n",
        );
        let opts = CompileOptions::default();
        let sa = resolve_for(&a, "h1", &opts);
        let sb = resolve_for(&b, "h1", &opts);
        assert_eq!(sa.get("a"), sb.get("a"));
        assert_eq!(sa.get("b"), sb.get("b"));
    }

    #[test]
    fn first_declared_sibling_wins_shared_key() {
        // Ancestor list is [g1, g2]; applied in reverse, g1 lands last.
        let inv = inventory(
            "hosts:\n  h1:\n    groups: [g1, g2]\ngroups:\n  g1:\n    vars: {key: one}\n  g2:\n    vars: {key: two}\n",
        );
        let set = resolve_for(&inv, "h1", &CompileOptions::default());
        assert_eq!(str_var(&set, "key").as_deref(), Some("one"));
    }

    #[test]
    fn diamond_ancestor_applied_once() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [left, right]
groups:
  base:
    vars:
      key: base
      only_base: yes
  left:
    parents: [base]
  right:
    parents: [base]
    vars:
      key: right
"#,
        );
        let set = resolve_for(&inv, "h1", &CompileOptions::default());
        // base is most general; right overrides it.
        assert_eq!(str_var(&set, "key").as_deref(), Some("right"));
        assert!(set.contains_key("only_base"));
    }

    #[test]
    fn shallow_merge_replaces_mappings() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [g]
    vars:
      labels:
        team: db
groups:
  g:
    vars:
      labels:
        severity: critical
        team: infra
"#,
        );
        let set = resolve_for(&inv, "h1", &CompileOptions::default());
        let labels = set.get("labels").unwrap().as_mapping().unwrap();
        // Host mapping replaced the group mapping wholesale.
        assert_eq!(labels.len(), 1);
        assert!(labels.get("severity").is_none());
    }

    #[test]
    fn deep_merge_combines_mapping_keys() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [g]
    vars:
      labels:
        team: db
groups:
  g:
    vars:
      labels:
        severity: critical
        team: infra
"#,
        );
        let opts = CompileOptions {
            deep_merge: true,
            ..CompileOptions::default()
        };
        let set = resolve_for(&inv, "h1", &opts);
        let labels = set.get("labels").unwrap().as_mapping().unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("severity").and_then(|v| v.as_str()), Some("critical"));
        // Descendant key wins at the nested level.
        assert_eq!(labels.get("team").and_then(|v| v.as_str()), Some("db"));
    }

    #[test]
    fn deep_merge_still_replaces_lists_and_scalars() {
        let inv = inventory(
            r#"
hosts:
  h1:
    groups: [g]
    vars:
      ports: [9090]
      labels: just-a-string
groups:
  g:
    vars:
      ports: [1, 2, 3]
      labels:
        severity: critical
"#,
        );
        let opts = CompileOptions {
            deep_merge: true,
            ..CompileOptions::default()
        };
        let set = resolve_for(&inv, "h1", &opts);
        let ports = set.get("ports").unwrap().as_sequence().unwrap();
        assert_eq!(ports.len(), 1);
        // Scalar into a mapping position: overwrite, no merge.
        assert_eq!(set.get("labels").and_then(|v| v.as_str()), Some("just-a-string"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let inv = inventory(
            "hosts:\n  h1:\n    groups: [g1, g2]\ngroups:\n  g1:\n    vars: {key: one}\n  g2:\n    vars: {key: two, extra: x}\n",
        );
        let opts = CompileOptions::default();
        let first = resolve_for(&inv, "h1", &opts);
        let second = resolve_for(&inv, "h1", &opts);
        assert_eq!(first, second);
        let keys_a: Vec<_> = first.keys().collect();
        let keys_b: Vec<_> = second.keys().collect();
        assert_eq!(keys_a, keys_b);
    }
}

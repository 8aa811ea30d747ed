//! Template documents and the Prometheus alert-rule output schema.
//!
//! A template file is a small YAML document: a `name`, an optional `scope`
//! predicate, and a `template` body. The body is a Jinja-templated YAML
//! list of alert rules, rendered once per matching host.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Template input ──────────────────────────────────────────────────

/// A parameterized rule template, immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTemplate {
    /// Unique template identifier, used as the rule-group name in output.
    pub name: String,
    /// Optional host-matching predicate; absent means "all hosts".
    #[serde(default)]
    pub scope: Option<Scope>,
    /// Jinja-templated YAML body producing a list of alert rules.
    pub template: String,
}

impl RuleTemplate {
    /// Whether this template applies to the given host.
    ///
    /// `ancestors` is the host's full (transitive) group list from the
    /// inventory.
    pub fn applies_to(&self, host_id: &str, ancestors: &[String]) -> bool {
        self.scope
            .as_ref()
            .map_or(true, |scope| scope.matches(host_id, ancestors))
    }
}

/// Scope predicate: a host matches when it appears in `hosts` or belongs
/// (transitively) to any group in `groups`. An empty predicate matches
/// every host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl Scope {
    pub fn matches(&self, host_id: &str, ancestors: &[String]) -> bool {
        if self.groups.is_empty() && self.hosts.is_empty() {
            return true;
        }
        if self.hosts.iter().any(|h| h == host_id) {
            return true;
        }
        self.groups
            .iter()
            .any(|g| ancestors.iter().any(|a| a == g))
    }
}

// ── Rendered output (Prometheus schema) ─────────────────────────────

/// A named rule group in a Prometheus rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<AlertRule>,
}

/// One alerting rule, per the Prometheus alerting schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub alert: String,
    pub expr: String,
    /// Prometheus `for:` hold duration, e.g. `30d` or `1h30m`.
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<IndexMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ancestors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unscoped_template_matches_everything() {
        let tpl: RuleTemplate = serde_yaml::from_str(
            "name: base\ntemplate: |\n  - alert: A\n    expr: up == 0\n",
        )
        .unwrap();
        assert!(tpl.applies_to("db1", &ancestors(&["db", "prod"])));
        assert!(tpl.applies_to("anything", &[]));
    }

    #[test]
    fn group_scope_matches_transitive_membership() {
        let tpl: RuleTemplate = serde_yaml::from_str(
            "name: prod-only\nscope:\n  groups: [prod]\ntemplate: x\n",
        )
        .unwrap();
        // db1 is in db which is in prod; ancestors carries the expansion.
        assert!(tpl.applies_to("db1", &ancestors(&["db", "prod"])));
        assert!(!tpl.applies_to("dev1", &ancestors(&["dev"])));
    }

    #[test]
    fn host_scope_matches_by_id() {
        let tpl: RuleTemplate =
            serde_yaml::from_str("name: pinned\nscope:\n  hosts: [db1]\ntemplate: x\n").unwrap();
        assert!(tpl.applies_to("db1", &[]));
        assert!(!tpl.applies_to("db2", &[]));
    }

    #[test]
    fn empty_scope_block_matches_everything() {
        let tpl: RuleTemplate =
            serde_yaml::from_str("name: t\nscope: {}\ntemplate: x\n").unwrap();
        assert!(tpl.applies_to("any", &[]));
    }

    #[test]
    fn alert_rule_round_trips_through_yaml() {
        let yaml = r#"
alert: DBDown
expr: "up{job='5432'} == 0"
for: 30d
labels:
  severity: critical
annotations:
  summary: database down
"#;
        let rule: AlertRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.alert, "DBDown");
        assert_eq!(rule.for_.as_deref(), Some("30d"));

        let out = serde_yaml::to_string(&rule).unwrap();
        let reparsed: AlertRule = serde_yaml::from_str(&out).unwrap();
        assert_eq!(rule, reparsed);
    }

    #[test]
    fn optional_fields_omitted_from_output() {
        let rule = AlertRule {
            alert: "A".to_string(),
            expr: "up == 0".to_string(),
            for_: None,
            labels: None,
            annotations: None,
        };
        let out = serde_yaml::to_string(&rule).unwrap();
        assert!(!out.contains("for"));
        assert!(!out.contains("labels"));
        assert!(!out.contains("annotations"));
    }
}

//! Output-schema validation of rendered alert rules.
//!
//! Checks the constraints the Prometheus loader would reject: empty alert
//! names or expressions, malformed `for:` durations, and duplicate alert
//! names within one group. Violations are collected, not thrown — one bad
//! pair must not abort the rest of the run.

use std::collections::HashSet;

use alertbook_core::CompileError;

use crate::schema::AlertRule;

/// Validate one rendered rule list (one (host, template) pair).
///
/// Returns every violated constraint, each carrying the host and template
/// identifiers.
pub fn validate_rules(rules: &[AlertRule], host: &str, template: &str) -> Vec<CompileError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    let violation = |constraint: String| CompileError::Validation {
        host: host.to_string(),
        template: template.to_string(),
        constraint,
    };

    if rules.is_empty() {
        errors.push(violation("template rendered zero rules".to_string()));
    }

    for (idx, rule) in rules.iter().enumerate() {
        if rule.alert.trim().is_empty() {
            errors.push(violation(format!("rules[{}]: alert name must not be empty", idx)));
        }
        if rule.expr.trim().is_empty() {
            errors.push(violation(format!(
                "rules[{}] ({}): expr must not be empty",
                idx, rule.alert
            )));
        }
        if let Some(duration) = rule.for_.as_deref() {
            if !is_valid_duration(duration) {
                errors.push(violation(format!(
                    "rules[{}] ({}): malformed duration '{}'",
                    idx, rule.alert, duration
                )));
            }
        }
        if !rule.alert.trim().is_empty() && !seen.insert(rule.alert.as_str()) {
            errors.push(violation(format!(
                "duplicate rule name '{}' within one group",
                rule.alert
            )));
        }
    }

    errors
}

/// Prometheus duration syntax: one or more `<digits><unit>` tokens with
/// strictly descending units (`y w d h m s ms`), or the literal `0`.
pub fn is_valid_duration(s: &str) -> bool {
    if s == "0" {
        return true;
    }

    fn unit_rank(unit: &str) -> Option<u8> {
        match unit {
            "y" => Some(6),
            "w" => Some(5),
            "d" => Some(4),
            "h" => Some(3),
            "m" => Some(2),
            "s" => Some(1),
            "ms" => Some(0),
            _ => None,
        }
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    let mut prev_rank: Option<u8> = None;
    let mut any = false;

    while i < bytes.len() {
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return false;
        }

        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let rank = match unit_rank(&s[unit_start..i]) {
            Some(rank) => rank,
            None => return false,
        };

        if let Some(prev) = prev_rank {
            if rank >= prev {
                return false;
            }
        }
        prev_rank = Some(rank);
        any = true;
    }

    any
}

//! Minijinja rendering of template bodies against resolved variable sets.
//!
//! Bodies are arbitrary strings (not pre-registered files), so a fresh
//! [`minijinja::Environment`] is created per call. Undefined behavior is
//! strict: a placeholder with no binding and no `| default(...)` fails the
//! render instead of silently producing empty output. Rendering is pure:
//! no I/O, no global state.

use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use alertbook_core::{CompileError, Result};
use alertbook_inventory::VariableSet;

use crate::schema::{AlertRule, RuleTemplate};

/// Build a strict-undefined environment.
///
/// Strict mode still permits `is defined` tests and the `default` filter,
/// which is exactly the escape hatch templates may declare per placeholder.
fn build_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Check a template body for syntax errors without evaluating it.
pub fn check_syntax(template: &RuleTemplate) -> Result<()> {
    let env = build_env();
    env.template_from_str(&template.template)
        .map(|_| ())
        .map_err(|e| syntax_error(&template.name, &e))
}

/// Render one template body against one variable set and parse the result
/// into alert rules.
///
/// Same (template, variable set) pair always yields the same output.
pub fn render(template: &RuleTemplate, vars: &VariableSet, host_id: &str) -> Result<Vec<AlertRule>> {
    let env = build_env();
    let compiled = env
        .template_from_str(&template.template)
        .map_err(|e| syntax_error(&template.name, &e))?;

    let rendered = match compiled.render(vars) {
        Ok(text) => text,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::UndefinedError) {
                return Err(undefined_variable(template, vars, host_id, &compiled, &e));
            }
            return Err(syntax_error(&template.name, &e));
        }
    };

    // The rendered body must be a YAML list of alert rules. A body that
    // renders to something else is an output-schema violation for this
    // pair, not a structural failure of the whole run.
    serde_yaml::from_str(&rendered).map_err(|e| CompileError::Validation {
        host: host_id.to_string(),
        template: template.name.clone(),
        constraint: format!("rendered body is not a valid rule list: {}", e),
    })
}

fn syntax_error(template: &str, err: &minijinja::Error) -> CompileError {
    CompileError::TemplateSyntax {
        template: template.to_string(),
        line: err.line(),
        message: err.to_string(),
    }
}

/// Pinpoint which placeholder(s) had no binding.
///
/// The engine's own error names the failing expression, not the variable,
/// so cross-reference the template's undeclared variables with the
/// resolved set.
fn undefined_variable(
    template: &RuleTemplate,
    vars: &VariableSet,
    host_id: &str,
    compiled: &minijinja::Template<'_, '_>,
    err: &minijinja::Error,
) -> CompileError {
    let mut missing: Vec<String> = compiled
        .undeclared_variables(false)
        .into_iter()
        .filter(|name| !vars.contains_key(name))
        .collect();
    missing.sort();

    let variable = if missing.is_empty() {
        // Nested attribute access; fall back to the engine's message.
        err.to_string()
    } else {
        missing.join(", ")
    };

    CompileError::UndefinedVariable {
        host: host_id.to_string(),
        template: template.name.clone(),
        variable,
    }
}

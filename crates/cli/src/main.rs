mod cli;
mod loader;
mod writer;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use alertbook_core::{CompileError, CompileOptions};
use alertbook_rules::Compiler;

use crate::cli::CliArgs;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    match run(&args) {
        Ok(issues) if issues.is_empty() => {}
        Ok(issues) => {
            report(&issues);
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "compilation aborted");
            eprintln!("alertbook: fatal: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Load inputs, compile, write outputs. Returns the collected per-target
/// errors; fatal structural errors come back as `Err`.
fn run(args: &CliArgs) -> Result<Vec<CompileError>> {
    let doc = loader::load_inventory(&args.inventory)
        .with_context(|| format!("failed to load inventory {}", args.inventory.display()))?;
    let templates = loader::load_templates(&args.rules)
        .with_context(|| format!("failed to load templates from {}", args.rules.display()))?;

    let options = CompileOptions {
        deep_merge: args.deep_merge,
        group_by: args.group_by,
    };

    let mut compiler = Compiler::new(doc, templates, options);
    let compilation = compiler.compile()?;

    writer::write_documents(&compilation.documents, args.out.as_deref())?;
    Ok(compilation.issues)
}

/// Print the consolidated error report for collected per-target errors.
fn report(issues: &[CompileError]) {
    eprintln!("alertbook: compilation finished with {} error(s):", issues.len());
    for issue in issues {
        eprintln!("  - {}", issue);
    }
}

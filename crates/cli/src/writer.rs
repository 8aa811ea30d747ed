//! Output document serialization to disk or stdout.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use alertbook_rules::OutputDocument;

/// Write every document to `<out_dir>/<name>.rules.yml`, or to stdout as
/// a YAML stream when no directory is given.
pub fn write_documents(documents: &[OutputDocument], out_dir: Option<&Path>) -> Result<()> {
    match out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;
            for doc in documents {
                let path = dir.join(format!("{}.rules.yml", doc.name));
                fs::write(&path, doc.to_yaml()?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), groups = doc.groups.len(), "wrote rule file");
            }
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for doc in documents {
                writeln!(out, "---")?;
                writeln!(out, "# {}", doc.name)?;
                out.write_all(doc.to_yaml()?.as_bytes())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertbook_rules::{AlertRule, RuleGroup};
    use tempfile::TempDir;

    fn sample(name: &str) -> OutputDocument {
        OutputDocument {
            name: name.to_string(),
            groups: vec![RuleGroup {
                name: "g".to_string(),
                rules: vec![AlertRule {
                    alert: "A".to_string(),
                    expr: "up == 0".to_string(),
                    for_: None,
                    labels: None,
                    annotations: None,
                }],
            }],
        }
    }

    #[test]
    fn writes_one_file_per_document() {
        let dir = TempDir::new().unwrap();
        let docs = vec![sample("db1"), sample("web1")];

        write_documents(&docs, Some(dir.path())).unwrap();

        let db1 = dir.path().join("db1.rules.yml");
        let web1 = dir.path().join("web1.rules.yml");
        assert!(db1.exists());
        assert!(web1.exists());

        let contents = fs::read_to_string(db1).unwrap();
        assert!(contents.starts_with("groups:"));
        assert!(contents.contains("alert: A"));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("build").join("rules");

        write_documents(&[sample("db1")], Some(&nested)).unwrap();
        assert!(nested.join("db1.rules.yml").exists());
    }

    #[test]
    fn rerun_produces_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let docs = vec![sample("db1")];

        write_documents(&docs, Some(dir.path())).unwrap();
        let first = fs::read(dir.path().join("db1.rules.yml")).unwrap();
        write_documents(&docs, Some(dir.path())).unwrap();
        let second = fs::read(dir.path().join("db1.rules.yml")).unwrap();
        assert_eq!(first, second);
    }
}

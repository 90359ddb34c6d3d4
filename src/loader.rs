//! YAML rule loading.
//!
//! Rule files are YAML sequences of mappings. A rule directory is read
//! recursively: every `*.yaml` file is loaded in path order and the records
//! are concatenated, so rule numbers follow file order and then position
//! within the file. Hidden directories are skipped; dot-named files are loaded.

use crate::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Parse a YAML sequence of rule records. An empty document yields no rules.
///
/// # Examples
///
/// ```rust
/// use package_transform::loader::load_rules_from_str;
///
/// let records = load_rules_from_str("- { name: foo, ignore: true }\n- { devel: true }")?;
/// assert_eq!(records.len(), 2);
/// # Ok::<(), package_transform::TransformError>(())
/// ```
pub fn load_rules_from_str(yaml: &str) -> Result<Vec<Mapping>> {
    parse_records(yaml, 0)
}

/// Load every `*.yaml` file under `dir`, sorted by path.
pub fn load_rules_from_dir(dir: impl AsRef<Path>) -> Result<Vec<Mapping>> {
    let dir = dir.as_ref();
    let mut records = Vec::new();

    for path in rule_files(dir)? {
        let text = std::fs::read_to_string(&path).map_err(|source| TransformError::Io {
            path: path.clone(),
            source,
        })?;
        let file_records = parse_records(&text, records.len())?;
        debug!(path = %path.display(), rules = file_records.len(), "loaded rule file");
        records.extend(file_records);
    }

    Ok(records)
}

fn parse_records(yaml: &str, first_number: usize) -> Result<Vec<Mapping>> {
    let items: Option<Vec<Value>> = serde_yaml::from_str(yaml)?;

    items
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(TransformError::NotAMapping {
                rule: first_number + i,
            }),
        })
        .collect()
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e))
    {
        let entry = entry.map_err(|err| TransformError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;

        let path = entry.path();
        if entry.file_type().is_file() && path.extension().map(|e| e == "yaml").unwrap_or(false) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_str() {
        let records = load_rules_from_str(
            "
- name: foo
  setname: bar
- { devel: true }
",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("setname").and_then(Value::as_str), Some("bar"));
    }

    #[test]
    fn test_empty_document() {
        assert!(load_rules_from_str("").unwrap().is_empty());
        assert!(load_rules_from_str("# only a comment\n").unwrap().is_empty());
        assert!(load_rules_from_str("[]").unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_record() {
        let err = load_rules_from_str("- { name: foo }\n- just a string").unwrap_err();
        assert!(matches!(err, TransformError::NotAMapping { rule: 1 }));
    }

    #[test]
    fn test_not_a_sequence() {
        let err = load_rules_from_str("name: foo").unwrap_err();
        assert!(matches!(err, TransformError::Yaml(_)));
    }

    #[test]
    fn test_load_from_dir_in_path_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("900.final")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("100.first.yaml"), "- { name: a }\n- { name: b }").unwrap();
        fs::write(root.join("900.final/000.yaml"), "- { name: c }").unwrap();
        fs::write(root.join("500.middle.yaml"), "- { name: m }").unwrap();
        fs::write(root.join("README.md"), "not rules").unwrap();
        fs::write(root.join(".git/ignored.yaml"), "- { name: hidden }").unwrap();
        fs::write(root.join(".dotfile.yaml"), "- { name: dot }").unwrap();
        fs::write(root.join("900.final/.late.yaml"), "- { name: late }").unwrap();

        let records = load_rules_from_dir(root).unwrap();
        let names: Vec<&str> = records
            .iter()
            .filter_map(|r| r.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["dot", "a", "b", "m", "late", "c"]);
    }

    #[test]
    fn test_numbering_continues_across_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.yaml"), "- { name: a }").unwrap();
        fs::write(temp.path().join("b.yaml"), "- { name: b }\n- 42").unwrap();

        let err = load_rules_from_dir(temp.path()).unwrap_err();
        assert!(matches!(err, TransformError::NotAMapping { rule: 2 }));
    }

    #[test]
    fn test_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = load_rules_from_dir(temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, TransformError::Io { .. }));
    }
}

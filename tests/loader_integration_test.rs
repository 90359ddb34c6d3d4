//! Integration tests for loading rule trees from disk.

use package_transform::{
    load_rules_from_dir, Package, PackageFlag, PackageTransformer, RepositoryMap, TransformError,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn rules_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/rules")
}

fn transformer() -> PackageTransformer {
    let records = load_rules_from_dir(rules_dir()).expect("Failed to load tests/rules");
    PackageTransformer::builder()
        .with_repositories(RepositoryMap::new().with_repository("freebsd", ["freebsd"]))
        .build(records)
        .expect("Failed to compile tests/rules")
}

#[test]
fn test_rule_tree_loads_in_path_order() {
    let t = transformer();

    // hidden directories are skipped, nested directories are included
    assert_eq!(t.rule_count(), 11);

    let pretty: Vec<&str> = t.rules().iter().map(|r| r.pretty()).collect();
    assert!(pretty[0].contains("firefox-esr"));
    assert!(pretty[3].contains("esr"));
    assert!(pretty[6].contains("pypi_synced"));
    assert!(pretty[8].contains("sourceforge.net"));
    for (i, rule) in t.rules().iter().enumerate() {
        assert_eq!(rule.number(), i);
    }
}

#[test]
fn test_rules_from_several_files_cooperate() {
    let mut t = transformer();

    let mut firefox = Package::new("debian", "firefox-esr", "115.6.0esr");
    t.process(&mut firefox);
    assert_eq!(firefox.effname(), "firefox");
    assert_eq!(firefox.version, "115.6.0");
    // the final file stops before the remove rule
    assert!(!firefox.has_flag(PackageFlag::Remove));

    let mut requests = Package::new("debian", "py312-requests", "2.31.0");
    t.process(&mut requests);
    assert_eq!(requests.effname(), "python:requests");
    assert_eq!(requests.flavors, vec!["py312-requests"]);
    assert!(requests.has_flag(PackageFlag::Rolling));
}

#[test]
fn test_legacy_family_gates_like_ruleset() {
    let mut t = transformer();

    let mut bsd = Package::new("freebsd", "openssl", "3.0.13.1");
    t.process(&mut bsd);
    assert!(bsd.has_flag(PackageFlag::Outdated));
    assert!(bsd.has_flag(PackageFlag::Ignore));

    let mut deb = Package::new("debian", "openssl", "3.0.13.1");
    t.process(&mut deb);
    assert!(deb.has_flag(PackageFlag::Outdated));
    assert!(!deb.has_flag(PackageFlag::Ignore));
}

#[test]
fn test_broken_file_reports_global_rule_number() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "- { name: a }\n- { name: b }").unwrap();
    fs::write(temp.path().join("b.yaml"), "- { name: c, bogus: 1 }").unwrap();

    let records = load_rules_from_dir(temp.path()).unwrap();
    match PackageTransformer::new(records) {
        Err(TransformError::UnknownField { rule, field }) => {
            assert_eq!(rule, 2);
            assert_eq!(field, "bogus");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("bogus field should be rejected"),
    }
}

#[test]
fn test_invalid_yaml_in_tree() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("broken.yaml"), "- { name: [unclosed").unwrap();

    let err = load_rules_from_dir(temp.path()).unwrap_err();
    assert!(matches!(err, TransformError::Yaml(_)));
}

#[test]
fn test_empty_tree() {
    let temp = TempDir::new().unwrap();
    let records = load_rules_from_dir(temp.path()).unwrap();
    assert!(records.is_empty());

    let mut t = PackageTransformer::new(records).unwrap();
    let mut package = Package::new("any", "thing", "1");
    t.process(&mut package);
    assert_eq!(package.effname(), "thing");
    assert!(t.unmatched_rules().is_empty());
}

// Tests for lockfile and manifest parsing

use super::*;
use std::fs;
use tempfile::TempDir;

const PIPFILE_LOCK: &str = r#"{
    "_meta": {
        "hash": {"sha256": "abc"},
        "pipfile-spec": 6,
        "requires": {"python_version": "3.11"},
        "sources": [{"name": "pypi", "url": "https://pypi.org/simple", "verify_ssl": true}]
    },
    "default": {
        "flask": {"hashes": ["sha256:1"], "index": "pypi", "version": "==2.3.2"},
        "zope.interface": {"hashes": [], "version": "==6.0", "markers": "python_version >= '3.7'"},
        "mylib": {"editable": true, "path": "."}
    },
    "develop": {
        "pytest": {"hashes": [], "version": "==7.4.0"},
        "flask": {"hashes": [], "version": "==0.1"}
    }
}"#;

const PIPFILE: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
flask = "*"
"Zope.Interface" = { version = ">=5.0", extras = ["test"] }

[dev-packages]
pytest = ">=7"

[requires]
python_version = "3.11"
"#;

#[test]
fn test_parse_default_section_only() {
    let lockfile = Lockfile::from_pipfile_lock_str(PIPFILE_LOCK, false).unwrap();
    assert_eq!(lockfile.len(), 3);
    assert!(lockfile.contains("flask"));
    assert!(lockfile.contains("zope-interface"));
    assert!(!lockfile.contains("pytest"));
}

#[test]
fn test_develop_section_does_not_override_default_pins() {
    let lockfile = Lockfile::from_pipfile_lock_str(PIPFILE_LOCK, true).unwrap();
    assert!(lockfile.contains("pytest"));

    let pins = lockfile.pinned();
    assert!(pins.contains(&("flask".to_string(), "2.3.2".to_string())));
    assert!(pins.contains(&("pytest".to_string(), "7.4.0".to_string())));
}

#[test]
fn test_unpinned_entries_are_skipped() {
    let lockfile = Lockfile::from_pipfile_lock_str(PIPFILE_LOCK, false).unwrap();
    let pins = lockfile.pinned();
    assert_eq!(pins.len(), 2);
    assert!(pins.iter().all(|(name, _)| name != "mylib"));
}

#[test]
fn test_missing_default_section() {
    let result = Lockfile::from_pipfile_lock_str(r#"{"develop": {}}"#, false);
    assert!(matches!(result, Err(LockfileError::MissingSection { .. })));
}

#[test]
fn test_invalid_json() {
    let result = Lockfile::from_pipfile_lock_str("{not json", false);
    assert!(matches!(result, Err(LockfileError::JsonParseError { .. })));
}

#[test]
fn test_from_pins_normalizes_versions() {
    let lockfile = Lockfile::from_pins([("six", "==1.16.0"), ("idna", "3.4")]);
    assert_eq!(
        lockfile.pinned(),
        vec![
            ("idna".to_string(), "3.4".to_string()),
            ("six".to_string(), "1.16.0".to_string()),
        ]
    );
}

#[test]
fn test_manifest_parsing_and_canonical_ids() {
    let manifest = Manifest::from_pipfile_str(PIPFILE, false).unwrap();
    assert_eq!(manifest.len(), 2);
    assert!(manifest.ids().contains("flask"));
    assert!(manifest.ids().contains("zope-interface"));
    assert!(!manifest.ids().contains("pytest"));

    let with_dev = Manifest::from_pipfile_str(PIPFILE, true).unwrap();
    assert!(with_dev.ids().contains("pytest"));
}

#[test]
fn test_invalid_manifest_toml() {
    let result = Manifest::from_pipfile_str("[packages\nflask = ", false);
    assert!(matches!(result, Err(LockfileError::TomlParseError { .. })));
}

#[test]
fn test_load_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("Pipfile.lock");
    let pipfile_path = temp_dir.path().join("Pipfile");
    fs::write(&lock_path, PIPFILE_LOCK).unwrap();
    fs::write(&pipfile_path, PIPFILE).unwrap();

    assert_eq!(Lockfile::load(&lock_path, false).unwrap().len(), 3);
    assert_eq!(Manifest::load(&pipfile_path, false).unwrap().len(), 2);

    let missing = Lockfile::load(&temp_dir.path().join("nope.lock"), false);
    assert!(matches!(missing, Err(LockfileError::FileReadError { .. })));
}

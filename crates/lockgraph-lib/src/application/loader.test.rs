use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_env_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.env");
    assert!(load_env_files(&[missing.to_str().unwrap()]).is_ok());
}

#[test]
fn test_env_file_does_not_override_existing_variables() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join(".env.local");
    let shared = temp.path().join(".env");
    fs::write(&local, "LOCKGRAPH_LOADER_TEST_A=local\n").unwrap();
    fs::write(
        &shared,
        "LOCKGRAPH_LOADER_TEST_A=shared\nLOCKGRAPH_LOADER_TEST_B=shared\n",
    )
    .unwrap();

    load_env_files(&[local.to_str().unwrap(), shared.to_str().unwrap()]).unwrap();

    assert_eq!(std::env::var("LOCKGRAPH_LOADER_TEST_A").unwrap(), "local");
    assert_eq!(std::env::var("LOCKGRAPH_LOADER_TEST_B").unwrap(), "shared");
}

#[test]
fn test_global_config_initializes_once() {
    let config = AppConfig {
        jobs: 2,
        ..AppConfig::default()
    };

    AppConfig::init_global(config.clone()).unwrap();
    assert_eq!(AppConfig::global().map(|c| c.jobs), Some(2));
    assert!(matches!(
        AppConfig::init_global(config),
        Err(ConfigError::AlreadyInitialized)
    ));
}

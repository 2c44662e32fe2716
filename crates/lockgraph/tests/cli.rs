//! Binary-level tests: the `lockgraph` executable against mockito services

use assert_cmd::Command;
use mockito::{Matcher, Server, ServerGuard};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PIPFILE: &str = r#"
[packages]
flask = "*"
"#;

const LOCK: &str = r#"{
    "default": {
        "flask": {"version": "==2.3.2"},
        "click": {"version": "==8.1.7"}
    },
    "develop": {}
}"#;

fn project(lock: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Pipfile"), PIPFILE).unwrap();
    fs::write(dir.path().join("Pipfile.lock"), lock).unwrap();
    dir
}

fn serve_metadata(server: &mut ServerGuard) {
    for (name, version, requires) in [
        ("flask", "2.3.2", vec!["click>=8.1.3"]),
        ("click", "8.1.7", vec![]),
    ] {
        let body = serde_json::json!({
            "metadata": {
                "name": name,
                "version": version,
                "requires_dist": requires,
                "license": "BSD-3-Clause",
            }
        });
        server
            .mock("GET", "/python/package/metadata")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".to_string(), name.to_string()),
                Matcher::UrlEncoded("version".to_string(), version.to_string()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create();
    }
}

fn lockgraph(dir: &TempDir, server: &ServerGuard) -> Command {
    let mut cmd = Command::cargo_bin("lockgraph").unwrap();
    cmd.current_dir(dir.path())
        .env("LOCKGRAPH_THOTH_URL", server.url())
        .env("LOCKGRAPH_LICENSE_URL", format!("{}/licenses.json", server.url()))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("lockgraph")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("graph"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("metrics"))
        .stdout(predicate::str::contains("why"));
}

#[test]
fn graph_prints_json() {
    let dir = project(LOCK);
    let mut server = Server::new();
    serve_metadata(&mut server);

    let output = lockgraph(&dir, &server)
        .args(["--output", "json-compact", "graph"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = document["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["*App", "click", "flask"]);
    assert_eq!(document["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn metrics_without_license_registry_still_succeeds() {
    let dir = project(LOCK);
    let mut server = Server::new();
    serve_metadata(&mut server);
    server.mock("GET", "/licenses.json").with_status(500).create();

    lockgraph(&dir, &server)
        .arg("metrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"_found\": false"));
}

#[test]
fn missing_lockfile_fails() {
    let dir = project(LOCK);
    let server = Server::new();

    lockgraph(&dir, &server)
        .args(["graph", "--lock", "absent.lock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load lockfile"));
}

#[test]
fn empty_lockfile_reports_no_packages() {
    let dir = project(r#"{"default": {}}"#);
    let server = Server::new();

    lockgraph(&dir, &server)
        .arg("graph")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no packages found"));
}

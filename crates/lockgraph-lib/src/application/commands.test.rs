use super::*;
use crate::api::thoth::MockMetadataSource;
use crate::networking::{NetworkingConfig, NetworkingManager};
use crate::stack::package::PackageMetadata;
use mockito::Server;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

// ===== TEST UTILITIES =====

const PIPFILE: &str = r#"
[packages]
flask = "*"

[dev-packages]
pytest = "*"
"#;

const LOCK_V1: &str = r#"{
    "_meta": {"hash": {"sha256": "0"}},
    "default": {
        "flask": {"version": "==2.3.2"},
        "click": {"version": "==8.1.3"},
        "itsdangerous": {"version": "==2.1.2"}
    },
    "develop": {
        "pytest": {"version": "==7.4.0"}
    }
}"#;

const LOCK_V2: &str = r#"{
    "default": {
        "flask": {"version": "==2.3.2"},
        "click": {"version": "==8.1.7"},
        "blinker": {"version": "==1.6.2"}
    },
    "develop": {}
}"#;

const LICENSES: &str = r#"{
    "licenseListVersion": "3.21",
    "licenses": [
        {"licenseId": "BSD-3-Clause", "name": "BSD 3-Clause \"New\" or \"Revised\" License", "isOsiApproved": true, "isFsfLibre": true},
        {"licenseId": "MIT", "name": "MIT License", "isOsiApproved": true, "isFsfLibre": true}
    ]
}"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Pipfile"), PIPFILE).unwrap();
        fs::write(dir.path().join("v1.lock"), LOCK_V1).unwrap();
        fs::write(dir.path().join("v2.lock"), LOCK_V2).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn args(&self, lock: &str) -> ProjectArgs {
        ProjectArgs {
            manifest: self.path("Pipfile"),
            lock: self.path(lock),
            dev: false,
        }
    }
}

async fn source() -> MockMetadataSource {
    MockMetadataSource::new()
        .with_package(
            PackageMetadata::new("Flask", "2.3.2")
                .with_requirement("click>=8.1.3")
                .with_requirement("itsdangerous>=2.1.2")
                .with_requirement("blinker>=1.6.2")
                .with_requirement("asgiref>=3.2 ; extra == 'async'")
                .with_license("BSD-3-Clause"),
        )
        .await
        .with_package(PackageMetadata::new("click", "8.1.3").with_license("BSD-3-Clause"))
        .await
        .with_package(PackageMetadata::new("click", "8.1.7").with_license("BSD-3-Clause"))
        .await
        .with_package(PackageMetadata::new("itsdangerous", "2.1.2").with_license("BSD"))
        .await
        .with_package(PackageMetadata::new("blinker", "1.6.2").with_license("MIT License"))
        .await
        .with_package(PackageMetadata::new("pytest", "7.4.0").with_license("MIT"))
        .await
}

fn session(
    source: MockMetadataSource,
    license_url: String,
) -> (CommandSession<MockMetadataSource>, Arc<MockMetadataSource>) {
    let config = AppConfig {
        license_url,
        ..AppConfig::default()
    };
    let networking = Arc::new(NetworkingManager::new(NetworkingConfig::default()).unwrap());
    let source = Arc::new(source);
    (
        CommandSession::with_source(config, networking, source.clone()),
        source,
    )
}

// ===== HANDLE_GRAPH TESTS =====

mod handle_graph_tests {
    use super::*;

    #[tokio::test]
    async fn it_prints_nodes_and_edges() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let document = execute_command_with_session(
            Commands::Graph {
                project: project.args("v1.lock"),
            },
            &session,
        )
        .await
        .unwrap();

        let nodes = document["nodes"].as_array().unwrap();
        let ids: Vec<_> = nodes.iter().map(|n| n["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["*App", "click", "flask", "itsdangerous"]);

        let flask = &nodes[2];
        assert_eq!(flask["depth"], 0);
        assert_eq!(flask["version"], "2.3.2");
        assert_eq!(document["edges"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn it_includes_dev_packages_on_request() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let mut args = project.args("v1.lock");
        args.dev = true;
        let document = execute_command_with_session(Commands::Graph { project: args }, &session)
            .await
            .unwrap();

        let ids: Vec<_> = document["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap().to_string())
            .collect();
        assert!(ids.contains(&"pytest".to_string()));
    }

    #[tokio::test]
    async fn it_reports_an_empty_lockfile() {
        let project = Project::new();
        fs::write(project.path("empty.lock"), r#"{"default": {}}"#).unwrap();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let err = execute_command_with_session(
            Commands::Graph {
                project: project.args("empty.lock"),
            },
            &session,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("no packages found"));
    }

    #[tokio::test]
    async fn it_fails_when_metadata_is_missing() {
        let project = Project::new();
        let (session, _) = session(MockMetadataSource::new(), "http://127.0.0.1:9/licenses.json".into());

        let err = execute_command_with_session(
            Commands::Graph {
                project: project.args("v1.lock"),
            },
            &session,
        )
        .await
        .unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("Failed to resolve"));
        assert!(chain.contains("error occurred while fetching package data"));
    }

    #[tokio::test]
    async fn it_fails_on_missing_lockfile() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let result = execute_command_with_session(
            Commands::Graph {
                project: project.args("missing.lock"),
            },
            &session,
        )
        .await;

        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to load lockfile"));
    }
}

// ===== HANDLE_DIFF TESTS =====

mod handle_diff_tests {
    use super::*;

    fn diff(project: &Project, show_removed: bool) -> Commands {
        Commands::Diff {
            manifest: project.path("Pipfile"),
            old_lock: project.path("v1.lock"),
            new_lock: project.path("v2.lock"),
            dev: false,
            show_removed,
        }
    }

    #[tokio::test]
    async fn it_classifies_changes_and_reuses_the_cache() {
        let project = Project::new();
        let (session, source) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let document = execute_command_with_session(diff(&project, false), &session)
            .await
            .unwrap();

        assert_eq!(
            document["summary"],
            json!({"added": 1, "removed": 1, "version": 1, "equal": 2})
        );

        let entries = document["entries"].as_array().unwrap();
        assert!(entries.iter().all(|e| e["change"] != "removed"));
        let click = entries.iter().find(|e| e["id"] == "click").unwrap();
        assert_eq!(click["change"], "version");
        assert_eq!(click["label"], "click 8.1.7");
        assert_eq!(click["previous_version"], "8.1.3");

        // flask==2.3.2 is pinned in both lockfiles and fetched once
        assert_eq!(source.calls(), 5);
        assert_eq!(session.cache().len().await, 5);
    }

    #[tokio::test]
    async fn it_shows_removed_entries_on_request() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let document = execute_command_with_session(diff(&project, true), &session)
            .await
            .unwrap();

        let removed: Vec<_> = document["entries"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["change"] == "removed")
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(removed, vec!["itsdangerous"]);
    }
}

// ===== HANDLE_METRICS TESTS =====

mod handle_metrics_tests {
    use super::*;

    #[tokio::test]
    async fn it_aggregates_dependencies_and_licenses() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/licenses.json")
            .with_status(200)
            .with_body(LICENSES)
            .create_async()
            .await;

        let project = Project::new();
        let (session, _) = session(source().await, format!("{}/licenses.json", server.url()));

        let document = execute_command_with_session(
            Commands::Metrics {
                project: project.args("v1.lock"),
                roots: Vec::new(),
            },
            &session,
        )
        .await
        .unwrap();

        assert_eq!(
            document["dependencies"]["all"],
            json!({"roots": 1, "direct": 2, "indirect": 0})
        );
        assert_eq!(document["licenses"]["total"], 3);
        assert_eq!(document["licenses"]["root"], "BSD-3-Clause");

        let bsd3 = &document["licenses"]["all"]["BSD-3-Clause"];
        assert_eq!(bsd3["_found"], true);
        assert_eq!(bsd3["Flask"], 0);
        assert_eq!(bsd3["click"], 1);

        let bsd = &document["licenses"]["all"]["BSD"];
        assert_eq!(bsd["_found"], false);
        assert!(bsd["_isFsfLibre"].is_null());
    }

    #[tokio::test]
    async fn it_survives_an_unreachable_license_registry() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/licenses.json")
            .with_status(503)
            .create_async()
            .await;

        let project = Project::new();
        let (session, _) = session(source().await, format!("{}/licenses.json", server.url()));

        let document = execute_command_with_session(
            Commands::Metrics {
                project: project.args("v1.lock"),
                roots: vec!["Click".to_string()],
            },
            &session,
        )
        .await
        .unwrap();

        assert_eq!(document["dependencies"]["roots"]["click"]["roots"], 1);
        assert_eq!(document["licenses"]["all"]["BSD-3-Clause"]["_found"], false);
    }

    #[tokio::test]
    async fn it_rejects_roots_outside_the_graph() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let err = execute_command_with_session(
            Commands::Metrics {
                project: project.args("v1.lock"),
                roots: vec!["flask".to_string(), "Django".to_string()],
            },
            &session,
        )
        .await
        .unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("Metrics root is not part of the dependency graph"));
        assert!(chain.contains("Node not found: django"));
    }
}

// ===== HANDLE_WHY TESTS =====

mod handle_why_tests {
    use super::*;

    #[tokio::test]
    async fn it_lists_paths_up_to_the_root() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let document = execute_command_with_session(
            Commands::Why {
                project: project.args("v1.lock"),
                packages: vec!["Click".to_string()],
            },
            &session,
        )
        .await
        .unwrap();

        let ids: Vec<_> = document["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["*App", "click", "flask"]);
        assert_eq!(document["edges"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn it_rejects_unknown_packages() {
        let project = Project::new();
        let (session, _) = session(source().await, "http://127.0.0.1:9/licenses.json".into());

        let err = execute_command_with_session(
            Commands::Why {
                project: project.args("v1.lock"),
                packages: vec!["django".to_string()],
            },
            &session,
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("Node not found: django"));
    }
}

// ===== RENDER TESTS =====

#[test]
fn test_render_formats() {
    let document = json!({"a": [1, 2]});
    assert_eq!(
        render(&document, OutputFormat::JsonCompact).unwrap(),
        r#"{"a":[1,2]}"#
    );
    assert!(render(&document, OutputFormat::Json).unwrap().contains('\n'));
}

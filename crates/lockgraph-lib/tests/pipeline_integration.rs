//! E2E tests for the resolve -> build -> diff -> metrics pipeline
//!
//! Inputs live on a real filesystem (tempfile); the metadata service and
//! the license registry are mockito servers.

use anyhow::Result;
use lockgraph_lib::api::diff::ChangeKind;
use lockgraph_lib::api::licenses::LiveLicenseClient;
use lockgraph_lib::api::thoth::LiveThothClient;
use lockgraph_lib::api::{GraphBuilder, GraphDiffer, MetricsAggregator, PackageResolver, ROOT_ID};
use lockgraph_lib::networking::{MetadataCache, NetworkingConfig, NetworkingManager};
use lockgraph_lib::stack::{Lockfile, Manifest};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const PIPFILE: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
requests = "*"
"zope.interface" = {version = ">=5.0"}
"#;

const OLD_LOCK: &str = r#"{
    "_meta": {"pipfile-spec": 6},
    "default": {
        "requests": {"version": "==2.31.0", "index": "pypi"},
        "urllib3": {"version": "==2.0.7"},
        "idna": {"version": "==3.4"},
        "zope.interface": {"version": "==6.0"}
    },
    "develop": {}
}"#;

const NEW_LOCK: &str = r#"{
    "default": {
        "requests": {"version": "==2.31.0"},
        "urllib3": {"version": "==2.1.0"},
        "idna": {"version": "==3.4"},
        "charset-normalizer": {"version": "==3.3.2"},
        "zope.interface": {"version": "==6.0"},
        "my-fork": {"git": "https://example.invalid/my-fork.git", "ref": "abc123"}
    },
    "develop": {}
}"#;

const LICENSES: &str = r#"{
    "licenseListVersion": "3.21",
    "licenses": [
        {"licenseId": "Apache-2.0", "name": "Apache License 2.0", "isOsiApproved": true, "isFsfLibre": true},
        {"licenseId": "MIT", "name": "MIT License", "isOsiApproved": true, "isFsfLibre": true},
        {"licenseId": "ZPL-2.1", "name": "Zope Public License 2.1", "isOsiApproved": true}
    ]
}"#;

async fn mock_package(
    server: &mut ServerGuard,
    name: &str,
    version: &str,
    requires: &[&str],
    license: &str,
    hits: usize,
) -> Mock {
    let body = serde_json::json!({
        "metadata": {
            "name": name,
            "version": version,
            "requires_dist": requires,
            "license": license,
        }
    });

    server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".to_string(), name.to_string()),
            Matcher::UrlEncoded("version".to_string(), version.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn e2e_resolve_diff_and_measure() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("Pipfile"), PIPFILE)?;
    fs::write(temp.path().join("old.lock"), OLD_LOCK)?;
    fs::write(temp.path().join("new.lock"), NEW_LOCK)?;

    let mut server = Server::new_async().await;
    let requests_deps = [
        "charset-normalizer (<4,>=2)",
        "idna (<4,>=2.5)",
        "urllib3 (<3,>=1.21.1)",
        "PySocks (!=1.5.7,>=1.5.6) ; extra == 'socks'",
    ];
    let mocks = vec![
        // pinned identically in both lockfiles: fetched once
        mock_package(&mut server, "requests", "2.31.0", &requests_deps, "Apache 2.0", 1).await,
        mock_package(&mut server, "idna", "3.4", &[], "BSD", 1).await,
        mock_package(&mut server, "zope.interface", "6.0", &["setuptools"], "ZPL 2.1", 1).await,
        mock_package(&mut server, "urllib3", "2.0.7", &[], "MIT", 1).await,
        mock_package(&mut server, "urllib3", "2.1.0", &[], "MIT License", 1).await,
        mock_package(&mut server, "charset-normalizer", "3.3.2", &[], "MIT", 1).await,
    ];
    let licenses_mock = server
        .mock("GET", "/licenses.json")
        .with_status(200)
        .with_body(LICENSES)
        .create_async()
        .await;

    let networking = Arc::new(NetworkingManager::new(NetworkingConfig {
        max_jobs: 2,
        ..NetworkingConfig::default()
    })?);
    let source = Arc::new(LiveThothClient::with_base_url(networking.clone(), server.url()));
    let resolver = PackageResolver::new(source, MetadataCache::new());

    let manifest = Manifest::load(&temp.path().join("Pipfile"), false)?;
    let old_lock = Lockfile::load(&temp.path().join("old.lock"), false)?;
    let new_lock = Lockfile::load(&temp.path().join("new.lock"), false)?;

    let old_graph = GraphBuilder::new(&old_lock, &manifest).build(&resolver.resolve(&old_lock).await?);
    let new_graph = GraphBuilder::new(&new_lock, &manifest).build(&resolver.resolve(&new_lock).await?);

    // the git entry has no pin and never reaches the graph
    assert!(!new_graph.contains("my-fork"));

    let roots: Vec<_> = new_graph
        .root_candidates()
        .into_iter()
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(roots, vec!["requests", "zope-interface"]);
    assert_eq!(new_graph.get_node("charset-normalizer").and_then(|n| n.depth), Some(1));

    let diff = GraphDiffer::default().diff(&old_graph, &new_graph);
    assert_eq!(diff.get(ROOT_ID).map(|e| e.change), Some(ChangeKind::Equal));
    assert_eq!(diff.get("urllib3").map(|e| e.change), Some(ChangeKind::Version));
    assert_eq!(diff.get("charset-normalizer").map(|e| e.change), Some(ChangeKind::Added));
    assert_eq!(diff.get("zope-interface").map(|e| e.change), Some(ChangeKind::Equal));
    let summary = diff.summary();
    assert_eq!((summary.added, summary.removed, summary.version, summary.equal), (1, 0, 1, 4));

    let registry = LiveLicenseClient::with_url(networking, format!("{}/licenses.json", server.url()))
        .fetch_or_empty()
        .await;
    let metrics = MetricsAggregator::new(&registry).aggregate_default(&new_graph);

    assert_eq!(metrics.dependencies.all.roots, 2);
    assert_eq!(metrics.dependencies.all.direct, 3);
    assert_eq!(metrics.dependencies.roots["requests"].total(), 4);
    assert_eq!(metrics.licenses.total, 5);

    let mit = &metrics.licenses.all["MIT"];
    assert!(mit.found);
    assert_eq!(mit.packages.len(), 2);
    assert!(!metrics.licenses.all["Apache 2.0"].found);
    assert!(!metrics.licenses.all["ZPL 2.1"].found);

    for mock in mocks {
        mock.assert_async().await;
    }
    licenses_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn e2e_resolution_failure_builds_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("old.lock"), OLD_LOCK)?;

    let mut server = Server::new_async().await;
    let _unavailable = server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let networking = Arc::new(NetworkingManager::new(NetworkingConfig::default())?);
    let source = Arc::new(LiveThothClient::with_base_url(networking, server.url()));
    let cache = MetadataCache::new();
    let resolver = PackageResolver::new(source, cache.clone());

    let lockfile = Lockfile::load(&temp.path().join("old.lock"), false)?;
    let err = resolver.resolve(&lockfile).await.unwrap_err();

    assert!(err.package().is_some());
    assert!(err.to_string().contains("An error occurred while fetching package data"));
    assert!(cache.is_empty().await);
    Ok(())
}

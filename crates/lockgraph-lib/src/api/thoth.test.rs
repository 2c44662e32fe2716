// Tests for the package metadata source

use super::*;
use crate::networking::NetworkingConfig;
use mockito::{Matcher, Server};

fn networking() -> Arc<NetworkingManager> {
    Arc::new(NetworkingManager::new(NetworkingConfig::default()).unwrap())
}

// ============================================================================
// Mock Source Tests
// ============================================================================

#[tokio::test]
async fn test_mock_fetch_success() {
    let mock = MockMetadataSource::new()
        .with_package(PackageMetadata::new("Flask", "2.3.2").with_requirement("click>=8.1.3"))
        .await;

    let metadata = mock.fetch("flask", "==2.3.2").await.unwrap();
    assert_eq!(metadata.name, "Flask");
    assert_eq!(metadata.requires_dist, vec!["click>=8.1.3".to_string()]);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_mock_fetch_unknown_package() {
    let mock = MockMetadataSource::new();

    let result = mock.fetch("nonexistent", "1.0").await;
    assert!(matches!(result, Err(MetadataError::NotFound { .. })));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_mock_fetch_configured_failure() {
    let mock = MockMetadataSource::new()
        .with_failure("broken", "==0.1", "Service Unavailable")
        .await;

    match mock.fetch("broken", "0.1").await {
        Err(MetadataError::Mock(message)) => assert_eq!(message, "Service Unavailable"),
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// Live Client Tests (mockito)
// ============================================================================

#[tokio::test]
async fn test_live_fetch_parses_metadata_envelope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".to_string(), "zope.interface".to_string()),
            Matcher::UrlEncoded("version".to_string(), "6.0".to_string()),
            Matcher::UrlEncoded("index".to_string(), DEFAULT_PACKAGE_INDEX.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "metadata": {
                    "name": "zope.interface",
                    "version": "6.0",
                    "requires_dist": ["setuptools", "coverage (>=5.0.3) ; extra == 'test'"],
                    "license": "ZPL 2.1",
                    "summary": "Interfaces for Python"
                },
                "parameters": {"name": "zope.interface", "version": "6.0"}
            }"#,
        )
        .create_async()
        .await;

    let client = LiveThothClient::with_base_url(networking(), server.url());
    let metadata = client.fetch("zope.interface", "6.0").await.unwrap();

    assert_eq!(metadata.id(), "zope-interface");
    assert_eq!(metadata.license, "ZPL 2.1");
    assert_eq!(metadata.requires_dist.len(), 2);
    assert_eq!(metadata.summary.as_deref(), Some("Interfaces for Python"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_live_fetch_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error": "not found"}"#)
        .create_async()
        .await;

    let client = LiveThothClient::with_base_url(networking(), format!("{}/", server.url()));
    let result = client.fetch("ghost", "1.0").await;

    match result {
        Err(MetadataError::NotFound { name, version }) => {
            assert_eq!(name, "ghost");
            assert_eq!(version, "1.0");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_live_fetch_server_error_is_wrapped() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = LiveThothClient::with_base_url(networking(), server.url());
    let err = client.fetch("flask", "2.3.2").await.unwrap_err();

    assert!(matches!(
        err,
        MetadataError::Network {
            source: NetworkingError::HttpStatus { status: 503, .. }
        }
    ));
}

#[tokio::test]
async fn test_custom_index_is_forwarded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/python/package/metadata")
        .match_query(Matcher::UrlEncoded(
            "index".to_string(),
            "https://mirror.example/simple".to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"metadata": {"name": "six", "version": "1.16.0"}}"#)
        .create_async()
        .await;

    let client = LiveThothClient::with_base_url(networking(), server.url())
        .with_index("https://mirror.example/simple".to_string());
    let metadata = client.fetch("six", "1.16.0").await.unwrap();

    assert!(metadata.requires_dist.is_empty());
    mock.assert_async().await;
}

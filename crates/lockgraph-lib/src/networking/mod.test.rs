use super::*;
use mockito::Server;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Ping {
    ok: bool,
}

#[test]
fn test_networking_manager_creation() {
    let manager = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    assert_eq!(manager.max_jobs(), 8);
}

#[test]
fn test_zero_jobs_rejected() {
    let config = NetworkingConfig {
        max_jobs: 0,
        ..Default::default()
    };
    assert!(matches!(
        NetworkingManager::new(config),
        Err(NetworkingError::InvalidJobCount { count: 0 })
    ));
}

#[test]
fn test_with_query_encodes_values() {
    assert_eq!(
        with_query(
            "https://api.example/metadata",
            &[("name", "zope.interface"), ("index", "https://pypi.org/simple")]
        ),
        "https://api.example/metadata?name=zope.interface&index=https%3A%2F%2Fpypi.org%2Fsimple"
    );
    assert_eq!(with_query("https://a/b?x=1", &[("y", "2 3")]), "https://a/b?x=1&y=2%203");
    assert_eq!(with_query("https://a/b", &[]), "https://a/b");
}

#[tokio::test]
async fn test_get_json_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ping")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let manager = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    let ping: Ping = manager
        .get_json(&format!("{}/ping", server.url()))
        .await
        .unwrap();

    assert_eq!(ping, Ping { ok: true });
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_json_maps_http_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let manager = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    let err = manager
        .get_json::<Ping>(&format!("{}/missing", server.url()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, NetworkingError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_get_json_rejects_invalid_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/garbage")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;

    let manager = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    let err = manager
        .get_json::<Ping>(&format!("{}/garbage", server.url()))
        .await
        .unwrap_err();

    assert!(matches!(err, NetworkingError::JsonError { .. }));
    assert_eq!(err.status(), None);
}

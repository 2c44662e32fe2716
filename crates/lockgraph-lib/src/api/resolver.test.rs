// Tests for concurrent lockfile resolution

use super::*;
use crate::api::thoth::MockMetadataSource;
use crate::stack::lockfile::LockedPackage;
use std::time::{Duration, Instant};

async fn flask_source() -> MockMetadataSource {
    MockMetadataSource::new()
        .with_package(
            PackageMetadata::new("Flask", "2.3.2")
                .with_requirement("click>=8.1.3")
                .with_requirement("itsdangerous>=2.1.2"),
        )
        .await
        .with_package(PackageMetadata::new("click", "8.1.7"))
        .await
        .with_package(PackageMetadata::new("itsdangerous", "2.1.2"))
        .await
}

fn flask_lockfile() -> Lockfile {
    Lockfile::from_pins([
        ("flask", "==2.3.2"),
        ("click", "==8.1.7"),
        ("itsdangerous", "==2.1.2"),
    ])
}

#[tokio::test]
async fn test_resolve_all_entries() {
    let source = Arc::new(flask_source().await);
    let resolver = PackageResolver::new(source.clone(), MetadataCache::new());

    let resolved = resolver.resolve(&flask_lockfile()).await.unwrap();

    let ids: Vec<_> = resolved.keys().cloned().collect();
    assert_eq!(ids, vec!["click", "flask", "itsdangerous"]);
    assert_eq!(resolved["flask"].requires_dist.len(), 2);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_second_pass_is_served_from_cache() {
    let source = Arc::new(flask_source().await);
    let resolver = PackageResolver::new(source.clone(), MetadataCache::new());
    let lockfile = flask_lockfile();

    let first = resolver.resolve(&lockfile).await.unwrap();
    let second = resolver.resolve(&lockfile).await.unwrap();

    assert_eq!(source.calls(), 3);
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first["click"], &second["click"]));
}

#[tokio::test]
async fn test_shared_cache_between_resolvers() {
    let cache = MetadataCache::new();
    cache
        .put("flask", "2.3.2", PackageMetadata::new("Flask", "2.3.2"))
        .await;

    let source = Arc::new(
        MockMetadataSource::new()
            .with_package(PackageMetadata::new("click", "8.1.7"))
            .await,
    );
    let resolver = PackageResolver::new(source.clone(), cache.clone());

    let resolved = resolver
        .resolve(&Lockfile::from_pins([("flask", "==2.3.2"), ("click", "==8.1.7")]))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(source.calls(), 1);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_first_failure_aborts_pass() {
    let source = Arc::new(
        MockMetadataSource::new()
            .with_package(PackageMetadata::new("slow", "1.0"))
            .await
            .with_failure("broken", "1.0", "Service Unavailable")
            .await
            .with_delay(Duration::from_secs(5)),
    );
    let resolver = PackageResolver::new(source, MetadataCache::new());

    let started = Instant::now();
    let err = resolver
        .resolve(&Lockfile::from_pins([("slow", "==1.0"), ("broken", "==1.0")]))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(err.package(), Some("broken"));
    match err {
        ResolutionError::FetchFailed {
            version, source, ..
        } => {
            assert_eq!(version, "1.0");
            assert!(matches!(source, MetadataError::Mock(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!resolver.cache().contains("slow", "1.0").await);
}

#[tokio::test]
async fn test_unknown_package_fails_resolution() {
    let source = Arc::new(flask_source().await);
    let resolver = PackageResolver::new(source, MetadataCache::new());

    let result = resolver
        .resolve(&Lockfile::from_pins([("flask", "==2.3.2"), ("ghost", "==0.0.1")]))
        .await;

    assert!(matches!(
        result,
        Err(ResolutionError::FetchFailed {
            source: MetadataError::NotFound { .. },
            ..
        })
    ));
}

#[tokio::test]
async fn test_unpinned_entries_are_skipped() {
    let source = Arc::new(flask_source().await);
    let resolver = PackageResolver::new(source.clone(), MetadataCache::new());

    let mut lockfile = Lockfile::from_pins([("click", "==8.1.7")]);
    lockfile.insert("editable-pkg", LockedPackage::default());

    let resolved = resolver.resolve(&lockfile).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(resolved.contains_key("click"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_empty_lockfile_resolves_to_nothing() {
    let source = Arc::new(MockMetadataSource::new());
    let resolver = PackageResolver::new(source.clone(), MetadataCache::new());

    let resolved = resolver.resolve(&Lockfile::new()).await.unwrap();
    assert!(resolved.is_empty());
    assert_eq!(source.calls(), 0);
}

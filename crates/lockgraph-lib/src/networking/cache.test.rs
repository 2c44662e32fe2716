use super::*;

#[tokio::test]
async fn test_cache_creation() {
    let cache = MetadataCache::new();
    assert!(cache.is_empty().await);
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn test_cache_hit_and_miss() {
    let cache = MetadataCache::new();
    let metadata = PackageMetadata::new("Flask", "2.3.2").with_license("BSD-3-Clause");

    assert!(cache.get("flask", "2.3.2").await.is_none());

    cache.put("flask", "2.3.2", metadata.clone()).await;

    let hit = cache.get("flask", "2.3.2").await.expect("cached");
    assert_eq!(*hit, metadata);
    assert!(cache.get("flask", "2.3.3").await.is_none());
}

#[tokio::test]
async fn test_cache_key_normalization() {
    let cache = MetadataCache::new();
    cache
        .put("Zope.Interface", "==6.0", PackageMetadata::new("zope.interface", "6.0"))
        .await;

    assert!(cache.contains("zope-interface", "6.0").await);
    assert!(cache.contains("ZOPE.INTERFACE", "==6.0").await);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_repeated_get_returns_same_allocation() {
    let cache = MetadataCache::new();
    let stored = cache
        .put("six", "1.16.0", PackageMetadata::new("six", "1.16.0"))
        .await;

    let first = cache.get("six", "1.16.0").await.unwrap();
    let second = cache.get("six", "1.16.0").await.unwrap();
    assert!(Arc::ptr_eq(&stored, &first));
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_last_write_wins() {
    let cache = MetadataCache::new();
    cache
        .put("six", "1.16.0", PackageMetadata::new("six", "1.16.0"))
        .await;
    cache
        .put("six", "1.16.0", PackageMetadata::new("six", "1.16.0").with_license("MIT"))
        .await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get("six", "1.16.0").await.unwrap().license, "MIT");
}

#[tokio::test]
async fn test_clones_share_entries() {
    let cache = MetadataCache::new();
    let shared = cache.clone();
    shared
        .put("idna", "3.4", PackageMetadata::new("idna", "3.4"))
        .await;

    assert!(cache.contains("idna", "3.4").await);

    cache.clear().await;
    assert!(shared.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_put_and_get() {
    let cache = MetadataCache::new();
    let mut handles = Vec::new();

    for i in 0..32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let version = format!("1.{}", i % 4);
            cache
                .put("pkg", &version, PackageMetadata::new("pkg", version.clone()))
                .await;
            cache.get("pkg", &version).await.is_some()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(cache.len().await, 4);
}

use crate::stack::package::{PackageMetadata, canonical_id, normalize_version};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Cache key: canonical package id plus exact (unpinned) version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub id: String,
    pub version: String,
}

impl CacheKey {
    /// Build a key from a raw package name and a version specifier
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            id: canonical_id(name),
            version: normalize_version(version).to_string(),
        }
    }
}

/// Process-lifetime store of fetched package metadata
///
/// Cloning shares the underlying map. Entries are never evicted; a racing
/// `put` for the same key simply replaces an identical value.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    entries: Arc<RwLock<HashMap<CacheKey, Arc<PackageMetadata>>>>,
}

impl MetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached metadata for a package release
    pub async fn get(&self, name: &str, version: &str) -> Option<Arc<PackageMetadata>> {
        let key = CacheKey::new(name, version);
        let entries = self.entries.read().await;
        let hit = entries.get(&key).cloned();
        trace!(
            "Cache {} for {}@{}",
            if hit.is_some() { "hit" } else { "miss" },
            key.id,
            key.version
        );
        hit
    }

    /// Store metadata for a package release, returning the shared handle
    pub async fn put(
        &self,
        name: &str,
        version: &str,
        metadata: PackageMetadata,
    ) -> Arc<PackageMetadata> {
        let metadata = Arc::new(metadata);
        let mut entries = self.entries.write().await;
        entries.insert(CacheKey::new(name, version), metadata.clone());
        metadata
    }

    /// Whether a release is cached
    pub async fn contains(&self, name: &str, version: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(&CacheKey::new(name, version))
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        let entries = self.entries.read().await;
        entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    include!("cache.test.rs");
}

//! Package metadata source
//!
//! Provides the production (Live) client against the Thoth user API and a
//! test (Mock) implementation. The resolver only sees the [`MetadataSource`]
//! trait.

use crate::networking::{NetworkingError, NetworkingManager, with_query};
use crate::stack::package::{PackageMetadata, canonical_id, normalize_version};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Default Thoth user API endpoint
pub const DEFAULT_THOTH_URL: &str = "https://khemenu.thoth-station.ninja/api/v1";

/// Default Python package index passed along with metadata lookups
pub const DEFAULT_PACKAGE_INDEX: &str = "https://pypi.org/simple";

/// Metadata lookup errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("No metadata for {name}=={version}")]
    NotFound { name: String, version: String },

    #[error("Metadata service error: {source}")]
    Network {
        #[from]
        source: NetworkingError,
    },

    #[error("Mock metadata error: {0}")]
    Mock(String),
}

/// Remote lookup of metadata for one pinned package release
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for `name` at exactly `version`
    fn fetch(
        &self,
        name: &str,
        version: &str,
    ) -> impl std::future::Future<Output = Result<PackageMetadata, MetadataError>> + Send;
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    metadata: PackageMetadata,
}

/// Live Thoth client (production)
pub struct LiveThothClient {
    networking: Arc<NetworkingManager>,
    base_url: String,
    index_url: String,
}

impl LiveThothClient {
    /// Create new live client against the public endpoint
    pub fn new(networking: Arc<NetworkingManager>) -> Self {
        Self::with_base_url(networking, DEFAULT_THOTH_URL.to_string())
    }

    /// Create client with custom base URL (for staging/testing)
    pub fn with_base_url(networking: Arc<NetworkingManager>, base_url: String) -> Self {
        Self {
            networking,
            base_url: base_url.trim_end_matches('/').to_string(),
            index_url: DEFAULT_PACKAGE_INDEX.to_string(),
        }
    }

    /// Use a different package index
    pub fn with_index(mut self, index_url: String) -> Self {
        self.index_url = index_url;
        self
    }

    fn metadata_url(&self, name: &str, version: &str) -> String {
        with_query(
            &format!("{}/python/package/metadata", self.base_url),
            &[("name", name), ("version", version), ("index", &self.index_url)],
        )
    }
}

impl MetadataSource for LiveThothClient {
    async fn fetch(&self, name: &str, version: &str) -> Result<PackageMetadata, MetadataError> {
        let url = self.metadata_url(name, version);
        debug!("Fetching metadata for {}=={}", name, version);

        match self.networking.get_json::<MetadataResponse>(&url).await {
            Ok(response) => Ok(response.metadata),
            Err(e) if e.status() == Some(404) => Err(MetadataError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Mock metadata source (testing)
///
/// Responses are keyed by canonical id and normalized version. Every call to
/// [`MetadataSource::fetch`] is counted, hit or miss.
pub struct MockMetadataSource {
    responses: Arc<Mutex<HashMap<(String, String), Result<PackageMetadata, String>>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockMetadataSource {
    /// Create new mock source with no packages
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Serve this metadata for its own name and version
    pub async fn with_package(self, metadata: PackageMetadata) -> Self {
        let key = (canonical_id(&metadata.name), metadata.version.clone());
        self.responses.lock().await.insert(key, Ok(metadata));
        self
    }

    /// Fail lookups of `name`/`version` with the given message
    pub async fn with_failure(self, name: &str, version: &str, message: &str) -> Self {
        let key = (canonical_id(name), normalize_version(version).to_string());
        self.responses
            .lock()
            .await
            .insert(key, Err(message.to_string()));
        self
    }

    /// Sleep before answering successful lookups
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetch calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataSource for MockMetadataSource {
    async fn fetch(&self, name: &str, version: &str) -> Result<PackageMetadata, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let key = (canonical_id(name), normalize_version(version).to_string());
        let response = self.responses.lock().await.get(&key).cloned();

        match response {
            Some(Ok(metadata)) => {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(metadata)
            }
            Some(Err(message)) => Err(MetadataError::Mock(message)),
            None => Err(MetadataError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            }),
        }
    }
}

impl Default for MockMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    include!("thoth.test.rs");
}

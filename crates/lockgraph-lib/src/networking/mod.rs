use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{trace, warn};

pub mod cache;

pub use cache::MetadataCache;

/// Characters left untouched in query values (RFC 3986 unreserved set)
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Networking errors for metadata and license lookups
#[derive(Debug, Error)]
pub enum NetworkingError {
    #[error("HTTP request failed: {source}")]
    RequestFailed {
        #[from]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {source}")]
    JsonError {
        url: String,
        source: serde_json::Error,
    },

    #[error("Semaphore acquire error: {source}")]
    SemaphoreError {
        #[from]
        source: tokio::sync::AcquireError,
    },

    #[error("Invalid job count: {count} (must be > 0)")]
    InvalidJobCount { count: usize },
}

impl NetworkingError {
    /// HTTP status code, when the server answered with a non-success status
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkingError::HttpStatus { status, .. } => Some(*status),
            NetworkingError::RequestFailed { source } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Networking configuration
#[derive(Debug, Clone)]
pub struct NetworkingConfig {
    /// Maximum number of requests in flight (from CLI --jobs)
    pub max_jobs: usize,
    /// HTTP client timeout in seconds
    pub timeout_seconds: u64,
    /// Enable request/response tracing
    pub trace_requests: bool,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            max_jobs: 8,
            timeout_seconds: 30,
            trace_requests: false,
        }
    }
}

/// Shared HTTP client with a bounded number of in-flight requests
pub struct NetworkingManager {
    client: Client,
    config: NetworkingConfig,
    semaphore: Arc<Semaphore>,
}

impl NetworkingManager {
    /// Create networking manager
    pub fn new(config: NetworkingConfig) -> Result<Self, NetworkingError> {
        trace!("Initializing networking manager");

        if config.max_jobs == 0 {
            return Err(NetworkingError::InvalidJobCount {
                count: config.max_jobs,
            });
        }

        // Build HTTP client with timeout
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("lockgraph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let semaphore = Arc::new(Semaphore::new(config.max_jobs));

        trace!(
            "Networking manager initialized with {} concurrent requests",
            config.max_jobs
        );

        Ok(Self {
            client,
            config,
            semaphore,
        })
    }

    /// Maximum number of requests in flight
    pub fn max_jobs(&self) -> usize {
        self.config.max_jobs
    }

    /// GET a URL and decode the JSON body
    ///
    /// Waits for a request slot first; non-2xx responses become
    /// [`NetworkingError::HttpStatus`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NetworkingError> {
        let _permit = self.semaphore.acquire().await?;

        if self.config.trace_requests {
            trace!("GET {}", url);
        }

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} failed with status {}", url, status);
            return Err(NetworkingError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;

        if self.config.trace_requests {
            trace!("GET {} -> {} bytes", url, body.len());
        }

        serde_json::from_slice(&body).map_err(|e| NetworkingError::JsonError {
            url: url.to_string(),
            source: e,
        })
    }

    /// Get HTTP client for manual requests
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Append percent-encoded query parameters to a base URL
pub fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_VALUE),
                utf8_percent_encode(value, QUERY_VALUE)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        base.to_string()
    } else if base.contains('?') {
        format!("{base}&{query}")
    } else {
        format!("{base}?{query}")
    }
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}

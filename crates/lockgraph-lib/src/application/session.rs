//! Command session
//!
//! Each command execution creates a session that owns its collaborators: the
//! metadata source, the license client and the metadata cache. Every lockfile
//! resolved through one session shares that cache.

use crate::api::dependency_graph::{DependencyGraph, GraphBuilder};
use crate::api::licenses::{LiveLicenseClient, SpdxLicenseList};
use crate::api::resolver::PackageResolver;
use crate::api::thoth::{LiveThothClient, MetadataSource};
use crate::application::config::AppConfig;
use crate::networking::{MetadataCache, NetworkingManager};
use crate::stack::lockfile::{Lockfile, Manifest};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Collaborators for one command execution
pub struct CommandSession<S>
where
    S: MetadataSource + 'static,
{
    config: AppConfig,
    resolver: PackageResolver<S>,
    licenses: LiveLicenseClient,
}

impl CommandSession<LiveThothClient> {
    /// Session backed by the configured Thoth endpoint
    pub fn live(config: AppConfig) -> Result<Self> {
        let networking = Arc::new(
            NetworkingManager::new(config.networking_config())
                .context("Failed to initialize HTTP client")?,
        );
        let source = LiveThothClient::with_base_url(networking.clone(), config.thoth_url.clone())
            .with_index(config.package_index.clone());

        Ok(Self::with_source(config, networking, Arc::new(source)))
    }
}

impl<S> CommandSession<S>
where
    S: MetadataSource + 'static,
{
    /// Session over an arbitrary metadata source
    pub fn with_source(
        config: AppConfig,
        networking: Arc<NetworkingManager>,
        source: Arc<S>,
    ) -> Self {
        let licenses = LiveLicenseClient::with_url(networking, config.license_url.clone());
        Self {
            resolver: PackageResolver::new(source, MetadataCache::new()),
            licenses,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Metadata cache shared by every resolve in this session
    pub fn cache(&self) -> &MetadataCache {
        self.resolver.cache()
    }

    /// Read inputs, resolve every pinned package and build the graph
    pub async fn load_graph(
        &self,
        manifest_path: &Path,
        lock_path: &Path,
        include_dev: bool,
    ) -> Result<DependencyGraph> {
        let manifest = Manifest::load(manifest_path, include_dev)
            .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;
        let lockfile = Lockfile::load(lock_path, include_dev)
            .with_context(|| format!("Failed to load lockfile {}", lock_path.display()))?;

        info!(
            "Resolving {} locked packages from {}",
            lockfile.len(),
            lock_path.display()
        );

        let resolved = self
            .resolver
            .resolve(&lockfile)
            .await
            .with_context(|| format!("Failed to resolve {}", lock_path.display()))?;

        Ok(GraphBuilder::new(&lockfile, &manifest).build(&resolved))
    }

    /// License registry; an unreachable registry yields an empty one
    pub async fn license_registry(&self) -> SpdxLicenseList {
        self.licenses.fetch_or_empty().await
    }
}

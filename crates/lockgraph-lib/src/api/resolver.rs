//! Concurrent lockfile resolution
//!
//! Every pinned lockfile entry gets its own task. A task answers from the
//! [`MetadataCache`] when it can and otherwise asks the [`MetadataSource`],
//! storing the result. The first failing task aborts the rest of the pass;
//! cache writes made by tasks that already finished are kept.

use crate::api::thoth::{MetadataError, MetadataSource};
use crate::logger::Logger;
use crate::networking::MetadataCache;
use crate::primitives::LogContext;
use crate::progress_span;
use crate::stack::lockfile::Lockfile;
use crate::stack::package::PackageMetadata;
use indicatif::ProgressStyle;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Canonical package id -> resolved metadata
pub type ResolvedPackages = BTreeMap<String, Arc<PackageMetadata>>;

/// Resolution errors; any of these fails the whole pass
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("An error occurred while fetching package data for {name}=={version}: {source}")]
    FetchFailed {
        name: String,
        version: String,
        #[source]
        source: MetadataError,
    },

    #[error("Resolution task failed: {source}")]
    TaskFailed {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl ResolutionError {
    /// Lockfile name of the package whose lookup failed, when known
    pub fn package(&self) -> Option<&str> {
        match self {
            ResolutionError::FetchFailed { name, .. } => Some(name),
            ResolutionError::TaskFailed { .. } => None,
        }
    }
}

/// Where a resolved entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cache,
    Source,
}

/// Resolves lockfile entries to package metadata
pub struct PackageResolver<S>
where
    S: MetadataSource + 'static,
{
    source: Arc<S>,
    cache: MetadataCache,
}

impl<S> PackageResolver<S>
where
    S: MetadataSource + 'static,
{
    /// Create resolver over a metadata source and a (possibly shared) cache
    pub fn new(source: Arc<S>, cache: MetadataCache) -> Self {
        Self { source, cache }
    }

    /// Cache consulted before every fetch
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Resolve metadata for every pinned lockfile entry
    ///
    /// All lookups run concurrently. Returns the complete mapping or the
    /// first error encountered; partial results are discarded.
    pub async fn resolve(&self, lockfile: &Lockfile) -> Result<ResolvedPackages, ResolutionError> {
        let pins = lockfile.pinned();
        let total = pins.len();

        let span = progress_span!("resolve", total = total);
        span.pb_set_style(
            &ProgressStyle::with_template("{spinner} resolving {pos}/{len} {wide_bar}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        span.pb_set_length(total as u64);

        self.resolve_pins(pins).instrument(span).await
    }

    async fn resolve_pins(
        &self,
        pins: Vec<(String, String)>,
    ) -> Result<ResolvedPackages, ResolutionError> {
        let mut context = LogContext::with_progress("resolve", pins.len() as u64);
        let mut tasks = JoinSet::new();

        for (name, version) in pins {
            let source = self.source.clone();
            let cache = self.cache.clone();

            tasks.spawn(async move {
                if let Some(hit) = cache.get(&name, &version).await {
                    return Ok::<_, ResolutionError>((hit, Origin::Cache));
                }

                let metadata = source.fetch(&name, &version).await.map_err(|e| {
                    ResolutionError::FetchFailed {
                        name: name.clone(),
                        version: version.clone(),
                        source: e,
                    }
                })?;

                let stored = cache.put(&name, &version, metadata).await;
                Ok::<_, ResolutionError>((stored, Origin::Source))
            });
        }

        let mut resolved = ResolvedPackages::new();
        let mut fetched = 0usize;
        let mut cached = 0usize;

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(ResolutionError::from).and_then(|result| result);

            let (metadata, origin) = match outcome {
                Ok(done) => done,
                Err(e) => {
                    tasks.abort_all();
                    warn!(package = e.package(), "Resolution aborted: {}", e);
                    return Err(e);
                }
            };

            match origin {
                Origin::Cache => cached += 1,
                Origin::Source => fetched += 1,
            }

            debug!("Resolved {} {}", metadata.name, metadata.version);
            resolved.insert(metadata.id(), metadata);

            tracing::Span::current().pb_inc(1);
            context.set_progress((fetched + cached) as u64);
            if let Some(logger) = Logger::global() {
                logger.progress("package resolved", &context);
            }
        }

        info!(
            "Resolved {} packages ({} fetched, {} from cache)",
            resolved.len(),
            fetched,
            cached
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    include!("resolver.test.rs");
}

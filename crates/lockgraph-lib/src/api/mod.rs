//! # API Module
//!
//! Resolution, graph construction and analysis over locked Python packages.
//!
//! ## Modules
//!
//! - [`thoth`] - Package metadata source (live Thoth client and mock)
//! - [`licenses`] - SPDX license registry
//! - [`resolver`] - Concurrent, cached lockfile resolution
//! - [`dependency_graph`] - Rooted dependency graph with BFS depths
//! - [`diff`] - Structural diff between two graphs
//! - [`metrics`] - Dependency and license metrics

pub mod dependency_graph;
pub mod diff;
pub mod licenses;
pub mod metrics;
pub mod resolver;
pub mod thoth;

pub use dependency_graph::{
    DependencyGraph, DependencyGraphError, GraphBuilder, GraphView, PackageNode, ROOT_ID,
};
pub use diff::{ChangeKind, DiffEntry, DiffResult, DiffSummary, GraphDiffer};
pub use licenses::{LicenseError, LicenseInfo, LicenseRegistry, LiveLicenseClient, SpdxLicenseList};
pub use metrics::{Metrics, MetricsAggregator};
pub use resolver::{PackageResolver, ResolutionError, ResolvedPackages};
pub use thoth::{LiveThothClient, MetadataError, MetadataSource, MockMetadataSource};

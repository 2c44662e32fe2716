//! Dependency and license metrics
//!
//! Each designated root is walked independently with a lazy breadth-first
//! traversal, so a package reachable from several roots is counted once per
//! root that reaches it.

use crate::api::dependency_graph::{DependencyGraph, PackageNode};
use crate::api::licenses::LicenseRegistry;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Depth class of a visited node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthClass {
    /// Depth 0 or a designated root
    Roots,
    /// Depth 1
    Direct,
    /// Depth 2 and deeper
    Indirect,
}

impl DepthClass {
    fn of(node: &PackageNode, designated: &HashSet<&str>) -> Self {
        match node.depth {
            _ if designated.contains(node.id.as_str()) => DepthClass::Roots,
            Some(0) => DepthClass::Roots,
            Some(1) => DepthClass::Direct,
            _ => DepthClass::Indirect,
        }
    }
}

/// Visit counts per depth class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepthCounts {
    pub roots: usize,
    pub direct: usize,
    pub indirect: usize,
}

impl DepthCounts {
    fn record(&mut self, class: DepthClass) {
        match class {
            DepthClass::Roots => self.roots += 1,
            DepthClass::Direct => self.direct += 1,
            DepthClass::Indirect => self.indirect += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.roots + self.direct + self.indirect
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyMetrics {
    /// Counts over every traversal
    pub all: DepthCounts,
    /// Counts per designated root
    pub roots: BTreeMap<String, DepthCounts>,
}

/// Packages sharing one license
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LicenseEntry {
    /// Package label -> depth
    #[serde(flatten)]
    pub packages: BTreeMap<String, Option<i32>>,
    #[serde(rename = "_found")]
    pub found: bool,
    #[serde(rename = "_isOsiApproved")]
    pub is_osi_approved: Option<bool>,
    #[serde(rename = "_isFsfLibre")]
    pub is_fsf_libre: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LicenseMetrics {
    /// Number of package visits recorded
    pub total: usize,
    /// License of the first package visited
    pub root: Option<String>,
    /// Registry id (or raw license string when unmatched) -> entry
    pub all: BTreeMap<String, LicenseEntry>,
}

impl LicenseMetrics {
    fn record<R: LicenseRegistry>(&mut self, node: &PackageNode, registry: &R) {
        let Some(license) = node.license() else {
            return;
        };

        let found = registry.lookup(license);
        let key = found.map_or(license, |info| info.license_id.as_str());

        let entry = self
            .all
            .entry(key.to_string())
            .or_insert_with(|| LicenseEntry {
                packages: BTreeMap::new(),
                found: found.is_some(),
                is_osi_approved: found.map(|info| info.is_osi_approved),
                is_fsf_libre: found.and_then(|info| info.is_fsf_libre),
            });
        entry.packages.insert(node.label.clone(), node.depth);

        self.total += 1;
        self.root.get_or_insert_with(|| license.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub dependencies: DependencyMetrics,
    pub licenses: LicenseMetrics,
}

/// Aggregates metrics over a graph against a license registry
pub struct MetricsAggregator<'r, R: LicenseRegistry> {
    registry: &'r R,
}

impl<'r, R: LicenseRegistry> MetricsAggregator<'r, R> {
    pub fn new(registry: &'r R) -> Self {
        Self { registry }
    }

    /// Aggregate from the given root ids; unknown ids are skipped
    ///
    /// Repeated ids are walked once, at their first position.
    pub fn aggregate(&self, graph: &DependencyGraph, roots: &[String]) -> Metrics {
        let designated: HashSet<&str> = roots.iter().map(String::as_str).collect();
        let mut metrics = Metrics::default();

        let mut walked = HashSet::new();
        for root in roots.iter().filter(|root| walked.insert(root.as_str())) {
            let Some(walk) = graph.bfs(root) else {
                warn!("Metrics root not in graph: {}", root);
                continue;
            };

            let mut counts = DepthCounts::default();
            for node in walk {
                let class = DepthClass::of(node, &designated);
                counts.record(class);
                metrics.dependencies.all.record(class);
                metrics.licenses.record(node, self.registry);
            }

            debug!("{}: {} packages reachable", root, counts.total());
            metrics.dependencies.roots.insert(root.clone(), counts);
        }

        metrics
    }

    /// Aggregate from every child of the application root
    pub fn aggregate_default(&self, graph: &DependencyGraph) -> Metrics {
        let roots: Vec<String> = graph
            .root_candidates()
            .into_iter()
            .map(|node| node.id.clone())
            .collect();
        self.aggregate(graph, &roots)
    }
}

#[cfg(test)]
mod tests {
    include!("metrics.test.rs");
}

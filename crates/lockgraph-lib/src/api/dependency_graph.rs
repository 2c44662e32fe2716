//! Rooted dependency graph with breadth-first depth labeling
//!
//! A graph always contains the synthetic application node [`ROOT_ID`] at
//! depth `-1`. Edges point from a dependent to its dependency. Every other
//! node carries the depth at which breadth-first traversal from the root
//! first reached it; nodes the traversal never reached are dropped.

use crate::api::resolver::ResolvedPackages;
use crate::stack::lockfile::{Lockfile, Manifest};
use crate::stack::package::PackageMetadata;
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef, Visitable};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Reserved id of the application root node
pub const ROOT_ID: &str = "*App";

/// Display label of the application root node
pub const ROOT_LABEL: &str = "App";

/// Errors that can occur when querying a dependency graph
#[derive(Debug, Error)]
pub enum DependencyGraphError {
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },
}

/// A package (or the application root) in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Canonical package id, or [`ROOT_ID`]
    pub id: String,
    /// Display name
    pub label: String,
    /// `-1` for the root, BFS depth for packages, `None` until visited
    pub depth: Option<i32>,
    /// Resolved metadata; `None` for the root
    pub metadata: Option<Arc<PackageMetadata>>,
}

impl PackageNode {
    /// The synthetic application root
    pub fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            label: ROOT_LABEL.to_string(),
            depth: Some(-1),
            metadata: None,
        }
    }

    /// Unvisited node for a resolved package
    pub fn package(id: impl Into<String>, metadata: Arc<PackageMetadata>) -> Self {
        Self {
            id: id.into(),
            label: metadata.name.clone(),
            depth: None,
            metadata: Some(metadata),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.version.as_str())
    }

    pub fn license(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.license.as_str())
    }
}

/// Serializable view of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub depth: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<&'a str>,
}

impl<'a> From<&'a PackageNode> for NodeView<'a> {
    fn from(node: &'a PackageNode) -> Self {
        Self {
            id: &node.id,
            label: &node.label,
            depth: node.depth,
            version: node.version(),
            license: node.license(),
        }
    }
}

/// Serializable dependent -> dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeView<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

/// Serializable node/edge listing of a graph or subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphView<'a> {
    pub nodes: Vec<NodeView<'a>>,
    pub edges: Vec<EdgeView<'a>>,
}

type Inner = DiGraph<PackageNode, ()>;

/// Rooted dependency graph
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Directed graph: nodes = packages, edges = dependent -> dependency
    graph: Inner,
    /// Map from node id to node index for fast lookup
    node_map: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// Create a graph holding only the application root
    pub fn new() -> Self {
        let mut graph = Inner::new();
        let root = graph.add_node(PackageNode::root());
        let node_map = HashMap::from([(ROOT_ID.to_string(), root)]);
        Self {
            graph,
            node_map,
            root,
        }
    }

    /// Add a node (idempotent - an existing id keeps its node)
    pub fn add_node(&mut self, node: PackageNode) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node.id) {
            trace!("Node already exists: {}", node.id);
            return idx;
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(id, idx);
        idx
    }

    /// Add a dependent -> dependency edge; parallel edges are kept
    pub fn add_edge(&mut self, from_id: &str, to_id: &str) -> Result<(), DependencyGraphError> {
        let from = self.index_of(from_id)?;
        let to = self.index_of(to_id)?;
        self.graph.add_edge(from, to, ());
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex, DependencyGraphError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| DependencyGraphError::NodeNotFound { id: id.to_string() })
    }

    /// The application root node
    pub fn root(&self) -> &PackageNode {
        &self.graph[self.root]
    }

    /// Get a node by id
    pub fn get_node(&self, id: &str) -> Option<&PackageNode> {
        let idx = self.node_map.get(id)?;
        Some(&self.graph[*idx])
    }

    /// Check if a node exists in the graph
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether any package besides the application root is present
    pub fn has_packages(&self) -> bool {
        self.graph.node_count() > 1
    }

    /// Check if the graph contains cycles
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// All nodes in insertion order, root first
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.graph.node_weights()
    }

    /// All edges as `(dependent, dependency)` ids in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].id.as_str(),
                self.graph[edge.target()].id.as_str(),
            )
        })
    }

    fn outgoing(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut targets: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| edge.target())
            .collect();
        // petgraph walks adjacency newest-first
        targets.reverse();
        targets
    }

    /// Direct dependencies of a node, one entry per edge
    pub fn dependencies(&self, id: &str) -> Option<Vec<&PackageNode>> {
        let idx = self.node_map.get(id)?;
        Some(
            self.outgoing(*idx)
                .into_iter()
                .map(|target| &self.graph[target])
                .collect(),
        )
    }

    /// Children of the application root
    pub fn root_candidates(&self) -> Vec<&PackageNode> {
        self.dependencies(ROOT_ID).unwrap_or_default()
    }

    /// Lazy breadth-first walk starting at `id` (the start node comes first)
    pub fn bfs(&self, id: &str) -> Option<BreadthFirst<'_>> {
        let start = *self.node_map.get(id)?;
        Some(BreadthFirst {
            graph: &self.graph,
            walker: Bfs::new(&self.graph, start),
        })
    }

    /// Every node and edge on any path from `ids` up to the application root
    pub fn paths_to_root(&self, ids: &[&str]) -> Result<GraphView<'_>, DependencyGraphError> {
        let mut closure = HashSet::new();
        let mut queue = VecDeque::new();

        for id in ids {
            let idx = self.index_of(id)?;
            if closure.insert(idx) {
                queue.push_back(idx);
            }
        }

        while let Some(idx) = queue.pop_front() {
            for parent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if closure.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        let nodes = self
            .graph
            .node_indices()
            .filter(|idx| closure.contains(idx))
            .map(|idx| NodeView::from(&self.graph[idx]))
            .collect();

        let edges = self
            .graph
            .edge_references()
            .filter(|edge| closure.contains(&edge.source()) && closure.contains(&edge.target()))
            .map(|edge| EdgeView {
                from: &self.graph[edge.source()].id,
                to: &self.graph[edge.target()].id,
            })
            .collect();

        Ok(GraphView { nodes, edges })
    }

    /// Serializable listing of the whole graph
    pub fn view(&self) -> GraphView<'_> {
        GraphView {
            nodes: self.nodes().map(NodeView::from).collect(),
            edges: self
                .edges()
                .map(|(from, to)| EdgeView { from, to })
                .collect(),
        }
    }

    /// Drop every node without an assigned depth, keeping insertion order
    fn retain_reachable(self) -> Self {
        let graph = self.graph.filter_map(
            |_, node| node.depth.is_some().then(|| node.clone()),
            |_, edge| Some(*edge),
        );

        let node_map: HashMap<_, _> = graph
            .node_indices()
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();

        let root = node_map
            .get(ROOT_ID)
            .copied()
            .unwrap_or_else(|| NodeIndex::new(0));

        Self {
            graph,
            node_map,
            root,
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy breadth-first iterator over a [`DependencyGraph`]
pub struct BreadthFirst<'a> {
    graph: &'a Inner,
    walker: Bfs<NodeIndex, <Inner as Visitable>::Map>,
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a PackageNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next(self.graph).map(|idx| &self.graph[idx])
    }
}

/// Builds a [`DependencyGraph`] from resolved metadata
pub struct GraphBuilder<'a> {
    lockfile: &'a Lockfile,
    manifest: &'a Manifest,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(lockfile: &'a Lockfile, manifest: &'a Manifest) -> Self {
        Self { lockfile, manifest }
    }

    /// Build the rooted graph
    ///
    /// A package becomes a child of the root when no other lockfile package
    /// requires it or when the manifest names it. Depths are assigned by a
    /// single breadth-first pass from those children; a node keeps the depth
    /// of its first discovery.
    pub fn build(&self, resolved: &ResolvedPackages) -> DependencyGraph {
        let mut graph = DependencyGraph::new();

        for (id, metadata) in resolved {
            graph.add_node(PackageNode::package(id.clone(), metadata.clone()));
        }

        let requirements = requirement_ids(resolved);
        let in_lockfile = self.lockfile.ids();
        let in_manifest = self.manifest.ids();

        let mut cannot_be_root: HashSet<&str> = HashSet::from([ROOT_ID]);
        for (id, targets) in &requirements {
            for target in targets {
                if target != id && in_lockfile.contains(target) {
                    cannot_be_root.insert(target.as_str());
                }
            }
        }

        let mut queue = VecDeque::new();
        let candidates: Vec<NodeIndex> = graph
            .graph
            .node_indices()
            .filter(|&idx| {
                let id = graph.graph[idx].id.as_str();
                !cannot_be_root.contains(id) || in_manifest.contains(id)
            })
            .collect();

        for idx in candidates {
            if idx == graph.root {
                continue;
            }
            graph.graph[idx].depth = Some(0);
            graph.graph.add_edge(graph.root, idx, ());
            queue.push_back(idx);
        }
        debug!("Inferred {} root packages", queue.len());

        while let Some(idx) = queue.pop_front() {
            let id = graph.graph[idx].id.clone();
            let depth = graph.graph[idx].depth.unwrap_or(0);

            let Some(targets) = requirements.get(&id) else {
                continue;
            };

            for target in targets {
                if *target == id {
                    continue;
                }
                let Some(&target_idx) = graph.node_map.get(target) else {
                    trace!("{} requires {} which is not in the lockfile", id, target);
                    continue;
                };

                graph.graph.add_edge(idx, target_idx, ());
                if graph.graph[target_idx].depth.is_none() {
                    graph.graph[target_idx].depth = Some(depth + 1);
                    queue.push_back(target_idx);
                }
            }
        }

        let unreachable: Vec<_> = graph
            .nodes()
            .filter(|node| node.depth.is_none())
            .map(|node| node.id.clone())
            .collect();
        if !unreachable.is_empty() {
            warn!("Dropping unreachable packages: {}", unreachable.join(", "));
        }

        let graph = graph.retain_reachable();
        if graph.has_cycles() {
            debug!("Dependency graph contains cycles");
        }

        debug!(
            "Built dependency graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }
}

/// Canonical requirement targets of every resolved package
///
/// Malformed specifiers are reported and contribute nothing.
fn requirement_ids(resolved: &ResolvedPackages) -> BTreeMap<String, Vec<String>> {
    resolved
        .iter()
        .map(|(id, metadata)| {
            let (parsed, malformed) = metadata.requirements();
            for error in malformed {
                warn!("{}: skipping requirement: {}", id, error);
            }
            (
                id.clone(),
                parsed.iter().map(|requirement| requirement.id()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    include!("dependency_graph.test.rs");
}

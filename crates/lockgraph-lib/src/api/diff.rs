//! Structural diff between two dependency graphs
//!
//! Nodes are matched by id. The result lists old-graph nodes in their order
//! followed by nodes only the new graph has, and carries the edges of both
//! graphs back to back.

use crate::api::dependency_graph::{DependencyGraph, PackageNode, ROOT_ID};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// How a node changed between the old and new graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Version,
    Equal,
}

/// One diffed node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry<'a> {
    pub id: &'a str,
    /// Package name followed by the version it ends up at
    pub label: String,
    pub change: ChangeKind,
    pub depth: Option<i32>,
    /// Old version, set only for [`ChangeKind::Version`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<&'a str>,
    /// New-graph node, or old-graph node for removals
    #[serde(skip)]
    pub node: &'a PackageNode,
}

/// One dependent -> dependency edge of either graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffEdge<'a> {
    pub from: &'a str,
    pub to: &'a str,
    /// Set when the dependency end was added or removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeKind>,
}

/// Per-kind entry counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub version: usize,
    pub equal: usize,
}

/// Diff of two graphs; exactly one entry per id present in either
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult<'a> {
    pub entries: Vec<DiffEntry<'a>>,
    pub edges: Vec<DiffEdge<'a>>,
}

impl<'a> DiffResult<'a> {
    /// Entry for a node id
    pub fn get(&self, id: &str) -> Option<&DiffEntry<'a>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Presentation list; removed entries are hidden unless asked for
    pub fn view(&self, show_removed: bool) -> Vec<&DiffEntry<'a>> {
        self.entries
            .iter()
            .filter(|entry| show_removed || entry.change != ChangeKind::Removed)
            .collect()
    }

    pub fn summary(&self) -> DiffSummary {
        self.entries
            .iter()
            .fold(DiffSummary::default(), |mut summary, entry| {
                match entry.change {
                    ChangeKind::Added => summary.added += 1,
                    ChangeKind::Removed => summary.removed += 1,
                    ChangeKind::Version => summary.version += 1,
                    ChangeKind::Equal => summary.equal += 1,
                }
                summary
            })
    }
}

/// Compares two graphs that share a root id
#[derive(Debug, Clone)]
pub struct GraphDiffer {
    root_id: String,
}

impl GraphDiffer {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
        }
    }

    pub fn diff<'a>(&self, old: &'a DependencyGraph, new: &'a DependencyGraph) -> DiffResult<'a> {
        let mut entries = Vec::with_capacity(old.node_count().max(new.node_count()));

        for old_node in old.nodes() {
            let entry = match new.get_node(&old_node.id) {
                Some(new_node) if old_node.id == self.root_id
                    || old_node.version() == new_node.version() =>
                {
                    entry(new_node, ChangeKind::Equal, None)
                }
                Some(new_node) => entry(new_node, ChangeKind::Version, old_node.version()),
                None => entry(old_node, ChangeKind::Removed, None),
            };
            entries.push(entry);
        }

        for new_node in new.nodes().filter(|node| !old.contains(&node.id)) {
            entries.push(entry(new_node, ChangeKind::Added, None));
        }

        let endpoint_changes: HashMap<&str, ChangeKind> = entries
            .iter()
            .filter(|entry| matches!(entry.change, ChangeKind::Added | ChangeKind::Removed))
            .map(|entry| (entry.id, entry.change))
            .collect();

        let edges = old
            .edges()
            .chain(new.edges())
            .map(|(from, to)| DiffEdge {
                from,
                to,
                change: endpoint_changes.get(to).copied(),
            })
            .collect();

        let result = DiffResult { entries, edges };
        let summary = result.summary();
        debug!(
            "Diffed graphs: {} added, {} removed, {} version, {} equal",
            summary.added, summary.removed, summary.version, summary.equal
        );
        result
    }
}

impl Default for GraphDiffer {
    fn default() -> Self {
        Self::new(ROOT_ID)
    }
}

fn entry<'a>(
    node: &'a PackageNode,
    change: ChangeKind,
    previous_version: Option<&'a str>,
) -> DiffEntry<'a> {
    let label = match node.version() {
        Some(version) => format!("{} {}", node.label, version),
        None => node.label.clone(),
    };

    DiffEntry {
        id: &node.id,
        label,
        change,
        depth: node.depth,
        previous_version,
        node,
    }
}

#[cfg(test)]
mod tests {
    include!("diff.test.rs");
}

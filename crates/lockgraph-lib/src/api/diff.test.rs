// Tests for graph diffing

use super::*;
use crate::api::dependency_graph::GraphBuilder;
use crate::api::resolver::ResolvedPackages;
use crate::stack::lockfile::{Lockfile, Manifest};
use crate::stack::package::PackageMetadata;
use std::sync::Arc;

fn graph(packages: Vec<PackageMetadata>) -> DependencyGraph {
    let lockfile = Lockfile::from_pins(
        packages
            .iter()
            .map(|p| (p.name.clone(), p.version.clone())),
    );
    let resolved: ResolvedPackages = packages
        .into_iter()
        .map(|p| (p.id(), Arc::new(p)))
        .collect();
    GraphBuilder::new(&lockfile, &Manifest::new()).build(&resolved)
}

fn old_graph() -> DependencyGraph {
    graph(vec![
        PackageMetadata::new("A", "1.0").with_requirement("B"),
        PackageMetadata::new("B", "2.0"),
    ])
}

fn new_graph() -> DependencyGraph {
    graph(vec![
        PackageMetadata::new("A", "1.0")
            .with_requirement("B")
            .with_requirement("C"),
        PackageMetadata::new("B", "3.0"),
        PackageMetadata::new("C", "1.0"),
    ])
}

fn changes<'a>(result: &'a DiffResult<'_>) -> Vec<(&'a str, ChangeKind)> {
    result.entries.iter().map(|e| (e.id, e.change)).collect()
}

#[test]
fn test_added_version_equal() {
    let (old, new) = (old_graph(), new_graph());
    let result = GraphDiffer::default().diff(&old, &new);

    assert_eq!(
        changes(&result),
        vec![
            (ROOT_ID, ChangeKind::Equal),
            ("a", ChangeKind::Equal),
            ("b", ChangeKind::Version),
            ("c", ChangeKind::Added),
        ]
    );

    let b = result.get("b").unwrap();
    assert_eq!(b.label, "B 3.0");
    assert_eq!(b.previous_version, Some("2.0"));
    assert_eq!(b.node.version(), Some("3.0"));
    assert_eq!(result.get(ROOT_ID).unwrap().label, "App");
}

#[test]
fn test_removed_points_at_old_node() {
    let (old, new) = (new_graph(), old_graph());
    let result = GraphDiffer::default().diff(&old, &new);

    let c = result.get("c").unwrap();
    assert_eq!(c.change, ChangeKind::Removed);
    assert_eq!(c.label, "C 1.0");
    assert!(std::ptr::eq(c.node, old.get_node("c").unwrap()));
    assert_eq!(result.get("b").unwrap().previous_version, Some("3.0"));
}

#[test]
fn test_every_id_appears_once() {
    let (old, new) = (new_graph(), graph(vec![PackageMetadata::new("D", "0.1")]));
    let result = GraphDiffer::default().diff(&old, &new);

    let mut ids: Vec<_> = result.entries.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![ROOT_ID, "a", "b", "c", "d"]);

    let summary = result.summary();
    assert_eq!(
        summary,
        DiffSummary {
            added: 1,
            removed: 3,
            version: 0,
            equal: 1,
        }
    );
}

#[test]
fn test_edges_are_concatenated_and_tagged() {
    let (old, new) = (old_graph(), new_graph());
    let result = GraphDiffer::default().diff(&old, &new);

    assert_eq!(result.edges.len(), old.edge_count() + new.edge_count());
    assert_eq!(
        result.edges[0],
        DiffEdge {
            from: ROOT_ID,
            to: "a",
            change: None,
        }
    );

    let to_c: Vec<_> = result.edges.iter().filter(|e| e.to == "c").collect();
    assert_eq!(to_c.len(), 1);
    assert_eq!(to_c[0].from, "a");
    assert_eq!(to_c[0].change, Some(ChangeKind::Added));
}

#[test]
fn test_view_hides_removed_unless_requested() {
    let (old, new) = (new_graph(), old_graph());
    let result = GraphDiffer::default().diff(&old, &new);

    assert_eq!(result.view(false).len(), 3);
    assert!(result.view(false).iter().all(|e| e.change != ChangeKind::Removed));
    assert_eq!(result.view(true).len(), 4);
    assert_eq!(result.entries.len(), 4);
}

#[test]
fn test_identical_graphs_are_equal() {
    let (old, new) = (new_graph(), new_graph());
    let summary = GraphDiffer::default().diff(&old, &new).summary();
    assert_eq!(summary.equal, 4);
    assert_eq!(summary.added + summary.removed + summary.version, 0);
}

#[test]
fn test_serialized_entry_shape() {
    let (old, new) = (old_graph(), new_graph());
    let result = GraphDiffer::default().diff(&old, &new);

    let json = serde_json::to_value(&result).unwrap();
    let b = &json["entries"][2];
    assert_eq!(b["id"], "b");
    assert_eq!(b["change"], "version");
    assert_eq!(b["previous_version"], "2.0");
    assert_eq!(b["depth"], 1);
    assert!(b.get("node").is_none());
    assert!(json["entries"][1].get("previous_version").is_none());
}

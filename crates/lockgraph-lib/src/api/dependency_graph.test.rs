// Tests for dependency graph construction

use super::*;

// ============================================================================
// Test Utilities
// ============================================================================

/// Package metadata with the given requirement specifiers
fn package(name: &str, version: &str, requires: &[&str]) -> PackageMetadata {
    requires
        .iter()
        .fold(PackageMetadata::new(name, version), |metadata, spec| {
            metadata.with_requirement(*spec)
        })
}

/// Resolved set plus a lockfile pinning exactly those packages
fn resolved(packages: Vec<PackageMetadata>) -> (ResolvedPackages, Lockfile) {
    let lockfile = Lockfile::from_pins(
        packages
            .iter()
            .map(|p| (p.name.clone(), format!("=={}", p.version))),
    );
    let resolved = packages
        .into_iter()
        .map(|p| (p.id(), Arc::new(p)))
        .collect();
    (resolved, lockfile)
}

fn build(packages: Vec<PackageMetadata>, manifest: &[&str]) -> DependencyGraph {
    let (resolved, lockfile) = resolved(packages);
    let manifest = Manifest::from_names(manifest.iter().copied());
    GraphBuilder::new(&lockfile, &manifest).build(&resolved)
}

fn depth(graph: &DependencyGraph, id: &str) -> Option<i32> {
    graph.get_node(id).and_then(|node| node.depth)
}

fn ids(nodes: Vec<&PackageNode>) -> Vec<&str> {
    nodes.into_iter().map(|node| node.id.as_str()).collect()
}

// ============================================================================
// Basic Graph Operations
// ============================================================================

#[test]
fn test_new_graph_holds_only_root() {
    let graph = DependencyGraph::new();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
    assert!(!graph.has_packages());

    let root = graph.root();
    assert!(root.is_root());
    assert_eq!(root.label, ROOT_LABEL);
    assert_eq!(root.depth, Some(-1));
    assert!(root.metadata.is_none());
}

#[test]
fn test_add_node_is_idempotent() {
    let mut graph = DependencyGraph::new();
    let metadata = Arc::new(PackageMetadata::new("six", "1.16.0"));

    let first = graph.add_node(PackageNode::package("six", metadata.clone()));
    let second = graph.add_node(PackageNode::package("six", metadata));

    assert_eq!(first, second);
    assert_eq!(graph.node_count(), 2);
}

#[test]
fn test_add_edge_unknown_node() {
    let mut graph = DependencyGraph::new();
    let result = graph.add_edge(ROOT_ID, "ghost");
    assert!(matches!(
        result,
        Err(DependencyGraphError::NodeNotFound { id }) if id == "ghost"
    ));
}

// ============================================================================
// Root Inference
// ============================================================================

#[test]
fn test_unrequired_package_is_root() {
    let graph = build(
        vec![
            package("a", "1.0", &["b>=1"]),
            package("b", "1.0", &["c"]),
            package("c", "1.0", &[]),
        ],
        &[],
    );

    assert_eq!(ids(graph.root_candidates()), vec!["a"]);
    assert_eq!(depth(&graph, ROOT_ID), Some(-1));
    assert_eq!(depth(&graph, "a"), Some(0));
    assert_eq!(depth(&graph, "b"), Some(1));
    assert_eq!(depth(&graph, "c"), Some(2));
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_manifest_forces_root() {
    let graph = build(
        vec![package("a", "1.0", &["b"]), package("b", "1.0", &[])],
        &["B"],
    );

    assert_eq!(ids(graph.root_candidates()), vec!["a", "b"]);
    assert_eq!(depth(&graph, "b"), Some(0));
    assert_eq!(ids(graph.dependencies("a").unwrap()), vec!["b"]);
}

#[test]
fn test_requirement_outside_lockfile_does_not_block_root() {
    let (resolved, _) = resolved(vec![
        package("a", "1.0", &["b"]),
        package("b", "1.0", &[]),
    ]);
    // b is resolved but missing from the lockfile the builder sees
    let lockfile = Lockfile::from_pins([("a", "==1.0")]);
    let graph = GraphBuilder::new(&lockfile, &Manifest::new()).build(&resolved);

    assert_eq!(ids(graph.root_candidates()), vec!["a", "b"]);
    assert_eq!(depth(&graph, "b"), Some(0));
}

#[test]
fn test_self_requirement_ignored() {
    let graph = build(vec![package("a", "1.0", &["a[extra]"])], &[]);

    assert_eq!(ids(graph.root_candidates()), vec!["a"]);
    assert!(graph.dependencies("a").unwrap().is_empty());
    assert_eq!(graph.edge_count(), 1);
    assert!(!graph.has_cycles());
}

// ============================================================================
// Depth Labeling
// ============================================================================

#[test]
fn test_depth_fixed_at_first_discovery() {
    // a -> x -> y -> b and a -> b: b is discovered at depth 1 first
    let graph = build(
        vec![
            package("a", "1.0", &["x", "b"]),
            package("x", "1.0", &["y"]),
            package("y", "1.0", &["b"]),
            package("b", "1.0", &[]),
        ],
        &[],
    );

    assert_eq!(depth(&graph, "b"), Some(1));
    assert_eq!(depth(&graph, "y"), Some(2));
    let into_b: Vec<_> = graph.edges().filter(|(_, to)| *to == "b").map(|(from, _)| from).collect();
    assert_eq!(into_b, vec!["a", "y"]);
}

#[test]
fn test_manifest_root_keeps_depth_zero_when_required_deeper() {
    let graph = build(
        vec![
            package("a", "1.0", &["m"]),
            package("m", "1.0", &["z"]),
            package("z", "1.0", &[]),
        ],
        &["m"],
    );

    assert_eq!(depth(&graph, "m"), Some(0));
    assert_eq!(depth(&graph, "z"), Some(1));
}

#[test]
fn test_cycle_tolerated() {
    let graph = build(
        vec![package("a", "1.0", &["b"]), package("b", "1.0", &["a"])],
        &["a"],
    );

    assert_eq!(depth(&graph, "a"), Some(0));
    assert_eq!(depth(&graph, "b"), Some(1));
    assert_eq!(ids(graph.dependencies("b").unwrap()), vec!["a"]);
    assert!(graph.has_cycles());
}

#[test]
fn test_parallel_edges_kept() {
    let graph = build(
        vec![
            package("a", "1.0", &["b", "b[socks] ; extra == 'socks'"]),
            package("b", "1.0", &[]),
        ],
        &[],
    );

    assert_eq!(ids(graph.dependencies("a").unwrap()), vec!["b", "b"]);
    assert_eq!(depth(&graph, "b"), Some(1));
}

#[test]
fn test_names_are_canonicalized() {
    let graph = build(
        vec![
            package("Flask", "2.3.2", &["Zope.Interface (>=5.0)"]),
            package("zope.interface", "6.0", &[]),
        ],
        &[],
    );

    let zope = graph.get_node("zope-interface").unwrap();
    assert_eq!(zope.label, "zope.interface");
    assert_eq!(zope.depth, Some(1));
    assert_eq!(graph.get_node("flask").unwrap().label, "Flask");
}

#[test]
fn test_malformed_and_unknown_requirements_skipped() {
    let graph = build(
        vec![
            package("a", "1.0", &["(>=1.0)", "not-locked>=2", "b"]),
            package("b", "1.0", &[]),
        ],
        &[],
    );

    assert_eq!(ids(graph.dependencies("a").unwrap()), vec!["b"]);
    assert!(!graph.contains("not-locked"));
}

// ============================================================================
// Reachability
// ============================================================================

#[test]
fn test_unreachable_nodes_excluded() {
    // a and b only require each other, so neither can be a root
    let graph = build(
        vec![
            package("a", "1.0", &["b"]),
            package("b", "1.0", &["a"]),
            package("c", "1.0", &[]),
        ],
        &[],
    );

    assert!(!graph.contains("a"));
    assert!(!graph.contains("b"));
    assert!(graph.contains("c"));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.nodes().all(|node| node.depth.is_some()));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_unreachable_nodes_reported_at_warn() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        build(
            vec![
                package("a", "1.0", &["b"]),
                package("b", "1.0", &["a"]),
                package("c", "1.0", &[]),
            ],
            &[],
        );
    });

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"));
    assert!(output.contains("Dropping unreachable packages: a, b"));
}

#[test]
fn test_empty_resolution_has_no_packages() {
    let graph = build(Vec::new(), &[]);
    assert!(!graph.has_packages());
    assert!(graph.root_candidates().is_empty());
}

// ============================================================================
// Queries
// ============================================================================

fn diamond() -> DependencyGraph {
    // root -> a -> b -> c, root -> d -> c, root -> e
    build(
        vec![
            package("a", "1.0", &["b"]),
            package("b", "1.0", &["c"]),
            package("c", "1.0", &[]),
            package("d", "1.0", &["c"]),
            package("e", "1.0", &[]),
        ],
        &[],
    )
}

#[test]
fn test_bfs_from_node() {
    let graph = diamond();
    let visited: Vec<_> = graph.bfs("a").unwrap().map(|n| n.id.as_str()).collect();
    assert_eq!(visited, vec!["a", "b", "c"]);
    assert!(graph.bfs("ghost").is_none());
}

#[test]
fn test_paths_to_root() {
    let graph = diamond();
    let view = graph.paths_to_root(&["c"]).unwrap();

    let nodes: Vec<_> = view.nodes.iter().map(|n| n.id).collect();
    assert_eq!(nodes, vec![ROOT_ID, "a", "b", "c", "d"]);
    assert_eq!(view.edges.len(), 5);
    assert!(view.edges.iter().all(|e| e.from != "e" && e.to != "e"));
}

#[test]
fn test_paths_to_root_unknown_id() {
    let graph = diamond();
    assert!(graph.paths_to_root(&["c", "ghost"]).is_err());
}

#[test]
fn test_view_serialization() {
    let graph = build(
        vec![package("Six", "1.16.0", &[]).with_license("MIT")],
        &[],
    );

    let json = serde_json::to_value(graph.view()).unwrap();
    assert_eq!(json["nodes"][0]["id"], ROOT_ID);
    assert_eq!(json["nodes"][0]["depth"], -1);
    assert!(json["nodes"][0].get("version").is_none());
    assert_eq!(json["nodes"][1]["label"], "Six");
    assert_eq!(json["nodes"][1]["version"], "1.16.0");
    assert_eq!(json["nodes"][1]["license"], "MIT");
    assert_eq!(json["edges"][0]["from"], ROOT_ID);
    assert_eq!(json["edges"][0]["to"], "six");
}

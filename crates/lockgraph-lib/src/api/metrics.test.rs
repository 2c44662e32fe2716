// Tests for dependency and license metrics

use super::*;
use crate::api::dependency_graph::{GraphBuilder, ROOT_ID};
use crate::api::licenses::{LicenseInfo, SpdxLicenseList};
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

/// R -> D -> G
fn chain() -> DependencyGraph {
    graph(vec![
        PackageMetadata::new("R", "1.0")
            .with_requirement("D")
            .with_license("MIT"),
        PackageMetadata::new("D", "1.0")
            .with_requirement("G")
            .with_license("Apache License 2.0"),
        PackageMetadata::new("G", "1.0").with_license("Custom EULA"),
    ])
}

fn registry() -> SpdxLicenseList {
    SpdxLicenseList::from_licenses(vec![
        LicenseInfo {
            license_id: "MIT".to_string(),
            name: "MIT License".to_string(),
            is_osi_approved: true,
            is_fsf_libre: Some(true),
        },
        LicenseInfo {
            license_id: "Apache-2.0".to_string(),
            name: "Apache License 2.0".to_string(),
            is_osi_approved: true,
            is_fsf_libre: Some(true),
        },
    ])
}

fn roots(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

// ============================================================================
// Dependency Counts
// ============================================================================

#[test]
fn test_depth_classes_from_single_root() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r"]));

    let expected = DepthCounts {
        roots: 1,
        direct: 1,
        indirect: 1,
    };
    assert_eq!(metrics.dependencies.all, expected);
    assert_eq!(metrics.dependencies.roots["r"], expected);
}

#[test]
fn test_repeated_root_walked_once() {
    let metrics = MetricsAggregator::new(&registry()).aggregate(&chain(), &roots(&["r", "d", "r"]));

    let per_root: usize = metrics.dependencies.roots.values().map(DepthCounts::total).sum();
    assert_eq!(metrics.dependencies.roots.len(), 2);
    assert_eq!(metrics.dependencies.roots["r"].total(), 3);
    assert_eq!(metrics.dependencies.all.total(), per_root);
    assert_eq!(metrics.licenses.total, 5);
}

#[test]
fn test_designated_root_counts_as_root_at_any_depth() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["d"]));

    assert_eq!(
        metrics.dependencies.roots["d"],
        DepthCounts {
            roots: 1,
            direct: 0,
            indirect: 1,
        }
    );
}

#[test]
fn test_each_root_is_walked_independently() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r", "d"]));

    assert_eq!(metrics.dependencies.roots["r"].total(), 3);
    assert_eq!(metrics.dependencies.roots["d"].total(), 2);
    // d is designated, so it is a root in r's walk too
    assert_eq!(metrics.dependencies.roots["r"].roots, 2);
    assert_eq!(metrics.dependencies.all.total(), 5);
    assert_eq!(metrics.licenses.total, 5);
}

#[test]
fn test_unknown_root_is_skipped() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["ghost"]));

    assert!(metrics.dependencies.roots.is_empty());
    assert_eq!(metrics.dependencies.all.total(), 0);
}

#[test]
fn test_default_roots_are_root_candidates() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate_default(&chain());

    let keys: Vec<_> = metrics.dependencies.roots.keys().cloned().collect();
    assert_eq!(keys, vec!["r"]);
}

#[test]
fn test_application_root_has_no_license() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&[ROOT_ID]));

    assert_eq!(metrics.dependencies.all.total(), 4);
    assert_eq!(metrics.licenses.total, 3);
    assert_eq!(metrics.licenses.root.as_deref(), Some("MIT"));
}

// ============================================================================
// Licenses
// ============================================================================

#[test]
fn test_license_matched_by_id_and_name() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r"]));
    let licenses = &metrics.licenses;

    assert_eq!(licenses.root.as_deref(), Some("MIT"));

    let mit = &licenses.all["MIT"];
    assert!(mit.found);
    assert_eq!(mit.is_osi_approved, Some(true));
    assert_eq!(mit.packages["R"], Some(0));

    // declared by full name, recorded under the registry id
    let apache = &licenses.all["Apache-2.0"];
    assert_eq!(apache.packages["D"], Some(1));
    assert!(!licenses.all.contains_key("Apache License 2.0"));
}

#[test]
fn test_unmatched_license_falls_back_to_raw_string() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r"]));

    let custom = &metrics.licenses.all["Custom EULA"];
    assert!(!custom.found);
    assert_eq!(custom.is_osi_approved, None);
    assert_eq!(custom.is_fsf_libre, None);
    assert_eq!(custom.packages["G"], Some(2));
    assert_eq!(metrics.licenses.total, 3);
}

#[test]
fn test_empty_registry_finds_nothing() {
    let registry = SpdxLicenseList::empty();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r"]));

    assert_eq!(metrics.licenses.all.len(), 3);
    assert!(metrics.licenses.all.values().all(|entry| !entry.found));
}

#[test]
fn test_license_entry_serialization() {
    let registry = registry();
    let metrics = MetricsAggregator::new(&registry).aggregate(&chain(), &roots(&["r"]));

    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["dependencies"]["all"]["direct"], 1);
    assert_eq!(json["dependencies"]["roots"]["r"]["indirect"], 1);

    let custom = &json["licenses"]["all"]["Custom EULA"];
    assert_eq!(custom["G"], 2);
    assert_eq!(custom["_found"], false);
    assert!(custom["_isOsiApproved"].is_null());
    assert_eq!(json["licenses"]["all"]["MIT"]["_isFsfLibre"], true);
    assert_eq!(json["licenses"]["total"], 3);
}

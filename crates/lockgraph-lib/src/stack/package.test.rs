// Tests for package metadata and requirement parsing

use super::*;

#[test]
fn test_canonical_id_lowercases_and_replaces_dots() {
    assert_eq!(canonical_id("Flask"), "flask");
    assert_eq!(canonical_id("zope.interface"), "zope-interface");
    assert_eq!(canonical_id("backports.zoneinfo.tz"), "backports-zoneinfo-tz");
    assert_eq!(canonical_id("typing_extensions"), "typing_extensions");
}

#[test]
fn test_normalize_version_strips_pin() {
    assert_eq!(normalize_version("==2.31.0"), "2.31.0");
    assert_eq!(normalize_version("2.31.0"), "2.31.0");
    assert_eq!(normalize_version(" == 1.0 "), "1.0");
}

#[test]
fn test_parse_bare_name() {
    let req: Requirement = "idna".parse().unwrap();
    assert_eq!(req.name, "idna");
    assert!(req.extras.is_empty());
    assert_eq!(req.constraint, None);
    assert_eq!(req.marker, None);
}

#[test]
fn test_parse_pep508_forms() {
    let req: Requirement = "idna<3,>=2.5".parse().unwrap();
    assert_eq!(req.name, "idna");
    assert_eq!(req.constraint.as_deref(), Some("<3,>=2.5"));

    let req: Requirement = "chardet (<5,>=3.0.2)".parse().unwrap();
    assert_eq!(req.name, "chardet");
    assert_eq!(req.constraint.as_deref(), Some("<5,>=3.0.2"));

    let req: Requirement = "PySocks (!=1.5.7,>=1.5.6) ; extra == 'socks'".parse().unwrap();
    assert_eq!(req.id(), "pysocks");
    assert_eq!(req.constraint.as_deref(), Some("!=1.5.7,>=1.5.6"));
    assert_eq!(req.marker.as_deref(), Some("extra == 'socks'"));
}

#[test]
fn test_parse_extras() {
    let req: Requirement = "requests[security, socks]>=2.0".parse().unwrap();
    assert_eq!(req.name, "requests");
    assert_eq!(req.extras, vec!["security".to_string(), "socks".to_string()]);
    assert_eq!(req.constraint.as_deref(), Some(">=2.0"));
}

#[test]
fn test_parse_direct_reference() {
    let req: Requirement = "pip @ https://example.com/pip.zip".parse().unwrap();
    assert_eq!(req.name, "pip");
    assert_eq!(req.constraint.as_deref(), Some("@ https://example.com/pip.zip"));
}

#[test]
fn test_malformed_requirements_are_rejected() {
    for spec in ["", "   ", ">=1.0", "-leading", "trailing-", "name garbage", "pkg[extra"] {
        let result = spec.parse::<Requirement>();
        assert!(
            matches!(result, Err(PackageError::MalformedRequirement { .. })),
            "expected '{}' to be malformed, got {:?}",
            spec,
            result
        );
    }
}

#[test]
fn test_metadata_requirements_split_good_and_bad() {
    let metadata = PackageMetadata::new("requests", "2.31.0")
        .with_requirement("idna<4,>=2.5")
        .with_requirement("!!!")
        .with_requirement("urllib3<3,>=1.21.1");

    let (parsed, malformed) = metadata.requirements();
    let ids: Vec<String> = parsed.iter().map(Requirement::id).collect();
    assert_eq!(ids, vec!["idna", "urllib3"]);
    assert_eq!(malformed.len(), 1);
}

#[test]
fn test_metadata_deserializes_nulls_as_empty() {
    let json = r#"{"name": "Zope.Interface", "version": "6.0", "requires_dist": null, "license": null}"#;
    let metadata: PackageMetadata = serde_json::from_str(json).unwrap();
    assert_eq!(metadata.id(), "zope-interface");
    assert!(metadata.requires_dist.is_empty());
    assert_eq!(metadata.license, "");
    assert_eq!(metadata.summary, None);
}

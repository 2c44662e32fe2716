// Tests for license registry lookups

use super::*;
use crate::networking::NetworkingConfig;
use mockito::Server;

const LICENSES_JSON: &str = r#"{
    "licenseListVersion": "3.21",
    "licenses": [
        {
            "reference": "https://spdx.org/licenses/MIT.html",
            "isDeprecatedLicenseId": false,
            "name": "MIT License",
            "licenseId": "MIT",
            "seeAlso": [],
            "isOsiApproved": true,
            "isFsfLibre": true
        },
        {
            "name": "Apache License 2.0",
            "licenseId": "Apache-2.0",
            "isOsiApproved": true,
            "isFsfLibre": true
        },
        {
            "name": "Zope Public License 2.1",
            "licenseId": "ZPL-2.1",
            "isOsiApproved": true
        }
    ]
}"#;

fn networking() -> Arc<NetworkingManager> {
    Arc::new(NetworkingManager::new(NetworkingConfig::default()).unwrap())
}

#[test]
fn test_lookup_by_id_and_name_ignores_case() {
    let list = SpdxLicenseList::from_json_str(LICENSES_JSON).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.version(), Some("3.21"));

    assert_eq!(list.lookup("mit").unwrap().license_id, "MIT");
    assert_eq!(list.lookup("MIT LICENSE").unwrap().license_id, "MIT");
    assert_eq!(list.lookup("apache-2.0").unwrap().name, "Apache License 2.0");
}

#[test]
fn test_missing_fsf_flag_is_none() {
    let list = SpdxLicenseList::from_json_str(LICENSES_JSON).unwrap();
    let zpl = list.lookup("zpl-2.1").unwrap();
    assert!(zpl.is_osi_approved);
    assert_eq!(zpl.is_fsf_libre, None);
}

#[test]
fn test_lookup_misses() {
    let list = SpdxLicenseList::from_json_str(LICENSES_JSON).unwrap();
    assert!(list.lookup("BSD").is_none());
    assert!(list.lookup("").is_none());
    assert!(list.lookup("MIT License, see LICENSE").is_none());
    assert!(SpdxLicenseList::empty().lookup("MIT").is_none());
}

#[test]
fn test_earlier_entry_wins_on_collision() {
    let list = SpdxLicenseList::from_licenses(vec![
        LicenseInfo {
            license_id: "First".to_string(),
            name: "Shared".to_string(),
            is_osi_approved: true,
            is_fsf_libre: None,
        },
        LicenseInfo {
            license_id: "Shared".to_string(),
            name: "Second".to_string(),
            is_osi_approved: false,
            is_fsf_libre: Some(false),
        },
    ]);

    assert_eq!(list.lookup("shared").unwrap().license_id, "First");
    assert_eq!(list.lookup("second").unwrap().license_id, "Shared");
}

#[tokio::test]
async fn test_live_fetch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/licenses.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LICENSES_JSON)
        .create_async()
        .await;

    let client = LiveLicenseClient::with_url(networking(), format!("{}/licenses.json", server.url()));
    let list = client.fetch().await.unwrap();

    assert_eq!(list.len(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_live_fetch_failure_degrades_to_empty() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/licenses.json")
        .with_status(500)
        .create_async()
        .await;

    let client = LiveLicenseClient::with_url(networking(), format!("{}/licenses.json", server.url()));
    assert!(client.fetch().await.is_err());

    let list = client.fetch_or_empty().await;
    assert!(list.is_empty());
}

//! License registry lookups
//!
//! The registry is the SPDX license list (`licenses.json`). Lookups match a
//! declared license string against either the full license name or the SPDX
//! identifier, ignoring case.

use crate::networking::{NetworkingError, NetworkingManager};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Default location of the SPDX license list
pub const DEFAULT_LICENSE_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/main/json/licenses.json";

/// License registry errors
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("Failed to fetch license list: {source}")]
    Network {
        #[from]
        source: NetworkingError,
    },
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    /// SPDX identifier, e.g. `Apache-2.0`
    pub license_id: String,
    /// Full name, e.g. `Apache License 2.0`
    pub name: String,
    #[serde(default)]
    pub is_osi_approved: bool,
    #[serde(default)]
    pub is_fsf_libre: Option<bool>,
}

/// Lookup of a license by name or identifier
pub trait LicenseRegistry {
    /// Find the entry whose name or identifier equals `name_or_id` (case-insensitive)
    fn lookup(&self, name_or_id: &str) -> Option<&LicenseInfo>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLicenseList {
    #[serde(default)]
    license_list_version: Option<String>,
    #[serde(default)]
    licenses: Vec<LicenseInfo>,
}

/// In-memory SPDX license list with a case-insensitive index
#[derive(Debug, Clone, Default)]
pub struct SpdxLicenseList {
    version: Option<String>,
    licenses: Vec<LicenseInfo>,
    index: HashMap<String, usize>,
}

impl SpdxLicenseList {
    /// Registry with no entries; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from entries; on key collisions the earlier entry wins
    pub fn from_licenses(licenses: Vec<LicenseInfo>) -> Self {
        let mut index = HashMap::with_capacity(licenses.len() * 2);
        for (position, license) in licenses.iter().enumerate() {
            index.entry(license.name.to_lowercase()).or_insert(position);
            index
                .entry(license.license_id.to_lowercase())
                .or_insert(position);
        }

        Self {
            version: None,
            licenses,
            index,
        }
    }

    /// Parse an SPDX `licenses.json` document
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let raw: RawLicenseList = serde_json::from_str(content)?;
        let mut list = Self::from_licenses(raw.licenses);
        list.version = raw.license_list_version;
        Ok(list)
    }

    /// License list version reported by SPDX
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

impl LicenseRegistry for SpdxLicenseList {
    fn lookup(&self, name_or_id: &str) -> Option<&LicenseInfo> {
        let key = name_or_id.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.index.get(&key).map(|&position| &self.licenses[position])
    }
}

/// Fetches the SPDX license list over HTTP
pub struct LiveLicenseClient {
    networking: Arc<NetworkingManager>,
    url: String,
}

impl LiveLicenseClient {
    /// Create client for the default SPDX location
    pub fn new(networking: Arc<NetworkingManager>) -> Self {
        Self::with_url(networking, DEFAULT_LICENSE_URL.to_string())
    }

    /// Create client for a custom license list URL
    pub fn with_url(networking: Arc<NetworkingManager>, url: String) -> Self {
        Self { networking, url }
    }

    /// Download and index the license list
    pub async fn fetch(&self) -> Result<SpdxLicenseList, LicenseError> {
        let raw: RawLicenseList = self.networking.get_json(&self.url).await?;
        let mut list = SpdxLicenseList::from_licenses(raw.licenses);
        list.version = raw.license_list_version;
        debug!(
            "Loaded {} licenses (list version {:?})",
            list.len(),
            list.version()
        );
        Ok(list)
    }

    /// Download the license list, degrading to an empty registry on failure
    pub async fn fetch_or_empty(&self) -> SpdxLicenseList {
        match self.fetch().await {
            Ok(list) => list,
            Err(e) => {
                warn!("License registry unavailable, licenses will be unmatched: {}", e);
                SpdxLicenseList::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("licenses.test.rs");
}

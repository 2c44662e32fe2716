//! Lockfile and manifest inputs
//!
//! The lockfile is a `Pipfile.lock` JSON document (name -> pinned entry) and
//! the manifest is a `Pipfile` TOML document (name -> constraint). Only the
//! presence of a manifest key matters to graph construction.

use super::package::{canonical_id, normalize_version};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{trace, warn};

/// Errors that can occur while loading lockfile or manifest inputs
#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse lockfile JSON: {source}")]
    JsonParseError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to parse manifest TOML: {source}")]
    TomlParseError {
        #[from]
        source: toml::de::Error,
    },

    #[error("Lockfile has no '{section}' section")]
    MissingSection { section: String },
}

/// One entry of the lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockedPackage {
    /// Pinned version specifier, usually `==X`; absent for VCS/editable entries
    #[serde(default)]
    pub version: Option<String>,
    /// Package index the pin was resolved against
    #[serde(default)]
    pub index: Option<String>,
    /// Environment marker attached by the locker
    #[serde(default)]
    pub markers: Option<String>,
}

impl LockedPackage {
    /// Pinned entry with the given version specifier
    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            index: None,
            markers: None,
        }
    }

    /// Version with any `==` prefix removed
    pub fn normalized_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .map(normalize_version)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawPipfileLock {
    default: Option<BTreeMap<String, LockedPackage>>,
    #[serde(default)]
    develop: BTreeMap<String, LockedPackage>,
}

/// Package name -> pinned version mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    packages: BTreeMap<String, LockedPackage>,
}

impl Lockfile {
    /// Create an empty lockfile
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lockfile from `(name, version specifier)` pairs
    pub fn from_pins<I, N, V>(pins: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let packages = pins
            .into_iter()
            .map(|(name, version)| (name.into(), LockedPackage::pinned(version)))
            .collect();
        Self { packages }
    }

    /// Parse a `Pipfile.lock` document
    ///
    /// The `develop` section is merged in when `include_develop` is set;
    /// a package present in both keeps its `default` pin.
    pub fn from_pipfile_lock_str(
        content: &str,
        include_develop: bool,
    ) -> Result<Self, LockfileError> {
        let raw: RawPipfileLock = serde_json::from_str(content)?;

        let mut packages = raw.default.ok_or_else(|| LockfileError::MissingSection {
            section: "default".to_string(),
        })?;

        if include_develop {
            for (name, entry) in raw.develop {
                packages.entry(name).or_insert(entry);
            }
        }

        trace!("Parsed lockfile with {} packages", packages.len());
        Ok(Self { packages })
    }

    /// Read and parse a `Pipfile.lock` from disk
    pub fn load(path: &Path, include_develop: bool) -> Result<Self, LockfileError> {
        let content = std::fs::read_to_string(path).map_err(|e| LockfileError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_pipfile_lock_str(&content, include_develop)
    }

    /// Insert or replace one entry
    pub fn insert(&mut self, name: impl Into<String>, entry: LockedPackage) {
        self.packages.insert(name.into(), entry);
    }

    /// Entries that carry a usable pin, as `(name, normalized version)`
    ///
    /// Unpinned entries are reported and skipped.
    pub fn pinned(&self) -> Vec<(String, String)> {
        self.packages
            .iter()
            .filter_map(|(name, entry)| match entry.normalized_version() {
                Some(version) => Some((name.clone(), version.to_string())),
                None => {
                    warn!("Skipping unpinned lockfile entry: {}", name);
                    None
                }
            })
            .collect()
    }

    /// Canonical ids of every entry
    pub fn ids(&self) -> BTreeSet<String> {
        self.packages.keys().map(|name| canonical_id(name)).collect()
    }

    /// Whether the lockfile lists a package with this canonical id
    pub fn contains(&self, id: &str) -> bool {
        self.packages.keys().any(|name| canonical_id(name) == id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawPipfile {
    #[serde(default)]
    packages: BTreeMap<String, toml::Value>,
    #[serde(default, rename = "dev-packages")]
    dev_packages: BTreeMap<String, toml::Value>,
}

/// Top-level manifest; only the declared package names matter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    packages: BTreeSet<String>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest declaring the given names
    pub fn from_names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let packages = names.into_iter().map(Into::into).collect();
        Self { packages }
    }

    /// Parse a `Pipfile` document
    ///
    /// Constraints (`"*"`, `">=1.0"`, inline tables) are accepted but not kept.
    pub fn from_pipfile_str(content: &str, include_dev: bool) -> Result<Self, LockfileError> {
        let raw: RawPipfile = toml::from_str(content)?;

        let mut packages: BTreeSet<String> = raw.packages.into_keys().collect();
        if include_dev {
            packages.extend(raw.dev_packages.into_keys());
        }

        Ok(Self { packages })
    }

    /// Read and parse a `Pipfile` from disk
    pub fn load(path: &Path, include_dev: bool) -> Result<Self, LockfileError> {
        let content = std::fs::read_to_string(path).map_err(|e| LockfileError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_pipfile_str(&content, include_dev)
    }

    /// Canonical ids of every declared package
    pub fn ids(&self) -> BTreeSet<String> {
        self.packages.iter().map(|name| canonical_id(name)).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    include!("lockfile.test.rs");
}

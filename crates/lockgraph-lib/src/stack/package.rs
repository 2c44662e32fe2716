//! Package metadata and requirement specifiers
//!
//! `PackageMetadata` is what the metadata service returns for one pinned
//! release. Requirement strings (`requires_dist` entries) are parsed lazily
//! so that a single malformed entry never poisons the rest of the package.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while interpreting package data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("Malformed requirement '{spec}': {reason}")]
    MalformedRequirement { spec: String, reason: String },
}

/// Canonical package identifier: lower-cased, every `.` replaced by `-`
pub fn canonical_id(name: &str) -> String {
    name.trim().to_lowercase().replace('.', "-")
}

/// Strip the `==` pin operator from a locked version specifier
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    version.strip_prefix("==").unwrap_or(version).trim()
}

/// Metadata for one released package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Distribution name as published (original casing)
    pub name: String,
    /// Exact version
    pub version: String,
    /// Raw requirement specifiers declared by this release
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requires_dist: Vec<String>,
    /// Declared license, empty when unknown
    #[serde(default, deserialize_with = "null_as_empty")]
    pub license: String,
    /// One-line summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PackageMetadata {
    /// Create metadata without requirements or license
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            requires_dist: Vec::new(),
            license: String::new(),
            summary: None,
        }
    }

    /// Add a raw requirement specifier
    pub fn with_requirement(mut self, spec: impl Into<String>) -> Self {
        self.requires_dist.push(spec.into());
        self
    }

    /// Set the declared license
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    /// Canonical id derived from the published name
    pub fn id(&self) -> String {
        canonical_id(&self.name)
    }

    /// Parse every requirement, returning successes and failures separately
    pub fn requirements(&self) -> (Vec<Requirement>, Vec<PackageError>) {
        let mut parsed = Vec::with_capacity(self.requires_dist.len());
        let mut malformed = Vec::new();

        for spec in &self.requires_dist {
            match spec.parse::<Requirement>() {
                Ok(requirement) => parsed.push(requirement),
                Err(e) => malformed.push(e),
            }
        }

        (parsed, malformed)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One parsed requirement specifier, e.g. `requests[socks] (>=2.0) ; python_version < "3"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Name exactly as written
    pub name: String,
    /// Requested extras
    pub extras: Vec<String>,
    /// Version constraint with surrounding parentheses removed
    pub constraint: Option<String>,
    /// Environment marker (never evaluated)
    pub marker: Option<String>,
}

impl Requirement {
    /// Canonical id of the required package
    pub fn id(&self) -> String {
        canonical_id(&self.name)
    }
}

impl std::str::FromStr for Requirement {
    type Err = PackageError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| PackageError::MalformedRequirement {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (body, marker) = match spec.split_once(';') {
            Some((body, marker)) => (body.trim(), Some(marker.trim())),
            None => (spec.trim(), None),
        };

        let name_len = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
            .unwrap_or(body.len());
        let name = &body[..name_len];

        if name.is_empty() {
            return Err(malformed("missing package name"));
        }
        if !name.starts_with(|c: char| c.is_ascii_alphanumeric())
            || !name.ends_with(|c: char| c.is_ascii_alphanumeric())
        {
            return Err(malformed("name must start and end with a letter or digit"));
        }

        let mut rest = body[name_len..].trim_start();

        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let (inner, remainder) = after_bracket
                .split_once(']')
                .ok_or_else(|| malformed("unterminated extras"))?;
            extras = inner
                .split(',')
                .map(str::trim)
                .filter(|extra| !extra.is_empty())
                .map(str::to_string)
                .collect();
            rest = remainder.trim_start();
        }

        let constraint = rest
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();

        // `@` introduces a direct URL reference, which still names a package
        if !constraint.is_empty() && !constraint.starts_with(['<', '>', '=', '!', '~', '@']) {
            return Err(malformed("unexpected text after package name"));
        }

        Ok(Self {
            name: name.to_string(),
            extras,
            constraint: (!constraint.is_empty()).then(|| constraint.to_string()),
            marker: marker.filter(|m| !m.is_empty()).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    include!("package.test.rs");
}

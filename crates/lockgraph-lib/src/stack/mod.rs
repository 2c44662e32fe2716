//! Input domain types: package metadata, requirement specifiers, lockfiles
//! and manifests.

pub mod lockfile;
pub mod package;

pub use lockfile::{LockedPackage, Lockfile, LockfileError, Manifest};
pub use package::{PackageError, PackageMetadata, Requirement, canonical_id, normalize_version};

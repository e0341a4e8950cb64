//! Local-first package resolution.
//!
//! A package built in the developer's local tree always shadows the copy
//! published in the distribution, so an in-progress package is picked up
//! without regenerating the whole distribution.

use super::index::LocalPackageIndex;
use super::PackageDescriptor;
use crate::error::BuildError;

/// Fallback source consulted when the local tree has no exact match.
///
/// Implementations may rank candidates however they like; the resolver
/// treats the answer as opaque.
pub trait RemoteResolver {
    fn best_match(&self, name: &str, arch: &str) -> Option<PackageDescriptor>;
}

/// Remote that never has anything. Used when no distribution tree exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteResolver for NoRemote {
    fn best_match(&self, _name: &str, _arch: &str) -> Option<PackageDescriptor> {
        None
    }
}

pub struct PackageResolver<'a> {
    local: &'a LocalPackageIndex,
    remote: &'a dyn RemoteResolver,
}

impl<'a> PackageResolver<'a> {
    pub fn new(local: &'a LocalPackageIndex, remote: &'a dyn RemoteResolver) -> Self {
        Self { local, remote }
    }

    /// Exact local match, else the remote's best match, else
    /// [`BuildError::PackageNotFound`]. Nothing is cached between calls.
    pub fn resolve(&self, name: &str, arch: &str) -> Result<PackageDescriptor, BuildError> {
        if let Some(package) = self.local.lookup(name, arch) {
            return Ok(package.clone());
        }
        if let Some(package) = self.remote.best_match(name, arch) {
            return Ok(package);
        }
        Err(BuildError::PackageNotFound {
            name: name.to_string(),
            arch: arch.to_string(),
        })
    }
}

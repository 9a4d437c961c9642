//! Package location cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::PackagePath;

/// Maps a package path to the directory it was installed in.
///
/// Keyed by the canonical string form of the package path. Owned by the
/// workflow that installs packages, never global; entries are dropped
/// explicitly.
#[derive(Debug, Clone, Default)]
pub struct PackagePathCache {
    entries: HashMap<String, PathBuf>,
}

impl PackagePathCache {
    pub fn new() -> Self {
        PackagePathCache {
            entries: HashMap::new(),
        }
    }

    /// Record where `package` lives. Returns the previous location.
    pub fn insert(&mut self, package: &PackagePath, dir: impl Into<PathBuf>) -> Option<PathBuf> {
        self.entries.insert(package.to_string(), dir.into())
    }

    pub fn get(&self, package: &PackagePath) -> Option<&Path> {
        self.entries.get(&package.to_string()).map(PathBuf::as_path)
    }

    pub fn invalidate(&mut self, package: &PackagePath) -> Option<PathBuf> {
        self.entries.remove(&package.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_invalidate() {
        let mut cache = PackagePathCache::new();
        let pkg = PackagePath::parse("react-native@0.59.0").unwrap();

        assert!(cache.insert(&pkg, "/a/node_modules/react-native").is_none());
        assert_eq!(
            cache.get(&pkg),
            Some(Path::new("/a/node_modules/react-native"))
        );

        // Same base path, different version is a different key.
        let other = PackagePath::parse("react-native@0.60.0").unwrap();
        assert!(cache.get(&other).is_none());
        let unversioned = PackagePath::parse("react-native").unwrap();
        assert!(cache.get(&unversioned).is_none());

        assert!(cache.invalidate(&pkg).is_some());
        assert!(cache.is_empty());
    }
}

//! Ordered dependency lists, unique by base path.

use serde::{Deserialize, Serialize};

use crate::core::PackagePath;

/// Which `package.json` section a dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyKind {
    #[default]
    Regular,
    Dev,
    Peer,
}

impl DependencyKind {
    /// The `package.json` key holding dependencies of this kind.
    pub fn section(&self) -> &'static str {
        match self {
            DependencyKind::Regular => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Peer => "peerDependencies",
        }
    }

    /// Dev and peer dependencies never ship in the native container.
    pub fn ships_in_container(&self) -> bool {
        matches!(self, DependencyKind::Regular)
    }
}

/// A list of packages in insertion order with at most one entry per base path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet {
    entries: Vec<PackagePath>,
}

impl DependencySet {
    pub fn new() -> Self {
        DependencySet {
            entries: Vec::new(),
        }
    }

    /// Insert a package, replacing any entry with the same base path in place.
    ///
    /// Returns the replaced entry.
    pub fn upsert(&mut self, path: PackagePath) -> Option<PackagePath> {
        match self
            .entries
            .iter_mut()
            .find(|p| p.base_path() == path.base_path())
        {
            Some(existing) => Some(std::mem::replace(existing, path)),
            None => {
                self.entries.push(path);
                None
            }
        }
    }

    pub fn get(&self, base_path: &str) -> Option<&PackagePath> {
        self.entries.iter().find(|p| p.base_path() == base_path)
    }

    pub fn contains(&self, base_path: &str) -> bool {
        self.get(base_path).is_some()
    }

    pub fn remove(&mut self, base_path: &str) -> Option<PackagePath> {
        let idx = self
            .entries
            .iter()
            .position(|p| p.base_path() == base_path)?;
        Some(self.entries.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackagePath> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[PackagePath] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<PackagePath> {
        self.entries
    }
}

impl FromIterator<PackagePath> for DependencySet {
    fn from_iter<I: IntoIterator<Item = PackagePath>>(iter: I) -> Self {
        let mut set = DependencySet::new();
        for path in iter {
            set.upsert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a PackagePath;
    type IntoIter = std::slice::Iter<'a, PackagePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

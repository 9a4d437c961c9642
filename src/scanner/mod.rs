//! Native dependency scanning.
//!
//! Walks an installed module tree (`node_modules`) and classifies every
//! package carrying native code. The walk is sequential and sorted by file
//! name; descriptor parsing and native code detection fan out over rayon,
//! and results are re-assembled in discovery order, so repeated scans of an
//! unchanged tree produce identical output.

pub mod detect;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::{
    ModuleType, NativeDependency, NativeDependencyKind, NativeDependencySet, PackageDescriptor,
    PackagePath,
};
use crate::manifest::Manifest;
pub use detect::has_native_code;

/// Error raised when a scan cannot start.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan target not found: {}", path.display())]
    TargetNotFound { path: PathBuf },
}

/// Outcome of inspecting one package directory.
enum Inspection {
    Package {
        path: PackagePath,
        dir: PathBuf,
        kind: Option<NativeDependencyKind>,
    },
    Unreadable {
        dir: PathBuf,
        error: anyhow::Error,
    },
}

/// Classifies the packages of an installed module tree.
#[derive(Default)]
pub struct NativeDependencyScanner<'a> {
    manifest: Option<&'a Manifest>,
}

impl<'a> NativeDependencyScanner<'a> {
    /// A scanner without a manifest: every third-party native package is
    /// reported as not in the manifest.
    pub fn new() -> Self {
        NativeDependencyScanner {
            manifest: None,
        }
    }

    /// Classify third-party packages against `manifest`.
    pub fn with_manifest(mut self, manifest: &'a Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Scan the module tree at `root`.
    ///
    /// `root` is either a `node_modules` directory or a project directory
    /// containing one. Packages with a missing or unreadable `package.json`
    /// are skipped with a warning.
    pub fn scan(&self, root: &Path) -> Result<NativeDependencySet> {
        if !root.is_dir() {
            return Err(ScanError::TargetNotFound {
                path: root.to_path_buf(),
            }
            .into());
        }

        let modules_dir = modules_dir(root);

        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        collect_package_dirs(&modules_dir, &mut seen, &mut dirs);
        tracing::debug!(
            "found {} package directories under {}",
            dirs.len(),
            modules_dir.display()
        );

        let manifest = self.manifest;
        let inspected: Vec<Inspection> = dirs
            .par_iter()
            .map(|dir| inspect(dir, manifest))
            .collect();

        let mut set = NativeDependencySet::new();
        let mut emitted = HashSet::new();
        for item in inspected {
            match item {
                Inspection::Unreadable { dir, error } => {
                    tracing::warn!("skipping {}: {:#}", dir.display(), error);
                }
                Inspection::Package { path, dir, kind } => {
                    if !emitted.insert(path.to_string()) {
                        continue;
                    }
                    if let Some(kind) = kind {
                        tracing::debug!("{} is native ({})", path, kind);
                        set.push(NativeDependency::new(path, kind, dir));
                    }
                }
            }
        }

        Ok(set)
    }
}

/// Resolve the `node_modules` directory to walk.
fn modules_dir(root: &Path) -> PathBuf {
    let nested = root.join("node_modules");
    if root.file_name().is_some_and(|n| n != "node_modules") && nested.is_dir() {
        nested
    } else {
        root.to_path_buf()
    }
}

/// Depth-first walk of a `node_modules` directory, in file name order.
///
/// Scoped directories are expanded in place and each package's own
/// `node_modules` is visited right after it.
fn collect_package_dirs(modules_dir: &Path, seen: &mut HashSet<PathBuf>, out: &mut Vec<PathBuf>) {
    for entry in list_dirs(modules_dir) {
        let name = entry.name();
        if name.starts_with('@') {
            for scoped in list_dirs(&entry.path) {
                visit_package(&scoped.path, seen, out);
            }
        } else {
            visit_package(&entry.path, seen, out);
        }
    }
}

fn visit_package(dir: &Path, seen: &mut HashSet<PathBuf>, out: &mut Vec<PathBuf>) {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    if !seen.insert(canonical) {
        tracing::debug!("already visited {}", dir.display());
        return;
    }

    out.push(dir.to_path_buf());

    let nested = dir.join("node_modules");
    if nested.is_dir() {
        collect_package_dirs(&nested, seen, out);
    }
}

struct ListedDir {
    path: PathBuf,
}

impl ListedDir {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Immediate subdirectories of `dir`, sorted, hidden entries excluded.
fn list_dirs(dir: &Path) -> Vec<ListedDir> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("failed to read entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| ListedDir {
            path: entry.into_path(),
        })
        .collect()
}

fn inspect(dir: &Path, manifest: Option<&Manifest>) -> Inspection {
    let descriptor = match PackageDescriptor::load(dir) {
        Ok(d) => d,
        Err(error) => {
            return Inspection::Unreadable {
                dir: dir.to_path_buf(),
                error,
            }
        }
    };

    let path = match descriptor.package_path() {
        Ok(Some(path)) => path,
        Ok(None) => {
            return Inspection::Unreadable {
                dir: dir.to_path_buf(),
                error: anyhow!("package.json has no `name`"),
            }
        }
        Err(error) => {
            return Inspection::Unreadable {
                dir: dir.to_path_buf(),
                error,
            }
        }
    };

    let kind = classify(&descriptor, &path, manifest, || has_native_code(dir));
    Inspection::Package {
        path,
        dir: dir.to_path_buf(),
        kind,
    }
}

/// Classify a package from its descriptor and the manifest snapshot.
///
/// Module-type markers come from the descriptor, falling back to the
/// manifest entry. Packages without a marker are native only if
/// `has_native` reports platform build files.
pub fn classify(
    descriptor: &PackageDescriptor,
    path: &PackagePath,
    manifest: Option<&Manifest>,
    has_native: impl FnOnce() -> bool,
) -> Option<NativeDependencyKind> {
    let entry = manifest.and_then(|m| m.get_native_dependency(path.base_path()));
    let marker = descriptor
        .module_type()
        .or_else(|| entry.and_then(|e| e.module_type()));

    match marker {
        Some(ModuleType::Api) => Some(NativeDependencyKind::Api),
        Some(ModuleType::NativeApiImpl) => Some(NativeDependencyKind::ApiImpl),
        _ if has_native() => Some(if entry.is_some() {
            NativeDependencyKind::ThirdPartyInManifest
        } else {
            NativeDependencyKind::ThirdPartyNotInManifest
        }),
        _ => None,
    }
}

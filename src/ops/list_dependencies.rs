//! Implementation of `ern list dependencies`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{load_module, NativeDependencySet, PackagePath};
use crate::manifest::Manifest;
use crate::reconcile::{PackageInstaller, ProbeEnvironment};
use crate::scanner::NativeDependencyScanner;

/// What to list the native dependencies of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    /// The installed tree of the working directory
    WorkingDir(PathBuf),
    /// The installed tree of a module directory
    ModuleDir(PathBuf),
    /// A package, installed into a throwaway project first
    Package(PackagePath),
}

impl ListTarget {
    /// Interpret the optional `MODULE` argument relative to `cwd`.
    ///
    /// An existing directory is a module; anything else must parse as a
    /// package path.
    pub fn resolve(cwd: &Path, module: Option<&str>) -> Result<Self> {
        let Some(module) = module else {
            return Ok(ListTarget::WorkingDir(cwd.to_path_buf()));
        };

        let as_dir = cwd.join(module.strip_prefix("file:").unwrap_or(module));
        if as_dir.is_dir() {
            return Ok(ListTarget::ModuleDir(as_dir));
        }

        let path = PackagePath::parse(module)?;
        if path.is_file_path() {
            anyhow::bail!("module directory {} does not exist", as_dir.display());
        }
        Ok(ListTarget::Package(path))
    }
}

/// Scan `target` and classify its native dependencies.
///
/// `installer` is only needed for [`ListTarget::Package`].
pub fn list_dependencies(
    target: &ListTarget,
    manifest: Option<&Manifest>,
    installer: Option<&dyn PackageInstaller>,
) -> Result<NativeDependencySet> {
    match target {
        ListTarget::WorkingDir(dir) => {
            if !dir.join("node_modules").is_dir() {
                tracing::debug!("no node_modules in {}", dir.display());
                return Ok(NativeDependencySet::new());
            }
            scan(dir, manifest)
        }
        ListTarget::ModuleDir(dir) => {
            let module = load_module(dir)?;
            tracing::debug!(
                "listing native dependencies of {}",
                module.name().unwrap_or("<unnamed module>")
            );
            scan(&module.node_modules(), manifest)
        }
        ListTarget::Package(package) => {
            let Some(installer) = installer else {
                anyhow::bail!("listing `{}` requires a JS package manager", package);
            };
            let probe = ProbeEnvironment::new()?;
            installer
                .install(package, probe.root())
                .with_context(|| format!("failed to install `{}`", package))?;
            let modules_dir = probe.modules_dir();
            if !modules_dir.is_dir() {
                return Ok(NativeDependencySet::new());
            }
            scan(&modules_dir, manifest)
        }
    }
}

fn scan(root: &Path, manifest: Option<&Manifest>) -> Result<NativeDependencySet> {
    let mut scanner = NativeDependencyScanner::new();
    if let Some(manifest) = manifest {
        scanner = scanner.with_manifest(manifest);
    }
    scanner.scan(root)
}

//! Implementation of `ern add` and `ern upgrade` for mini-apps.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::{DependencyKind, MiniApp, Module, PackagePath};
use crate::manifest::Manifest;
use crate::reconcile::{DependencyReconciler, PackageInstaller, VersionBump};
use crate::util::diagnostic::suggestions;

/// Options for adding dependencies to a mini-app.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Candidates, in command line order
    pub packages: Vec<PackagePath>,

    /// Section the candidates go to
    pub kind: DependencyKind,
}

/// Reconcile every candidate and record them in the mini-app's
/// `package.json`.
///
/// Candidates are checked in order. The first rejection aborts the whole
/// operation and `package.json` is left untouched.
pub fn add_to_mini_app(
    dir: &Path,
    manifest: &Manifest,
    installer: &dyn PackageInstaller,
    opts: &AddOptions,
) -> Result<Vec<PackagePath>> {
    let mut app = load_mini_app(dir)?;
    let reconciler = DependencyReconciler::new(manifest, installer);

    let mut added = Vec::with_capacity(opts.packages.len());
    for candidate in &opts.packages {
        let accepted = app.add_dependency(&reconciler, candidate, opts.kind)?;
        added.push(accepted);
    }

    app.save()?;
    tracing::info!(
        "added {} {} to {}",
        added.len(),
        opts.kind.section(),
        app.name().unwrap_or("mini-app")
    );
    Ok(added)
}

/// Move the mini-app's dependencies to `target` and save `package.json`.
pub fn upgrade_mini_app(dir: &Path, manifest: &Manifest, target: &str) -> Result<Vec<VersionBump>> {
    let mut app = load_mini_app(dir)?;
    let bumps = app.upgrade_to_platform_version(manifest, target)?;
    if !bumps.is_empty() {
        app.save()?;
    }
    Ok(bumps)
}

fn load_mini_app(dir: &Path) -> Result<MiniApp> {
    MiniApp::load(dir)
        .with_context(|| format!("not a mini-app directory\n{}", suggestions::NOT_A_MODULE))
}

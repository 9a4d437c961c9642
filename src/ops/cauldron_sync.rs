//! Implementation of `ern cauldron sync` and `ern cauldron get`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cauldron::{AppVersionRecord, Cauldron, StoreError};
use crate::core::{AppDescriptor, DependencySet, PackagePath};
use crate::manifest::Manifest;
use crate::scanner::NativeDependencyScanner;
use crate::util::diagnostic::suggestions;

/// Options for syncing a container's native dependencies.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub descriptor: AppDescriptor,

    /// Root of the composite whose `node_modules` is scanned
    pub composite: PathBuf,

    /// Explicit container version instead of a patch bump
    pub container_version: Option<String>,

    /// Mini-apps to record as part of the container
    pub mini_apps: Vec<PackagePath>,
}

/// Outcome of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub native_dependencies: DependencySet,
    pub container_version: String,
    pub commit_id: String,
    /// Third-party native packages the manifest does not list
    pub not_in_manifest: Vec<PackagePath>,
    /// Native packages the manifest marks as unsupported on the
    /// descriptor's platform
    pub unsupported_on_platform: Vec<PackagePath>,
}

/// Scan the composite and record its native dependencies for the
/// application version, in one transaction.
///
/// Any failure before the commit discards the transaction; the cauldron is
/// left exactly as it was.
pub fn sync_container(
    cauldron: &Cauldron,
    manifest: Option<&Manifest>,
    opts: &SyncOptions,
) -> Result<SyncResult> {
    let mut scanner = NativeDependencyScanner::new();
    if let Some(manifest) = manifest {
        scanner = scanner.with_manifest(manifest);
    }
    let natives = scanner
        .scan(&opts.composite)
        .with_context(|| format!("failed to scan composite {}", opts.composite.display()))?;

    let not_in_manifest: Vec<PackagePath> = natives
        .third_party_not_in_manifest()
        .iter()
        .map(|d| d.package_path().clone())
        .collect();
    if manifest.is_some() {
        for path in &not_in_manifest {
            tracing::warn!("{} is not declared in the manifest", path);
        }
    }

    let platform = opts.descriptor.platform();
    let unsupported_on_platform: Vec<PackagePath> = match manifest {
        Some(manifest) => natives
            .all_paths()
            .into_iter()
            .filter(|path| {
                manifest
                    .get_native_dependency(path.base_path())
                    .is_some_and(|entry| !entry.supports(platform))
            })
            .collect(),
        None => Vec::new(),
    };
    for path in &unsupported_on_platform {
        tracing::debug!("{} is not supported on {} according to the manifest", path, platform);
    }

    let mut txn = cauldron.begin_transaction()?;
    let native_dependencies = txn.sync_native_dependencies(&opts.descriptor, &natives.all_paths())?;
    for mini_app in &opts.mini_apps {
        txn.add_mini_app(&opts.descriptor, mini_app.clone())?;
    }
    let container_version =
        txn.update_container_version(&opts.descriptor, opts.container_version.as_deref())?;

    let message = format!(
        "Sync native dependencies of {} (container {})",
        opts.descriptor, container_version
    );
    let commit_id = txn.commit(&message)?;

    Ok(SyncResult {
        native_dependencies,
        container_version,
        commit_id,
        not_in_manifest,
        unsupported_on_platform,
    })
}

/// Committed record of an application version.
pub fn get_app(cauldron: &Cauldron, descriptor: &AppDescriptor) -> Result<AppVersionRecord> {
    match cauldron.get_app(descriptor) {
        Ok(record) => Ok(record),
        Err(e @ StoreError::UnknownApplication { .. }) => {
            bail!("{}\n{}", e, suggestions::UNKNOWN_APP)
        }
        Err(e) => Err(e.into()),
    }
}

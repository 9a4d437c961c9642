//! Platform version upgrades.

use std::fmt;

use anyhow::Result;

use crate::core::{DependencySet, PackagePath};
use crate::manifest::Manifest;

/// One dependency moved to a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub from: PackagePath,
    pub to: PackagePath,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.from.base_path(),
            self.from.version().unwrap_or("*"),
            self.to.version().unwrap_or("*")
        )
    }
}

/// Move every entry of `deps` known to the manifest at `target` to the
/// manifest's version.
///
/// Entries absent from the manifest are left alone and no entry is added.
pub fn upgrade_to_platform_version(
    deps: &mut DependencySet,
    manifest: &Manifest,
    target: &str,
) -> Result<Vec<VersionBump>> {
    let reference = manifest.get_js_and_native_dependencies(target)?;
    let mut bumps = Vec::new();

    for wanted in &reference {
        let Some(current) = deps.get(wanted.base_path()) else {
            continue;
        };
        if current.version() == wanted.version() {
            continue;
        }
        let bump = VersionBump {
            from: current.clone(),
            to: wanted.clone(),
        };
        tracing::info!("upgrading {}", bump);
        deps.upsert(wanted.clone());
        bumps.push(bump);
    }

    Ok(bumps)
}

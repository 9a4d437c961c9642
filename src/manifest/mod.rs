//! Manifest resolution.
//!
//! The manifest is the externally maintained source of truth for the
//! versions and classification of native and JS dependencies, per
//! platform version. It is loaded once and never mutated.

pub mod document;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::core::{ModuleType, PackagePath, Platform};
pub use document::{EntryDocument, ManifestDocument, PlatformSupport, TargetDocument};

/// Reference record for one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    path: PackagePath,
    platforms: PlatformSupport,
    module_type: Option<ModuleType>,
}

impl ManifestEntry {
    /// Canonical versioned package path.
    pub fn package_path(&self) -> &PackagePath {
        &self.path
    }

    pub fn base_path(&self) -> &str {
        self.path.base_path()
    }

    pub fn version(&self) -> Option<&str> {
        self.path.version()
    }

    pub fn module_type(&self) -> Option<ModuleType> {
        self.module_type
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms.supports(platform)
    }
}

#[derive(Debug, Clone, Default)]
struct ManifestTarget {
    native: BTreeMap<String, ManifestEntry>,
    js: BTreeMap<String, ManifestEntry>,
}

/// A loaded manifest with a selected platform version.
#[derive(Debug, Clone)]
pub struct Manifest {
    platform_version: String,
    targets: BTreeMap<String, ManifestTarget>,
}

impl Manifest {
    /// Load a JSON manifest document and select `platform_version`.
    pub fn load(path: &Path, platform_version: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let document: ManifestDocument = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

        Self::from_document(document, platform_version)
    }

    /// Build a manifest from a parsed document.
    ///
    /// Fails if `platform_version` is not defined or an entry key is not a
    /// bare base path.
    pub fn from_document(document: ManifestDocument, platform_version: &str) -> Result<Self> {
        let mut targets = BTreeMap::new();
        for (version, target) in document.targets {
            let resolved = ManifestTarget {
                native: resolve_entries(&version, target.native_dependencies)?,
                js: resolve_entries(&version, target.js_dependencies)?,
            };
            targets.insert(version, resolved);
        }

        if !targets.contains_key(platform_version) {
            bail!(
                "platform version {} is not defined in the manifest\n\
                 help: available versions: {}",
                platform_version,
                targets.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        Ok(Manifest {
            platform_version: platform_version.to_string(),
            targets,
        })
    }

    /// A manifest that knows no dependencies.
    pub fn empty(platform_version: &str) -> Self {
        let mut targets = BTreeMap::new();
        targets.insert(platform_version.to_string(), ManifestTarget::default());
        Manifest {
            platform_version: platform_version.to_string(),
            targets,
        }
    }

    /// The currently selected platform version.
    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    /// All platform versions the manifest defines.
    pub fn platform_versions(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    fn current(&self) -> Option<&ManifestTarget> {
        self.targets.get(&self.platform_version)
    }

    /// Native dependency record for `base_path` at the selected platform version.
    pub fn get_native_dependency(&self, base_path: &str) -> Option<&ManifestEntry> {
        self.current()?.native.get(base_path)
    }

    /// JS dependency record for `base_path` at the selected platform version.
    pub fn get_js_dependency(&self, base_path: &str) -> Option<&ManifestEntry> {
        self.current()?.js.get(base_path)
    }

    /// Every reference dependency at `target`, JS first then native,
    /// each group sorted by base path.
    pub fn get_js_and_native_dependencies(&self, target: &str) -> Result<Vec<PackagePath>> {
        let target_deps = self
            .targets
            .get(target)
            .ok_or_else(|| anyhow!("platform version {} is not defined in the manifest", target))?;

        Ok(target_deps
            .js
            .values()
            .chain(target_deps.native.values())
            .map(|entry| entry.path.clone())
            .collect())
    }
}

fn resolve_entries(
    target: &str,
    entries: BTreeMap<String, EntryDocument>,
) -> Result<BTreeMap<String, ManifestEntry>> {
    let mut resolved = BTreeMap::new();
    for (key, entry) in entries {
        let base = PackagePath::parse(&key)
            .with_context(|| format!("invalid manifest entry for platform version {}", target))?;
        if base.version().is_some() {
            bail!(
                "manifest entry `{}` for platform version {} must not embed a version",
                key,
                target
            );
        }

        if entry.version().trim().is_empty() {
            bail!(
                "manifest entry `{}` for platform version {} has an empty version",
                key,
                target
            );
        }
        let path = base.with_version(entry.version()).with_context(|| {
            format!("invalid manifest entry `{}` for platform version {}", key, target)
        })?;
        resolved.insert(
            base.base_path().to_string(),
            ManifestEntry {
                path,
                platforms: entry.platforms(),
                module_type: entry.module_type(),
            },
        );
    }
    Ok(resolved)
}

//! Adding a dependency: manifest conformance and native probing.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{DependencyKind, DependencySet, NativeDependencySet, PackagePath};
use crate::manifest::{Manifest, ManifestEntry};
use crate::reconcile::cache::PackagePathCache;
use crate::reconcile::probe::{PackageInstaller, ProbeEnvironment};
use crate::reconcile::ReconcileError;
use crate::scanner::NativeDependencyScanner;

/// Checks dependency candidates against a manifest.
///
/// Probe installs are kept for the life of the reconciler, so a candidate
/// probed twice in one workflow is only installed once.
pub struct DependencyReconciler<'a> {
    manifest: &'a Manifest,
    installer: &'a dyn PackageInstaller,
    probes: RefCell<Probes>,
}

/// Live probe environments and where each probed candidate landed.
#[derive(Default)]
struct Probes {
    environments: Vec<ProbeEnvironment>,
    installed: PackagePathCache,
}

impl Probes {
    /// Probe project and install name of a candidate probed earlier, as
    /// long as its install is still on disk.
    fn lookup(&self, candidate: &PackagePath) -> Option<(usize, String)> {
        let dir = self.installed.get(candidate).filter(|dir| dir.is_dir())?;
        self.environments.iter().enumerate().find_map(|(i, env)| {
            let name = dir.strip_prefix(env.modules_dir()).ok()?;
            Some((i, name.to_str()?.replace('\\', "/")))
        })
    }
}

impl<'a> DependencyReconciler<'a> {
    pub fn new(manifest: &'a Manifest, installer: &'a dyn PackageInstaller) -> Self {
        DependencyReconciler {
            manifest,
            installer,
            probes: RefCell::new(Probes::default()),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        self.manifest
    }

    /// Directory `candidate` was installed in by an earlier probe.
    pub fn probed_location(&self, candidate: &PackagePath) -> Option<PathBuf> {
        self.probes
            .borrow()
            .installed
            .get(candidate)
            .map(Path::to_path_buf)
    }

    /// Accept `candidate` and stage it in `staged`.
    ///
    /// Dev and peer dependencies are staged as given. Other candidates go
    /// through [`DependencyReconciler::resolve`]. Returns the staged path,
    /// which carries the manifest version when the candidate had none.
    pub fn add_dependency(
        &self,
        candidate: &PackagePath,
        kind: DependencyKind,
        staged: &mut DependencySet,
    ) -> Result<PackagePath> {
        let accepted = if kind.ships_in_container() {
            self.resolve(candidate)?
        } else {
            tracing::debug!("{} is a {} entry; skipping manifest checks", candidate, kind.section());
            candidate.clone()
        };

        if let Some(previous) = staged.upsert(accepted.clone()) {
            tracing::debug!("replacing {} with {}", previous, accepted);
        }
        Ok(accepted)
    }

    /// Resolve a candidate that ships in the container.
    pub fn resolve(&self, candidate: &PackagePath) -> Result<PackagePath> {
        let base = candidate.base_path();
        let entry = self
            .manifest
            .get_native_dependency(base)
            .or_else(|| self.manifest.get_js_dependency(base));

        match entry {
            Some(entry) => self.conform_to_manifest(candidate, entry),
            None => self.probe(candidate),
        }
    }

    fn conform_to_manifest(&self, candidate: &PackagePath, entry: &ManifestEntry) -> Result<PackagePath> {
        match candidate.version() {
            None => {
                tracing::info!("using manifest version {}", entry.package_path());
                Ok(entry.package_path().clone())
            }
            Some(requested) if Some(requested) == entry.version() => Ok(candidate.clone()),
            Some(requested) => Err(ReconcileError::VersionMismatch {
                package: candidate.base_path().to_string(),
                requested: requested.to_string(),
                expected: entry.version().unwrap_or_default().to_string(),
            }
            .into()),
        }
    }

    /// Install `candidate` in a throwaway project, or reuse the project of
    /// an earlier probe. Returns the project index and install name.
    fn install_probe(&self, candidate: &PackagePath) -> Result<(usize, String)> {
        let mut probes = self.probes.borrow_mut();
        if let Some(found) = probes.lookup(candidate) {
            tracing::debug!("reusing the probe install of {}", candidate);
            return Ok(found);
        }
        if probes.installed.invalidate(candidate).is_some() {
            tracing::debug!("probe install of {} is gone; installing again", candidate);
        }

        let probe = ProbeEnvironment::new()?;
        let installed_name = self
            .installer
            .install(candidate, probe.root())
            .with_context(|| format!("failed to probe `{}`", candidate))?;

        probes
            .installed
            .insert(candidate, probe.modules_dir().join(&installed_name));
        probes.environments.push(probe);
        Ok((probes.environments.len() - 1, installed_name))
    }

    /// Install the candidate in a throwaway project and inspect its native code.
    fn probe(&self, candidate: &PackagePath) -> Result<PackagePath> {
        tracing::info!("{} is not in the manifest; checking for native code", candidate);

        let (index, installed_name) = self.install_probe(candidate)?;
        let modules_dir = self.probes.borrow().environments[index].modules_dir();
        let natives = if modules_dir.is_dir() {
            NativeDependencyScanner::new()
                .with_manifest(self.manifest)
                .scan(&modules_dir)?
        } else {
            NativeDependencySet::new()
        };

        if natives.is_empty() {
            tracing::info!("{} is pure JS", candidate);
            return Ok(candidate.clone());
        }

        for dep in natives.all() {
            let dep_path = dep.package_path();
            let is_candidate = dep_path.base_path() == installed_name
                || dep_path.base_path() == candidate.base_path();

            if is_candidate {
                if dep.kind().is_api_or_impl() {
                    tracing::warn!(
                        "{} is a native {} missing from the manifest; consider adding it",
                        dep_path,
                        dep.kind()
                    );
                    continue;
                }
                return Err(ReconcileError::UnsupportedNativeDependency {
                    package: candidate.to_string(),
                    platform_version: self.manifest.platform_version().to_string(),
                }
                .into());
            }

            match self.manifest.get_native_dependency(dep_path.base_path()) {
                Some(entry) if entry.version() != dep_path.version() => {
                    return Err(ReconcileError::TransitiveDependencyConflict {
                        source_name: format!("`{}`", candidate),
                        dependency: dep_path.base_path().to_string(),
                        found: dep_path.version().unwrap_or("*").to_string(),
                        expected: entry.version().unwrap_or("*").to_string(),
                    }
                    .into());
                }
                Some(_) => {}
                // Unmanifested transitive native code is let through.
                None => tracing::debug!(
                    "{} pulls in {} which is not in the manifest",
                    candidate,
                    dep_path
                ),
            }
        }

        Ok(candidate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeInstaller, FakePackage, ManifestBuilder};

    fn pp(s: &str) -> PackagePath {
        PackagePath::parse(s).unwrap()
    }

    fn reconcile_error(err: &anyhow::Error) -> &ReconcileError {
        err.downcast_ref::<ReconcileError>()
            .expect("expected a ReconcileError")
    }

    #[test]
    fn test_manifest_version_substituted() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native", "0.59.0")
            .build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);
        let mut staged = DependencySet::new();

        let added = reconciler
            .add_dependency(&pp("react-native"), DependencyKind::Regular, &mut staged)
            .unwrap();

        assert_eq!(added.to_string(), "react-native@0.59.0");
        assert_eq!(staged.as_slice(), &[pp("react-native@0.59.0")]);
        assert!(installer.installed().is_empty());
    }

    #[test]
    fn test_matching_explicit_version_unchanged() {
        let manifest = ManifestBuilder::new("0.59.0").js("react", "16.8.3").build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let candidate = pp("react@16.8.3");
        let added = reconciler.resolve(&candidate).unwrap();
        assert_eq!(added, candidate);
    }

    #[test]
    fn test_version_mismatch() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native", "0.59.0")
            .build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);
        let mut staged = DependencySet::new();

        let err = reconciler
            .add_dependency(&pp("react-native@^0.59.0"), DependencyKind::Regular, &mut staged)
            .unwrap_err();

        assert_eq!(
            reconcile_error(&err),
            &ReconcileError::VersionMismatch {
                package: "react-native".to_string(),
                requested: "^0.59.0".to_string(),
                expected: "0.59.0".to_string(),
            }
        );
        assert!(staged.is_empty());
    }

    #[test]
    fn test_pure_js_accepted_as_is() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let added = reconciler.resolve(&pp("left-pad")).unwrap();
        assert_eq!(added, pp("left-pad"));
        assert_eq!(installer.installed(), vec![pp("left-pad")]);
    }

    #[test]
    fn test_unsupported_native_dependency() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new()
            .with_tree("some-native-lib", vec![FakePackage::native("some-native-lib", "1.0.0")]);
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let err = reconciler.resolve(&pp("some-native-lib")).unwrap_err();
        assert!(matches!(
            reconcile_error(&err),
            ReconcileError::UnsupportedNativeDependency { package, .. } if package == "some-native-lib"
        ));
    }

    #[test]
    fn test_unmanifested_api_allowed() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new().with_tree(
            "movie-api",
            vec![FakePackage::module("movie-api", "1.0.0", "api")],
        );
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        assert_eq!(reconciler.resolve(&pp("movie-api")).unwrap(), pp("movie-api"));
    }

    #[test]
    fn test_transitive_conflict() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native-maps", "0.24.0")
            .build();
        let installer = FakeInstaller::new().with_tree(
            "fancy-map-view",
            vec![
                FakePackage::js("fancy-map-view", "2.0.0"),
                FakePackage::native("react-native-maps", "0.23.0"),
            ],
        );
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let err = reconciler.resolve(&pp("fancy-map-view")).unwrap_err();
        assert!(matches!(
            reconcile_error(&err),
            ReconcileError::TransitiveDependencyConflict { dependency, found, expected, .. }
                if dependency == "react-native-maps" && found == "0.23.0" && expected == "0.24.0"
        ));
    }

    #[test]
    fn test_transitive_match_and_unmanifested_transitive_accepted() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native-maps", "0.24.0")
            .build();
        let installer = FakeInstaller::new().with_tree(
            "fancy-map-view",
            vec![
                FakePackage::js("fancy-map-view", "2.0.0"),
                FakePackage::native("react-native-maps", "0.24.0"),
                FakePackage::native("unlisted-native", "1.0.0"),
            ],
        );
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let added = reconciler.resolve(&pp("fancy-map-view@2.0.0")).unwrap();
        assert_eq!(added, pp("fancy-map-view@2.0.0"));
    }

    #[test]
    fn test_git_candidate_matched_by_installed_name() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new().with_tree(
            "git+https://github.com/org/native-thing.git",
            vec![FakePackage::native("native-thing", "0.1.0")],
        );
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let err = reconciler
            .resolve(&pp("git+https://github.com/org/native-thing.git#main"))
            .unwrap_err();
        assert!(err.downcast_ref::<ReconcileError>().is_some());
    }

    #[test]
    fn test_peer_dependency_bypasses_checks() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native", "0.59.0")
            .build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);
        let mut staged = DependencySet::new();

        let added = reconciler
            .add_dependency(&pp("react-native@0.60.0"), DependencyKind::Peer, &mut staged)
            .unwrap();
        assert_eq!(added, pp("react-native@0.60.0"));
        assert!(installer.installed().is_empty());
    }

    #[test]
    fn test_add_replaces_staged_entry() {
        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native", "0.59.0")
            .build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);
        let mut staged: DependencySet = [pp("react-native@0.58.0"), pp("lodash@4.0.0")]
            .into_iter()
            .collect();

        reconciler
            .add_dependency(&pp("react-native"), DependencyKind::Regular, &mut staged)
            .unwrap();
        assert_eq!(
            staged.as_slice(),
            &[pp("react-native@0.59.0"), pp("lodash@4.0.0")]
        );
    }

    #[test]
    fn test_install_failure_stages_nothing() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new().failing_on("does-not-exist");
        let reconciler = DependencyReconciler::new(&manifest, &installer);
        let mut staged = DependencySet::new();

        let err = reconciler
            .add_dependency(&pp("does-not-exist@1.0.0"), DependencyKind::Regular, &mut staged)
            .unwrap_err();

        assert!(err.to_string().contains("failed to probe `does-not-exist@1.0.0`"));
        assert!(format!("{:#}", err).contains("404"));
        assert!(err.downcast_ref::<ReconcileError>().is_none());
        assert!(staged.is_empty());
    }

    #[test]
    fn test_repeated_candidate_installed_once() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new()
            .with_tree("some-native-lib", vec![FakePackage::native("some-native-lib", "1.0.0")]);
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        assert!(reconciler.resolve(&pp("left-pad@1.3.0")).is_ok());
        assert!(reconciler.resolve(&pp("some-native-lib")).is_err());
        assert!(reconciler.resolve(&pp("left-pad@1.3.0")).is_ok());
        assert!(reconciler.resolve(&pp("some-native-lib")).is_err());

        assert_eq!(
            installer.installed(),
            vec![pp("left-pad@1.3.0"), pp("some-native-lib")]
        );
        let location = reconciler.probed_location(&pp("left-pad@1.3.0")).unwrap();
        assert!(location.ends_with("node_modules/left-pad"));
        assert!(reconciler.probed_location(&pp("left-pad@1.4.0")).is_none());
    }

    #[test]
    fn test_scratch_installs_removed_with_reconciler() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        reconciler.resolve(&pp("left-pad")).unwrap();
        let location = reconciler.probed_location(&pp("left-pad")).unwrap();
        assert!(location.is_dir());

        drop(reconciler);
        assert!(!location.exists());
    }

    #[test]
    fn test_vanished_install_is_redone() {
        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        reconciler.resolve(&pp("left-pad")).unwrap();
        let location = reconciler.probed_location(&pp("left-pad")).unwrap();
        std::fs::remove_dir_all(&location).unwrap();

        reconciler.resolve(&pp("left-pad")).unwrap();
        assert_eq!(installer.installed(), vec![pp("left-pad"), pp("left-pad")]);
        assert!(reconciler.probed_location(&pp("left-pad")).unwrap().is_dir());
    }
}

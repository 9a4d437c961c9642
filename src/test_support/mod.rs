//! Test utilities and fakes for ern unit tests.
//!
//! Provides fixture builders for installed module trees and manifests, a
//! package installer that lays out canned trees instead of running a JS
//! package manager, and an in-memory cauldron backend with failure
//! injection.
//!
//! # Example
//!
//! ```rust,ignore
//! use ern::test_support::{add_native_package, FakeInstaller, ManifestBuilder};
//!
//! #[test]
//! fn test_example() {
//!     let manifest = ManifestBuilder::new("0.59.0")
//!         .native("react-native", "0.59.0")
//!         .build();
//!     let installer = FakeInstaller::new();
//!     // Use fakes in tests...
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use serde_json::json;

use crate::cauldron::StoreBackend;
use crate::core::{PackagePath, PACKAGE_JSON};
use crate::manifest::{EntryDocument, Manifest, ManifestDocument, TargetDocument};
use crate::reconcile::PackageInstaller;

/// Write `content` as the `package.json` of `dir`, creating it.
pub fn write_package_json(dir: &Path, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(PACKAGE_JSON), content).unwrap();
}

fn write_descriptor(modules: &Path, name: &str, version: &str, module_type: Option<&str>) -> PathBuf {
    let dir = modules.join(name);
    let mut descriptor = json!({ "name": name, "version": version });
    if let Some(module_type) = module_type {
        descriptor["ern"] = json!({ "moduleType": module_type });
    }
    write_package_json(&dir, &descriptor.to_string());
    dir
}

/// Add a pure JS package to a `node_modules` directory.
pub fn add_js_package(modules: &Path, name: &str, version: &str) -> PathBuf {
    let dir = write_descriptor(modules, name, version, None);
    std::fs::write(dir.join("index.js"), "module.exports = {};\n").unwrap();
    dir
}

/// Add a package with Android and iOS build files.
pub fn add_native_package(modules: &Path, name: &str, version: &str) -> PathBuf {
    let dir = write_descriptor(modules, name, version, None);
    std::fs::create_dir_all(dir.join("android")).unwrap();
    std::fs::write(dir.join("android/build.gradle"), "apply plugin: 'com.android.library'\n").unwrap();
    std::fs::create_dir_all(dir.join("ios")).unwrap();
    std::fs::write(dir.join(format!("ios/{}.podspec", last_segment(name))), "").unwrap();
    dir
}

/// Add a package marked with an `ern.moduleType`, without native files.
pub fn add_api_package(modules: &Path, name: &str, version: &str, module_type: &str) -> PathBuf {
    write_descriptor(modules, name, version, Some(module_type))
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Builds manifests from a fluent description.
///
/// The first platform version is the selected one; [`ManifestBuilder::target`]
/// switches where subsequent entries go.
pub struct ManifestBuilder {
    selected: String,
    current: String,
    document: ManifestDocument,
}

impl ManifestBuilder {
    pub fn new(platform_version: &str) -> Self {
        let mut document = ManifestDocument::default();
        document
            .targets
            .insert(platform_version.to_string(), TargetDocument::default());
        ManifestBuilder {
            selected: platform_version.to_string(),
            current: platform_version.to_string(),
            document,
        }
    }

    /// Add entries to `platform_version` from now on.
    pub fn target(mut self, platform_version: &str) -> Self {
        self.document
            .targets
            .entry(platform_version.to_string())
            .or_default();
        self.current = platform_version.to_string();
        self
    }

    fn current(&mut self) -> &mut TargetDocument {
        self.document.targets.entry(self.current.clone()).or_default()
    }

    pub fn native(mut self, name: &str, version: &str) -> Self {
        self.current()
            .native_dependencies
            .insert(name.to_string(), EntryDocument::Version(version.to_string()));
        self
    }

    /// Add a native entry classified as an api by the manifest.
    pub fn native_api(mut self, name: &str, version: &str) -> Self {
        let entry: EntryDocument =
            serde_json::from_value(json!({ "version": version, "moduleType": "api" })).unwrap();
        self.current()
            .native_dependencies
            .insert(name.to_string(), entry);
        self
    }

    /// Add a native entry the manifest marks as unsupported on iOS.
    pub fn native_android_only(mut self, name: &str, version: &str) -> Self {
        let entry: EntryDocument =
            serde_json::from_value(json!({ "version": version, "platforms": { "ios": false } })).unwrap();
        self.current()
            .native_dependencies
            .insert(name.to_string(), entry);
        self
    }

    pub fn js(mut self, name: &str, version: &str) -> Self {
        self.current()
            .js_dependencies
            .insert(name.to_string(), EntryDocument::Version(version.to_string()));
        self
    }

    pub fn build(self) -> Manifest {
        Manifest::from_document(self.document, &self.selected).unwrap()
    }
}

/// One package a [`FakeInstaller`] lays out.
#[derive(Debug, Clone)]
pub struct FakePackage {
    name: String,
    version: String,
    kind: FakePackageKind,
}

#[derive(Debug, Clone)]
enum FakePackageKind {
    Js,
    Native,
    Module(String),
}

impl FakePackage {
    pub fn js(name: &str, version: &str) -> Self {
        Self::new(name, version, FakePackageKind::Js)
    }

    pub fn native(name: &str, version: &str) -> Self {
        Self::new(name, version, FakePackageKind::Native)
    }

    /// A package carrying an `ern.moduleType` marker.
    pub fn module(name: &str, version: &str, module_type: &str) -> Self {
        Self::new(name, version, FakePackageKind::Module(module_type.to_string()))
    }

    fn new(name: &str, version: &str, kind: FakePackageKind) -> Self {
        FakePackage {
            name: name.to_string(),
            version: version.to_string(),
            kind,
        }
    }

    fn write(&self, modules: &Path) {
        match &self.kind {
            FakePackageKind::Js => add_js_package(modules, &self.name, &self.version),
            FakePackageKind::Native => add_native_package(modules, &self.name, &self.version),
            FakePackageKind::Module(t) => add_api_package(modules, &self.name, &self.version, t),
        };
    }
}

/// Package installer that writes canned trees into `node_modules`.
///
/// Unknown packages install as a single pure JS package. Every install is
/// recorded.
#[derive(Default)]
pub struct FakeInstaller {
    trees: HashMap<String, Vec<FakePackage>>,
    installed: Mutex<Vec<PackagePath>>,
    failing: Option<String>,
}

impl FakeInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `packages` when a package with base path `base` is requested.
    /// The first package is the one reported as installed.
    pub fn with_tree(mut self, base: &str, packages: Vec<FakePackage>) -> Self {
        self.trees.insert(base.to_string(), packages);
        self
    }

    /// Fail when a package with base path `base` is requested.
    pub fn failing_on(mut self, base: &str) -> Self {
        self.failing = Some(base.to_string());
        self
    }

    /// Packages installed so far, in order.
    pub fn installed(&self) -> Vec<PackagePath> {
        self.installed.lock().unwrap().clone()
    }
}

impl PackageInstaller for FakeInstaller {
    fn install(&self, package: &PackagePath, dir: &Path) -> Result<String> {
        self.installed.lock().unwrap().push(package.clone());
        if self.failing.as_deref() == Some(package.base_path()) {
            bail!("npm ERR! 404 Not Found: {}", package);
        }

        let modules = dir.join("node_modules");
        let packages = match self.trees.get(package.base_path()) {
            Some(tree) => tree.clone(),
            None => {
                let name = last_segment(package.base_path())
                    .trim_end_matches(".git")
                    .to_string();
                let name = if package.is_registry_path() {
                    package.base_path().to_string()
                } else {
                    name
                };
                vec![FakePackage::js(&name, package.version().unwrap_or("1.0.0"))]
            }
        };

        for p in &packages {
            p.write(&modules);
        }
        Ok(packages
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| package.base_path().to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    content: Option<String>,
    saves: Vec<String>,
    failures: usize,
}

/// In-memory cauldron storage. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_content(content: &str) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().content = Some(content.to_string());
        backend
    }

    /// Make the next `count` saves fail.
    pub fn fail_saves(&self, count: usize) {
        self.state.lock().unwrap().failures = count;
    }

    /// The stored document, if any.
    pub fn content(&self) -> Option<String> {
        self.state.lock().unwrap().content.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves.len()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().content.clone())
    }

    fn save(&self, content: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failures > 0 {
            state.failures -= 1;
            bail!("disk full");
        }
        state.content = Some(content.to_string());
        state.saves.push(content.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

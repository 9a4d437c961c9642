//! JS modules that own a `package.json`.
//!
//! Mini-apps and API implementations share the [`Module`] capability: a
//! directory, its parsed `package.json`, and the dependencies declared in
//! it. Only mini-apps are edited by `add` and `upgrade`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::core::{
    DependencyKind, DependencySet, ModuleType, PackageDescriptor, PackagePath, PACKAGE_JSON,
};
use crate::manifest::Manifest;
use crate::reconcile::upgrade::{upgrade_to_platform_version, VersionBump};
use crate::reconcile::DependencyReconciler;
use crate::util::fs;

/// Capability shared by every module kind.
pub trait Module {
    /// Root directory of the module.
    fn path(&self) -> &Path;

    /// Parsed `package.json`.
    fn package_json(&self) -> &Value;

    fn name(&self) -> Option<&str> {
        self.package_json().get("name").and_then(Value::as_str)
    }

    fn version(&self) -> Option<&str> {
        self.package_json().get("version").and_then(Value::as_str)
    }

    /// Installed dependency tree of the module.
    fn node_modules(&self) -> PathBuf {
        self.path().join("node_modules")
    }

    /// Dependencies declared in `package.json`, grouped by section.
    fn dependencies(&self) -> Result<ModuleDependencies> {
        ModuleDependencies::from_package_json(self.package_json())
    }
}

/// Declared dependencies of a module, one set per `package.json` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDependencies {
    pub dependencies: DependencySet,
    pub dev_dependencies: DependencySet,
    pub peer_dependencies: DependencySet,
}

impl ModuleDependencies {
    pub fn from_package_json(package_json: &Value) -> Result<Self> {
        let mut deps = ModuleDependencies::default();
        for kind in [DependencyKind::Regular, DependencyKind::Dev, DependencyKind::Peer] {
            let Some(section) = package_json.get(kind.section()).and_then(Value::as_object) else {
                continue;
            };
            let set = deps.get_mut(kind);
            for (name, spec) in section {
                let spec = spec.as_str().unwrap_or_default();
                let path = spec_to_path(name, spec).with_context(|| {
                    format!("invalid entry `{}` in `{}`", name, kind.section())
                })?;
                set.upsert(path);
            }
        }
        Ok(deps)
    }

    pub fn get(&self, kind: DependencyKind) -> &DependencySet {
        match kind {
            DependencyKind::Regular => &self.dependencies,
            DependencyKind::Dev => &self.dev_dependencies,
            DependencyKind::Peer => &self.peer_dependencies,
        }
    }

    pub fn get_mut(&mut self, kind: DependencyKind) -> &mut DependencySet {
        match kind {
            DependencyKind::Regular => &mut self.dependencies,
            DependencyKind::Dev => &mut self.dev_dependencies,
            DependencyKind::Peer => &mut self.peer_dependencies,
        }
    }
}

/// Convert a `package.json` dependency entry into a package path.
fn spec_to_path(name: &str, spec: &str) -> Result<PackagePath> {
    let looks_like_locator = spec.starts_with("file:")
        || spec.starts_with("git+")
        || spec.starts_with("git://")
        || spec.starts_with("git@")
        || spec.starts_with('/')
        || spec.starts_with("./")
        || spec.starts_with("../")
        || (spec.contains("://") && spec.contains(".git"));

    if looks_like_locator {
        Ok(PackagePath::parse(spec)?)
    } else if spec.is_empty() {
        Ok(PackagePath::from_name(name, None)?)
    } else {
        Ok(PackagePath::from_name(name, Some(spec))?)
    }
}

/// `package.json` key under which a package is recorded.
fn dependency_key(path: &PackagePath) -> String {
    if path.is_registry_path() {
        return path.base_path().to_string();
    }

    let base = path.base_path().trim_end_matches(['/', '\\']);
    let last = base
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(base);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// `package.json` value recorded for a package.
fn dependency_spec(path: &PackagePath) -> String {
    if path.is_registry_path() {
        return path.version().unwrap_or("latest").to_string();
    }
    if path.is_file_path() && !path.base_path().starts_with("file:") {
        return format!("file:{}", path.base_path());
    }
    path.to_string()
}

fn load_package_json(dir: &Path) -> Result<Value> {
    let path = dir.join(PACKAGE_JSON);
    let content = fs::read_to_string(&path)?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if !value.is_object() {
        bail!("{} is not a JSON object", path.display());
    }
    Ok(value)
}

/// A mini-app: a JS module composed into a native container.
#[derive(Debug, Clone)]
pub struct MiniApp {
    root: PathBuf,
    package_json: Value,
}

impl MiniApp {
    /// Load the mini-app rooted at `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(MiniApp {
            root: dir.to_path_buf(),
            package_json: load_package_json(dir)?,
        })
    }

    /// Reconcile `candidate` against the manifest and record it in `package.json`.
    ///
    /// Nothing is written to disk until [`MiniApp::save`] is called.
    pub fn add_dependency(
        &mut self,
        reconciler: &DependencyReconciler<'_>,
        candidate: &PackagePath,
        kind: DependencyKind,
    ) -> Result<PackagePath> {
        let mut deps = self.dependencies()?;
        let accepted = reconciler.add_dependency(candidate, kind, deps.get_mut(kind))?;
        self.set_entry(kind, &accepted);
        Ok(accepted)
    }

    /// Bump every declared dependency known to the manifest at `target`.
    pub fn upgrade_to_platform_version(
        &mut self,
        manifest: &Manifest,
        target: &str,
    ) -> Result<Vec<VersionBump>> {
        let mut deps = self.dependencies()?;
        let mut bumps = Vec::new();

        for kind in [DependencyKind::Regular, DependencyKind::Dev, DependencyKind::Peer] {
            let section_bumps = upgrade_to_platform_version(deps.get_mut(kind), manifest, target)?;
            for bump in &section_bumps {
                self.set_entry(kind, &bump.to);
            }
            bumps.extend(section_bumps);
        }

        Ok(bumps)
    }

    /// Write `package.json` back, preserving key order and unrelated fields.
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.package_json)?;
        content.push('\n');
        fs::write_string(&self.root.join(PACKAGE_JSON), &content)
    }

    /// Record `path` in the section for `kind`, replacing the entry with the same base path.
    fn set_entry(&mut self, kind: DependencyKind, path: &PackagePath) {
        let Some(root) = self.package_json.as_object_mut() else {
            return;
        };
        let section = root
            .entry(kind.section())
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        let Some(section) = section.as_object_mut() else {
            return;
        };

        let existing_key = section
            .iter()
            .find(|(name, spec)| {
                spec_to_path(name, spec.as_str().unwrap_or_default())
                    .map(|p| p.base_path() == path.base_path())
                    .unwrap_or(false)
            })
            .map(|(name, _)| name.clone());

        let key = existing_key.unwrap_or_else(|| dependency_key(path));
        section.insert(key, Value::String(dependency_spec(path)));
    }
}

impl Module for MiniApp {
    fn path(&self) -> &Path {
        &self.root
    }

    fn package_json(&self) -> &Value {
        &self.package_json
    }
}

/// A native or JS implementation of an API.
#[derive(Debug, Clone)]
pub struct ApiImplModule {
    root: PathBuf,
    package_json: Value,
}

impl ApiImplModule {
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(ApiImplModule {
            root: dir.to_path_buf(),
            package_json: load_package_json(dir)?,
        })
    }
}

impl Module for ApiImplModule {
    fn path(&self) -> &Path {
        &self.root
    }

    fn package_json(&self) -> &Value {
        &self.package_json
    }
}

/// Load the module rooted at `dir`, choosing its kind from `package.json`.
pub fn load_module(dir: &Path) -> Result<Box<dyn Module>> {
    let descriptor = PackageDescriptor::load(dir)?;
    match descriptor.module_type() {
        Some(ModuleType::NativeApiImpl | ModuleType::JsApiImpl) => {
            Ok(Box::new(ApiImplModule::load(dir)?))
        }
        _ => Ok(Box::new(MiniApp::load(dir)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_package_json, FakeInstaller, ManifestBuilder};
    use tempfile::TempDir;

    fn pp(s: &str) -> PackagePath {
        PackagePath::parse(s).unwrap()
    }

    fn create_miniapp(dir: &Path) {
        write_package_json(
            dir,
            r#"{
  "name": "movie-list-miniapp",
  "version": "0.0.1",
  "scripts": { "start": "node node_modules/react-native/local-cli/cli.js start" },
  "dependencies": {
    "react": "16.8.3",
    "react-native": "0.58.0",
    "lodash": "^4.17.0",
    "local-lib": "file:../local-lib"
  },
  "devDependencies": {
    "jest": "24.0.0"
  }
}"#,
        );
    }

    #[test]
    fn test_dependencies_by_section() {
        let tmp = TempDir::new().unwrap();
        create_miniapp(tmp.path());

        let app = MiniApp::load(tmp.path()).unwrap();
        let deps = app.dependencies().unwrap();

        assert_eq!(app.name(), Some("movie-list-miniapp"));
        assert_eq!(deps.dependencies.len(), 4);
        assert_eq!(deps.dependencies.get("react-native"), Some(&pp("react-native@0.58.0")));
        assert!(deps.dependencies.get("../local-lib").is_none());
        assert!(deps.dependencies.get("file:../local-lib").unwrap().is_file_path());
        assert_eq!(deps.dev_dependencies.as_slice(), &[pp("jest@24.0.0")]);
        assert!(deps.peer_dependencies.is_empty());
    }

    #[test]
    fn test_add_dependency_writes_manifest_version() {
        let tmp = TempDir::new().unwrap();
        create_miniapp(tmp.path());

        let manifest = ManifestBuilder::new("0.59.0")
            .native("react-native-maps", "0.24.0")
            .build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let mut app = MiniApp::load(tmp.path()).unwrap();
        let added = app
            .add_dependency(&reconciler, &pp("react-native-maps"), DependencyKind::Regular)
            .unwrap();
        app.save().unwrap();

        assert_eq!(added, pp("react-native-maps@0.24.0"));
        let reloaded = MiniApp::load(tmp.path()).unwrap();
        assert_eq!(
            reloaded.package_json()["dependencies"]["react-native-maps"],
            "0.24.0"
        );
        // Unrelated fields survive the rewrite.
        assert!(reloaded.package_json()["scripts"]["start"].is_string());
    }

    #[test]
    fn test_add_dev_dependency_goes_to_dev_section() {
        let tmp = TempDir::new().unwrap();
        create_miniapp(tmp.path());

        let manifest = ManifestBuilder::new("0.59.0").build();
        let installer = FakeInstaller::new();
        let reconciler = DependencyReconciler::new(&manifest, &installer);

        let mut app = MiniApp::load(tmp.path()).unwrap();
        app.add_dependency(&reconciler, &pp("eslint@5.0.0"), DependencyKind::Dev)
            .unwrap();

        assert_eq!(app.package_json()["devDependencies"]["eslint"], "5.0.0");
        assert!(app.package_json()["dependencies"].get("eslint").is_none());
        assert!(installer.installed().is_empty());
    }

    #[test]
    fn test_upgrade_only_bumps_existing() {
        let tmp = TempDir::new().unwrap();
        create_miniapp(tmp.path());

        let manifest = ManifestBuilder::new("0.58.0")
            .target("0.59.0")
            .native("react-native", "0.59.0")
            .native("react-native-maps", "0.24.0")
            .js("react", "16.8.6")
            .build();

        let mut app = MiniApp::load(tmp.path()).unwrap();
        let bumps = app.upgrade_to_platform_version(&manifest, "0.59.0").unwrap();

        assert_eq!(bumps.len(), 2);
        let deps = app.package_json()["dependencies"].as_object().unwrap();
        assert_eq!(deps["react-native"], "0.59.0");
        assert_eq!(deps["react"], "16.8.6");
        assert!(!deps.contains_key("react-native-maps"));
        assert_eq!(deps["lodash"], "^4.17.0");
    }

    #[test]
    fn test_dependency_key_for_locators() {
        assert_eq!(dependency_key(&pp("git+https://github.com/org/my-lib.git#v1")), "my-lib");
        assert_eq!(dependency_key(&pp("git@github.com:org/other.git")), "other");
        assert_eq!(dependency_key(&pp("../libs/local-lib")), "local-lib");
        assert_eq!(dependency_spec(&pp("../libs/local-lib")), "file:../libs/local-lib");
        assert_eq!(dependency_spec(&pp("left-pad")), "latest");
    }

    #[test]
    fn test_load_module_picks_kind() {
        let tmp = TempDir::new().unwrap();
        write_package_json(
            tmp.path(),
            r#"{"name":"movie-api-impl","version":"1.0.0","ern":{"moduleType":"nativeApiImpl"}}"#,
        );
        let module = load_module(tmp.path()).unwrap();
        assert_eq!(module.name(), Some("movie-api-impl"));

        assert_eq!(module.path(), tmp.path());
    }
}

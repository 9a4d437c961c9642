//! Native dependency classification.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::PackagePath;

/// How a native package relates to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NativeDependencyKind {
    /// Interface-only native module
    Api,
    /// Native implementation of an API
    ApiImpl,
    /// Third-party native module declared in the manifest
    ThirdPartyInManifest,
    /// Third-party native module unknown to the manifest
    ThirdPartyNotInManifest,
}

impl NativeDependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeDependencyKind::Api => "api",
            NativeDependencyKind::ApiImpl => "api-impl",
            NativeDependencyKind::ThirdPartyInManifest => "third-party-in-manifest",
            NativeDependencyKind::ThirdPartyNotInManifest => "third-party-not-in-manifest",
        }
    }

    /// APIs and API implementations are generated modules, not third-party code.
    pub fn is_api_or_impl(&self) -> bool {
        matches!(self, NativeDependencyKind::Api | NativeDependencyKind::ApiImpl)
    }
}

impl fmt::Display for NativeDependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package found to contain native code, with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeDependency {
    path: PackagePath,
    kind: NativeDependencyKind,
    location: PathBuf,
}

impl NativeDependency {
    pub fn new(path: PackagePath, kind: NativeDependencyKind, location: impl Into<PathBuf>) -> Self {
        NativeDependency {
            path,
            kind,
            location: location.into(),
        }
    }

    pub fn package_path(&self) -> &PackagePath {
        &self.path
    }

    pub fn kind(&self) -> NativeDependencyKind {
        self.kind
    }

    /// Directory the package was found in.
    pub fn location(&self) -> &Path {
        &self.location
    }
}

/// Native dependencies of a module tree, grouped by classification.
///
/// Each group keeps discovery order. Produced once per scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeDependencySet {
    apis: Vec<NativeDependency>,
    native_apis_impl: Vec<NativeDependency>,
    third_party_in_manifest: Vec<NativeDependency>,
    third_party_not_in_manifest: Vec<NativeDependency>,
}

impl NativeDependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency to the group matching its kind.
    pub fn push(&mut self, dep: NativeDependency) {
        match dep.kind {
            NativeDependencyKind::Api => self.apis.push(dep),
            NativeDependencyKind::ApiImpl => self.native_apis_impl.push(dep),
            NativeDependencyKind::ThirdPartyInManifest => self.third_party_in_manifest.push(dep),
            NativeDependencyKind::ThirdPartyNotInManifest => {
                self.third_party_not_in_manifest.push(dep)
            }
        }
    }

    pub fn apis(&self) -> &[NativeDependency] {
        &self.apis
    }

    pub fn native_apis_impl(&self) -> &[NativeDependency] {
        &self.native_apis_impl
    }

    pub fn third_party_in_manifest(&self) -> &[NativeDependency] {
        &self.third_party_in_manifest
    }

    pub fn third_party_not_in_manifest(&self) -> &[NativeDependency] {
        &self.third_party_not_in_manifest
    }

    /// All groups flattened: APIs, implementations, then third-party.
    pub fn all(&self) -> impl Iterator<Item = &NativeDependency> {
        self.apis
            .iter()
            .chain(&self.native_apis_impl)
            .chain(&self.third_party_in_manifest)
            .chain(&self.third_party_not_in_manifest)
    }

    /// Package paths of [`NativeDependencySet::all`].
    pub fn all_paths(&self) -> Vec<PackagePath> {
        self.all().map(|d| d.package_path().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.apis.len()
            + self.native_apis_impl.len()
            + self.third_party_in_manifest.len()
            + self.third_party_not_in_manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grouped human-readable listing. Empty groups are omitted.
    pub fn format_grouped(&self) -> String {
        let groups = [
            ("APIs", &self.apis),
            ("Native API Implementations", &self.native_apis_impl),
            ("Third party in manifest", &self.third_party_in_manifest),
            ("Third party not in manifest", &self.third_party_not_in_manifest),
        ];

        let mut output = String::new();
        for (title, deps) in groups {
            if deps.is_empty() {
                continue;
            }
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&format!("========= {} =========\n", title));
            for dep in deps {
                output.push_str(&format!("{}\n", dep.package_path()));
            }
        }
        output
    }

    /// Single-line machine-readable record.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for NativeDependencySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct NativeDependencySetData<'a> {
            apis: Vec<&'a PackagePath>,
            native_apis_impl: Vec<&'a PackagePath>,
            third_party_in_manifest: Vec<&'a PackagePath>,
            third_party_not_in_manifest: Vec<&'a PackagePath>,
        }

        fn paths(deps: &[NativeDependency]) -> Vec<&PackagePath> {
            deps.iter().map(NativeDependency::package_path).collect()
        }

        NativeDependencySetData {
            apis: paths(&self.apis),
            native_apis_impl: paths(&self.native_apis_impl),
            third_party_in_manifest: paths(&self.third_party_in_manifest),
            third_party_not_in_manifest: paths(&self.third_party_not_in_manifest),
        }
        .serialize(serializer)
    }
}

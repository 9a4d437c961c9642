//! `package.json` descriptors of installed packages.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::PackagePath;

/// File name of a package descriptor.
pub const PACKAGE_JSON: &str = "package.json";

/// Module type declared under the `ern` key of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ModuleType {
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "nativeApiImpl")]
    NativeApiImpl,
    #[serde(rename = "jsApiImpl")]
    JsApiImpl,
    #[serde(rename = "miniapp")]
    MiniApp,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErnSection {
    module_type: Option<ModuleType>,
}

/// The subset of `package.json` needed to identify and classify a package.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageDescriptor {
    pub name: Option<String>,
    pub version: Option<String>,
    pub keywords: Vec<String>,
    ern: Option<ErnSection>,
}

impl PackageDescriptor {
    /// Load the descriptor of the package in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PACKAGE_JSON);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// `name@version` of the package, if the descriptor names it.
    pub fn package_path(&self) -> Result<Option<PackagePath>> {
        match &self.name {
            Some(name) => Ok(Some(PackagePath::from_name(name, self.version.as_deref())?)),
            None => Ok(None),
        }
    }

    /// Declared module type, falling back to marker keywords.
    pub fn module_type(&self) -> Option<ModuleType> {
        if let Some(module_type) = self.ern.as_ref().and_then(|e| e.module_type) {
            return Some(module_type);
        }

        if self.keywords.iter().any(|k| k == "ern-api") {
            Some(ModuleType::Api)
        } else if self.keywords.iter().any(|k| k == "ern-native-api-impl") {
            Some(ModuleType::NativeApiImpl)
        } else if self.keywords.iter().any(|k| k == "ern-js-api-impl") {
            Some(ModuleType::JsApiImpl)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_from_ern_section() {
        let d = PackageDescriptor::parse(
            r#"{"name":"movie-api","version":"1.0.0","ern":{"moduleType":"api"}}"#,
        )
        .unwrap();
        assert_eq!(d.module_type(), Some(ModuleType::Api));
        assert_eq!(
            d.package_path().unwrap().unwrap().to_string(),
            "movie-api@1.0.0"
        );
    }

    #[test]
    fn test_module_type_from_keywords() {
        let d = PackageDescriptor::parse(
            r#"{"name":"x","version":"1.0.0","keywords":["react","ern-native-api-impl"]}"#,
        )
        .unwrap();
        assert_eq!(d.module_type(), Some(ModuleType::NativeApiImpl));
    }

    #[test]
    fn test_unknown_module_type_and_missing_name() {
        let d = PackageDescriptor::parse(r#"{"ern":{"moduleType":"somethingElse"}}"#).unwrap();
        assert_eq!(d.module_type(), Some(ModuleType::Unknown));
        assert!(d.package_path().unwrap().is_none());
    }
}

//! On-disk manifest format.
//!
//! ```json
//! {
//!   "targets": {
//!     "0.59.0": {
//!       "nativeDependencies": {
//!         "react-native": "0.59.0",
//!         "react-native-maps": { "version": "0.24.0", "platforms": { "ios": false } },
//!         "movie-api": { "version": "1.0.0", "moduleType": "api" }
//!       },
//!       "jsDependencies": { "react": "16.8.3" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::{ModuleType, Platform};

/// Raw manifest document, keyed by platform version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestDocument {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetDocument>,
}

/// Reference dependencies for one platform version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDocument {
    #[serde(default)]
    pub native_dependencies: BTreeMap<String, EntryDocument>,
    #[serde(default)]
    pub js_dependencies: BTreeMap<String, EntryDocument>,
}

/// A manifest entry: either a bare version or a detailed record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryDocument {
    Version(String),
    Detailed(DetailedEntry),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedEntry {
    pub version: String,
    #[serde(default)]
    pub platforms: PlatformSupport,
    #[serde(default)]
    pub module_type: Option<ModuleType>,
}

impl EntryDocument {
    pub fn version(&self) -> &str {
        match self {
            EntryDocument::Version(v) => v,
            EntryDocument::Detailed(d) => &d.version,
        }
    }

    pub fn platforms(&self) -> PlatformSupport {
        match self {
            EntryDocument::Version(_) => PlatformSupport::default(),
            EntryDocument::Detailed(d) => d.platforms,
        }
    }

    pub fn module_type(&self) -> Option<ModuleType> {
        match self {
            EntryDocument::Version(_) => None,
            EntryDocument::Detailed(d) => d.module_type,
        }
    }
}

/// Platforms a manifest entry supports. Both default to supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatformSupport {
    pub android: bool,
    pub ios: bool,
}

impl Default for PlatformSupport {
    fn default() -> Self {
        PlatformSupport {
            android: true,
            ios: true,
        }
    }
}

impl PlatformSupport {
    pub fn supports(&self, platform: Platform) -> bool {
        match platform {
            Platform::Android => self.android,
            Platform::Ios => self.ios,
        }
    }
}

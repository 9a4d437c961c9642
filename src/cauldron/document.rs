//! Cauldron document format.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "apps": {
//!     "movie-app:android:1.0.0": {
//!       "nativeDependencies": ["react-native@0.59.0"],
//!       "miniApps": ["movie-list-miniapp@0.0.1"],
//!       "containerVersion": "1.0.3",
//!       "ernVersion": "0.1.0"
//!     }
//!   },
//!   "log": [{ "id": "5f3c0e1b9a2d", "message": "sync movie-app:android:1.0.0" }]
//! }
//! ```

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{AppDescriptor, DependencySet};
use crate::util::hash::Fingerprint;

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Container version given to a record on its first sync.
pub const INITIAL_CONTAINER_VERSION: &str = "1.0.0";

/// The whole persisted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CauldronDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub apps: BTreeMap<String, AppVersionRecord>,
    #[serde(default)]
    pub log: Vec<AuditEntry>,
}

/// State recorded for one application version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersionRecord {
    #[serde(default)]
    pub native_dependencies: DependencySet,
    #[serde(default)]
    pub mini_apps: DependencySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ern_version: Option<String>,
}

/// One committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub message: String,
}

impl Default for CauldronDocument {
    fn default() -> Self {
        CauldronDocument {
            schema_version: SCHEMA_VERSION,
            apps: BTreeMap::new(),
            log: Vec::new(),
        }
    }
}

impl CauldronDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self> {
        let document: CauldronDocument =
            serde_json::from_str(content).context("failed to parse cauldron document")?;
        if document.schema_version > SCHEMA_VERSION {
            bail!(
                "cauldron schema version {} is newer than supported version {}\n\
                 help: upgrade ern",
                document.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(document)
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    pub fn app(&self, descriptor: &AppDescriptor) -> Option<&AppVersionRecord> {
        self.apps.get(&descriptor.to_string())
    }

    /// The record for `descriptor`, created empty if missing.
    pub fn app_mut(&mut self, descriptor: &AppDescriptor) -> &mut AppVersionRecord {
        self.apps.entry(descriptor.to_string()).or_default()
    }

    /// Identifier of the current record set: 12 hex chars of its SHA-256.
    pub fn content_id(&self) -> Result<String> {
        let apps = serde_json::to_string(&self.apps)?;
        let mut fp = Fingerprint::new();
        fp.update_str(&apps);
        Ok(fp.finish_short())
    }
}

/// Next patch version after `version`. A prerelease moves to its release.
pub fn bump_patch(version: &str) -> Result<String> {
    let mut parsed = semver::Version::parse(version)
        .with_context(|| format!("container version `{}` is not a semantic version", version))?;
    if parsed.pre.is_empty() {
        parsed.patch += 1;
    }
    parsed.pre = semver::Prerelease::EMPTY;
    parsed.build = semver::BuildMetadata::EMPTY;
    Ok(parsed.to_string())
}

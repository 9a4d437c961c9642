//! Configuration file support for ern.
//!
//! ern supports two configuration file locations:
//! - Global: `~/.ern/config.toml` - User-wide defaults
//! - Project: `.ern/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, field by field.
//! Command line flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reconcile::NpmClientKind;

/// ern configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest location and selected platform version
    pub manifest: ManifestConfig,

    /// Cauldron settings
    pub cauldron: CauldronConfig,

    /// JS package manager settings
    pub npm: NpmConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestConfig {
    /// Path to the manifest JSON document
    pub path: Option<PathBuf>,

    /// Platform version used when none is given on the command line
    pub platform_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CauldronConfig {
    /// Path to the cauldron JSON document
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmConfig {
    /// `yarn` or `npm`; detected from PATH when unset
    pub client: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.manifest.path.is_some() {
            self.manifest.path = other.manifest.path;
        }
        if other.manifest.platform_version.is_some() {
            self.manifest.platform_version = other.manifest.platform_version;
        }
        if other.cauldron.path.is_some() {
            self.cauldron.path = other.cauldron.path;
        }
        if other.npm.client.is_some() {
            self.npm.client = other.npm.client;
        }
    }

    /// Parse the npm client from config string.
    pub fn npm_client(&self) -> Result<Option<NpmClientKind>> {
        self.npm
            .client
            .as_deref()
            .map(str::parse)
            .transpose()
            .context("invalid `[npm] client` in config")
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.ern/config.toml)
/// 2. Global config (~/.ern/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global ern directory (~/.ern).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ern"))
}

/// Get the project config path (.ern/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ern").join("config.toml")
}

//! Global context for ern operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//! Command line overrides are resolved here so every command applies the
//! same precedence: flag, then project config, then global config.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::manifest::Manifest;
use crate::reconcile::NpmClient;
use crate::util::config::{self, Config};
use crate::util::diagnostic::suggestions;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global ern data (~/.ern/)
    home: PathBuf,

    /// Merged global and project configuration
    config: Config,

    verbose: bool,
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = config::global_config_dir().unwrap_or_else(|| PathBuf::from(".ern"));
        Self::with_paths(cwd, home)
    }

    /// Create a GlobalContext with explicit working and home directories.
    pub fn with_paths(cwd: PathBuf, home: PathBuf) -> Self {
        let config = config::load_config(
            &home.join("config.toml"),
            &config::project_config_path(&cwd),
        );

        GlobalContext {
            cwd,
            home,
            config,
            verbose: false,
            color: true,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the ern home directory (~/.ern/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Resolve `path` against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Manifest location: `flag`, else `[manifest] path`.
    pub fn manifest_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        flag.or(self.config.manifest.path.as_deref())
            .map(|p| self.resolve_path(p))
            .ok_or_else(|| anyhow!("no manifest configured\n{}", suggestions::NO_MANIFEST))
    }

    /// Selected platform version: `flag`, else `[manifest] platform-version`.
    pub fn platform_version(&self, flag: Option<&str>) -> Result<String> {
        flag.or(self.config.manifest.platform_version.as_deref())
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow!(
                    "no platform version selected\n{}",
                    suggestions::NO_PLATFORM_VERSION
                )
            })
    }

    /// Load the manifest, applying command line overrides.
    pub fn load_manifest(&self, path: Option<&Path>, platform_version: Option<&str>) -> Result<Manifest> {
        let path = self.manifest_path(path)?;
        let platform_version = self.platform_version(platform_version)?;
        tracing::debug!(
            "loading manifest {} at platform version {}",
            path.display(),
            platform_version
        );
        Manifest::load(&path, &platform_version)
    }

    /// Load the manifest if one is configured.
    pub fn load_manifest_if_configured(
        &self,
        path: Option<&Path>,
        platform_version: Option<&str>,
    ) -> Result<Option<Manifest>> {
        if path.is_none() && self.config.manifest.path.is_none() {
            return Ok(None);
        }
        self.load_manifest(path, platform_version).map(Some)
    }

    /// Cauldron location: `flag`, else `[cauldron] path`, else `~/.ern/cauldron.json`.
    pub fn cauldron_path(&self, flag: Option<&Path>) -> PathBuf {
        match flag.or(self.config.cauldron.path.as_deref()) {
            Some(path) => self.resolve_path(path),
            None => self.home.join("cauldron.json"),
        }
    }

    /// The JS package manager used for probe installs.
    pub fn npm_client(&self) -> Result<NpmClient> {
        NpmClient::detect(self.config.npm_client()?)
    }
}

//! Throwaway installs used to find out whether a package is native.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::{PackagePath, PACKAGE_JSON};
use crate::util::fs;
use crate::util::process::{find_executable, ProcessBuilder};

/// Installs a package into a directory.
pub trait PackageInstaller {
    /// Install `package` as a dependency of the project in `dir`.
    ///
    /// Returns the name the package was installed under.
    fn install(&self, package: &PackagePath, dir: &Path) -> Result<String>;
}

/// A scratch project in a temporary directory.
///
/// The directory and everything installed into it is removed when the
/// environment is dropped, on every exit path.
pub struct ProbeEnvironment {
    dir: TempDir,
}

impl ProbeEnvironment {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("ern-probe-")
            .tempdir()
            .context("failed to create probe directory")?;

        fs::write_string(
            &dir.path().join(PACKAGE_JSON),
            "{\n  \"name\": \"ern-probe\",\n  \"version\": \"0.0.0\",\n  \"private\": true\n}\n",
        )?;

        Ok(ProbeEnvironment { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.dir.path().join("node_modules")
    }

    /// Remove the directory now, reporting failures.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("failed to remove probe directory {}", path.display()))
    }
}

/// JS package manager used for installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpmClientKind {
    Yarn,
    Npm,
}

impl NpmClientKind {
    pub fn program(&self) -> &'static str {
        match self {
            NpmClientKind::Yarn => "yarn",
            NpmClientKind::Npm => "npm",
        }
    }
}

impl std::str::FromStr for NpmClientKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yarn" => Ok(NpmClientKind::Yarn),
            "npm" => Ok(NpmClientKind::Npm),
            other => bail!("unknown npm client `{}`; expected `yarn` or `npm`", other),
        }
    }
}

/// Installs packages by shelling out to yarn or npm.
#[derive(Debug, Clone)]
pub struct NpmClient {
    kind: NpmClientKind,
    program: PathBuf,
}

impl NpmClient {
    /// Locate the requested client, or yarn then npm when unspecified.
    pub fn detect(preferred: Option<NpmClientKind>) -> Result<Self> {
        let candidates = match preferred {
            Some(kind) => vec![kind],
            None => vec![NpmClientKind::Yarn, NpmClientKind::Npm],
        };

        for kind in &candidates {
            if let Some(program) = find_executable(kind.program()) {
                tracing::debug!("using {} at {}", kind.program(), program.display());
                return Ok(NpmClient {
                    kind: *kind,
                    program,
                });
            }
        }

        let names: Vec<&str> = candidates.iter().map(|k| k.program()).collect();
        bail!(
            "could not find {} in PATH\n\
             help: install a JS package manager or set `[npm] client` in .ern/config.toml",
            names.join(" or ")
        )
    }

    pub fn kind(&self) -> NpmClientKind {
        self.kind
    }

    fn install_command(&self, package: &PackagePath, dir: &Path) -> ProcessBuilder {
        let spec = package.to_string();
        let builder = ProcessBuilder::new(&self.program)
            .cwd(dir)
            .env("npm_config_update_notifier", "false");
        match self.kind {
            NpmClientKind::Yarn => builder.args(["add", spec.as_str(), "--ignore-scripts", "--non-interactive"]),
            NpmClientKind::Npm => {
                builder.args(["install", spec.as_str(), "--ignore-scripts", "--no-audit", "--no-fund"])
            }
        }
    }
}

impl PackageInstaller for NpmClient {
    fn install(&self, package: &PackagePath, dir: &Path) -> Result<String> {
        let before = declared_dependencies(dir)?;
        self.install_command(package, dir)
            .exec_and_check()
            .with_context(|| format!("failed to install `{}`", package))?;
        let after = declared_dependencies(dir)?;

        if let Some(name) = after.into_iter().find(|name| !before.contains(name)) {
            return Ok(name);
        }
        if package.is_registry_path() {
            return Ok(package.base_path().to_string());
        }
        bail!(
            "installed `{}` but could not find it in {}",
            package,
            dir.join(PACKAGE_JSON).display()
        )
    }
}

fn declared_dependencies(dir: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(&dir.join(PACKAGE_JSON))?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(value
        .get("dependencies")
        .and_then(Value::as_object)
        .map(|deps| deps.keys().cloned().collect())
        .unwrap_or_default())
}

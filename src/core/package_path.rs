//! Package identification - WHICH package, and at what version.
//!
//! A PackagePath is parsed from the forms accepted on the command line and
//! in `package.json` dependency specs:
//! - `name`, `name@version`
//! - `@scope/name`, `@scope/name@version`
//! - `git+<url>[#ref]` (also `git://`, `git@host:path` and `http(s)://...git`)
//! - a filesystem path (`/abs`, `./rel`, `../rel`, `~/dir`, `file:<path>`)

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// npm package name, optionally scoped.
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[A-Za-z0-9~][A-Za-z0-9._~-]*/)?[A-Za-z0-9~][A-Za-z0-9._~-]*$")
        .expect("package name pattern is valid")
});

/// Error raised when an identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackagePathError {
    #[error("malformed package path `{input}`: {reason}")]
    Malformed { input: String, reason: String },
}

impl PackagePathError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        PackagePathError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Where a package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackagePathKind {
    /// npm registry name
    Registry,
    /// Git repository URL; the version is the ref after `#`
    Git,
    /// Local filesystem path; never versioned
    File,
}

/// Identity of a package: base path plus optional version.
///
/// Immutable once constructed. Equality (`==`) compares every field;
/// use [`PackagePath::same`] for manifest conformance checks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackagePath {
    base_path: String,
    version: Option<String>,
    kind: PackagePathKind,
}

impl PackagePath {
    /// Parse a package identifier.
    pub fn parse(input: &str) -> Result<Self, PackagePathError> {
        if input.is_empty() {
            return Err(PackagePathError::malformed(input, "empty identifier"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(PackagePathError::malformed(input, "contains whitespace"));
        }

        if is_file_spec(input) {
            return Ok(Self::parse_file(input));
        }
        if is_git_spec(input) {
            return Self::parse_git(input);
        }
        if input.contains("://") {
            return Err(PackagePathError::malformed(
                input,
                "URL is neither a git repository nor a file path",
            ));
        }

        Self::parse_registry(input)
    }

    fn parse_file(input: &str) -> Self {
        let trimmed = input.trim_end_matches(['/', '\\']);
        let base_path = if trimmed.is_empty() || trimmed.ends_with(':') {
            input.to_string()
        } else {
            trimmed.to_string()
        };

        PackagePath {
            base_path,
            version: None,
            kind: PackagePathKind::File,
        }
    }

    fn parse_git(input: &str) -> Result<Self, PackagePathError> {
        let (base, reference) = match input.split_once('#') {
            Some((_, "")) => {
                return Err(PackagePathError::malformed(input, "empty git reference after `#`"))
            }
            Some((base, reference)) => (base, Some(reference.to_string())),
            None => (input, None),
        };

        if let Some(rest) = base.strip_prefix("git@") {
            // scp-like syntax: git@host:owner/repo.git
            match rest.split_once(':') {
                Some((host, path)) if !host.is_empty() && !path.is_empty() => {}
                _ => return Err(PackagePathError::malformed(input, "invalid scp-like git url")),
            }
        } else {
            let url = base.strip_prefix("git+").unwrap_or(base);
            let parsed = Url::parse(url)
                .map_err(|e| PackagePathError::malformed(input, format!("invalid git url: {}", e)))?;
            if parsed.host_str().is_none() && parsed.scheme() != "file" {
                return Err(PackagePathError::malformed(input, "git url has no host"));
            }
        }

        Ok(PackagePath {
            base_path: base.to_string(),
            version: reference,
            kind: PackagePathKind::Git,
        })
    }

    fn parse_registry(input: &str) -> Result<Self, PackagePathError> {
        // Skip a leading scope marker when looking for the version separator.
        let search_from = usize::from(input.starts_with('@'));
        let (name, version) = match input[search_from..].find('@') {
            Some(idx) => {
                let idx = idx + search_from;
                let version = &input[idx + 1..];
                if version.is_empty() {
                    return Err(PackagePathError::malformed(input, "empty version after `@`"));
                }
                if version.contains('@') {
                    return Err(PackagePathError::malformed(input, "more than one version separator"));
                }
                (&input[..idx], Some(version.to_string()))
            }
            None => (input, None),
        };

        if name.starts_with('@') && !name.contains('/') {
            return Err(PackagePathError::malformed(input, "scope without package name"));
        }
        if !PACKAGE_NAME.is_match(name) {
            return Err(PackagePathError::malformed(input, "invalid package name"));
        }

        Ok(PackagePath {
            base_path: name.to_string(),
            version,
            kind: PackagePathKind::Registry,
        })
    }

    /// Build a registry package path from a name and optional version.
    ///
    /// The version is held to the same rules as a parsed one, so the result
    /// always reparses from its string form. Ranges with spaces such as
    /// `>= 1.0.0 < 2.0.0` are rejected.
    pub fn from_name(name: &str, version: Option<&str>) -> Result<Self, PackagePathError> {
        let path = Self::parse(name)?;
        if !path.is_registry_path() || path.version.is_some() {
            return Err(PackagePathError::malformed(name, "not a bare package name"));
        }
        match version {
            Some(v) => path.with_version(v),
            None => Ok(path),
        }
    }

    /// The same package at a different version.
    ///
    /// File paths carry no version, so they are returned unchanged.
    pub fn with_version(&self, version: impl Into<String>) -> Result<Self, PackagePathError> {
        if self.kind == PackagePathKind::File {
            return Ok(self.clone());
        }
        let version = version.into();
        self.check_version(&version)?;
        Ok(PackagePath {
            base_path: self.base_path.clone(),
            version: Some(version),
            kind: self.kind,
        })
    }

    /// Reject versions that would not survive a `Display` then `parse`.
    fn check_version(&self, version: &str) -> Result<(), PackagePathError> {
        let separator = match self.kind {
            PackagePathKind::Git => '#',
            _ => '@',
        };
        let input = format!("{}{}{}", self.base_path, separator, version);
        if version.is_empty() {
            return Err(PackagePathError::malformed(&input, "empty version"));
        }
        if version.chars().any(char::is_whitespace) {
            return Err(PackagePathError::malformed(&input, "version contains whitespace"));
        }
        if self.kind == PackagePathKind::Registry && version.contains('@') {
            return Err(PackagePathError::malformed(&input, "more than one version separator"));
        }
        Ok(())
    }

    /// The same package without a version.
    pub fn unversioned(&self) -> Self {
        PackagePath {
            base_path: self.base_path.clone(),
            version: None,
            kind: self.kind,
        }
    }

    /// Scope and name for registry packages, the locator otherwise.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Version or git reference, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn kind(&self) -> PackagePathKind {
        self.kind
    }

    pub fn is_registry_path(&self) -> bool {
        self.kind == PackagePathKind::Registry
    }

    pub fn is_git_path(&self) -> bool {
        self.kind == PackagePathKind::Git
    }

    pub fn is_file_path(&self) -> bool {
        self.kind == PackagePathKind::File
    }

    /// Compare two package paths.
    ///
    /// Base paths must match exactly. Versions are compared as strings,
    /// never as semver ranges, unless `ignore_version` is set.
    pub fn same(&self, other: &PackagePath, ignore_version: bool) -> bool {
        self.base_path == other.base_path && (ignore_version || self.version == other.version)
    }
}

fn is_file_spec(input: &str) -> bool {
    input.starts_with("file:")
        || input.starts_with('/')
        || input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with("~/")
        || input == "."
        || input == ".."
        || is_windows_path(input)
}

fn is_windows_path(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn is_git_spec(input: &str) -> bool {
    if input.starts_with("git+") || input.starts_with("git://") || input.starts_with("git@") {
        return true;
    }
    let base = input.split('#').next().unwrap_or(input);
    (base.starts_with("https://") || base.starts_with("http://") || base.starts_with("ssh://"))
        && base.ends_with(".git")
}

impl fmt::Display for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.version) {
            (PackagePathKind::Registry, Some(v)) => write!(f, "{}@{}", self.base_path, v),
            (PackagePathKind::Git, Some(r)) => write!(f, "{}#{}", self.base_path, r),
            _ => write!(f, "{}", self.base_path),
        }
    }
}

impl FromStr for PackagePath {
    type Err = PackagePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackagePath::parse(s)
    }
}

impl Serialize for PackagePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackagePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PackagePath::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registry_forms() {
        let p = PackagePath::parse("react-native").unwrap();
        assert_eq!(p.base_path(), "react-native");
        assert_eq!(p.version(), None);
        assert!(p.is_registry_path());

        let p = PackagePath::parse("react-native@0.59.0").unwrap();
        assert_eq!(p.base_path(), "react-native");
        assert_eq!(p.version(), Some("0.59.0"));

        let p = PackagePath::parse("@scope/name@^1.2.0").unwrap();
        assert_eq!(p.base_path(), "@scope/name");
        assert_eq!(p.version(), Some("^1.2.0"));

        let p = PackagePath::parse("@scope/name").unwrap();
        assert_eq!(p.base_path(), "@scope/name");
        assert_eq!(p.version(), None);
    }

    #[test]
    fn test_parse_git_forms() {
        let p = PackagePath::parse("git+https://github.com/org/repo.git#v1.0.0").unwrap();
        assert!(p.is_git_path());
        assert_eq!(p.base_path(), "git+https://github.com/org/repo.git");
        assert_eq!(p.version(), Some("v1.0.0"));

        let p = PackagePath::parse("git@github.com:org/repo.git").unwrap();
        assert!(p.is_git_path());
        assert_eq!(p.version(), None);

        let p = PackagePath::parse("https://github.com/org/repo.git#main").unwrap();
        assert!(p.is_git_path());
        assert_eq!(p.version(), Some("main"));
    }

    #[test]
    fn test_parse_file_forms() {
        for input in ["/abs/path", "./rel", "../up/pkg", "file:../pkg", "~/pkgs/x"] {
            let p = PackagePath::parse(input).unwrap();
            assert!(p.is_file_path(), "{} should be a file path", input);
            assert_eq!(p.version(), None);
            assert_eq!(p.to_string(), input);
        }

        let p = PackagePath::parse("./rel/").unwrap();
        assert_eq!(p.base_path(), "./rel");
    }

    #[test]
    fn test_parse_malformed() {
        for input in [
            "",
            "@",
            "@scope",
            "@scope/",
            "name@",
            "a@b@c",
            "has space",
            "git+https://github.com/org/repo.git#",
            "git@nohost",
            "https://example.com/tarball.tgz",
            "UPPER/slash",
        ] {
            let err = PackagePath::parse(input).unwrap_err();
            assert!(
                matches!(err, PackagePathError::Malformed { .. }),
                "{:?} should be malformed",
                input
            );
        }
    }

    #[test]
    fn test_round_trip() {
        for input in [
            "left-pad",
            "left-pad@1.3.0",
            "@walmart/react-native-electrode-bridge@1.5.0",
            "@scope/name",
            "git+ssh://git@github.com/org/repo.git#abc123",
            "git@github.com:org/repo.git#develop",
            "/tmp/some/package",
            "file:../local",
        ] {
            let p = PackagePath::parse(input).unwrap();
            let reparsed = PackagePath::parse(&p.to_string()).unwrap();
            assert!(reparsed.same(&p, false), "round trip failed for {}", input);
            assert_eq!(p.to_string(), input);
        }
    }

    #[test]
    fn test_same_is_exact() {
        let a = PackagePath::parse("react-native@0.59.0").unwrap();
        let b = PackagePath::parse("react-native@^0.59.0").unwrap();
        let c = PackagePath::parse("React-Native@0.59.0").unwrap();

        assert!(!a.same(&b, false));
        assert!(a.same(&b, true));
        assert!(!a.same(&c, true));
    }

    #[test]
    fn test_with_version_and_unversioned() {
        let p = PackagePath::parse("react-native").unwrap();
        let v = p.with_version("0.59.0").unwrap();
        assert_eq!(v.to_string(), "react-native@0.59.0");
        assert_eq!(v.unversioned(), p);

        let f = PackagePath::parse("./local").unwrap();
        assert_eq!(f.with_version("1.0.0").unwrap(), f);
    }

    #[test]
    fn test_built_versions_reparse() {
        let p = PackagePath::from_name("left-pad", Some("^1.3.0")).unwrap();
        assert_eq!(PackagePath::parse(&p.to_string()).unwrap(), p);

        let git = PackagePath::parse("git+https://github.com/org/repo.git").unwrap();
        let pinned = git.with_version("v1.0.0").unwrap();
        assert_eq!(PackagePath::parse(&pinned.to_string()).unwrap(), pinned);

        for version in ["1.0.0 beta", ">= 1.0.0 < 2.0.0", "", "1.0.0\t", "a@b"] {
            let err = PackagePath::from_name("left-pad", Some(version)).unwrap_err();
            assert!(
                matches!(err, PackagePathError::Malformed { .. }),
                "{:?} should be rejected",
                version
            );
        }
        assert!(git.with_version("main branch").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let p = PackagePath::parse("@scope/name@1.0.0").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"@scope/name@1.0.0\"");

        let back: PackagePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        assert!(serde_json::from_str::<PackagePath>("\"@scope\"").is_err());
    }
}

//! Reconciliation error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error raised when a dependency cannot be reconciled with the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("native dependency `{package}` is not declared in the manifest")]
    UnsupportedNativeDependency {
        package: String,
        platform_version: String,
    },

    #[error(
        "version conflict on native dependency `{dependency}`: {source_name} brings {found}, expected {expected}"
    )]
    TransitiveDependencyConflict {
        /// What pulled the dependency in (a candidate package or the composite)
        source_name: String,
        dependency: String,
        found: String,
        expected: String,
    },

    #[error("`{package}` is pinned to {expected} in the manifest, but {requested} was requested")]
    VersionMismatch {
        package: String,
        requested: String,
        expected: String,
    },
}

impl ReconcileError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ReconcileError::UnsupportedNativeDependency {
                package,
                platform_version,
            } => Diagnostic::error(format!(
                "`{}` contains native code and is not declared in the manifest",
                package
            ))
            .with_context(format!("platform version: {}", platform_version))
            .with_suggestion(format!(
                "Add `{}` to the manifest for platform version {}",
                package, platform_version
            ))
            .with_suggestion("Use a pure JS alternative".to_string()),

            ReconcileError::TransitiveDependencyConflict {
                source_name,
                dependency,
                found,
                expected,
            } => Diagnostic::error(format!("version conflict for `{}`", dependency))
                .with_context(format!("{} brings {}@{}", source_name, dependency, found))
                .with_context(format!("expected {}@{}", dependency, expected))
                .with_suggestion(format!(
                    "Use a version of {} that depends on {}@{}",
                    source_name, dependency, expected
                )),

            ReconcileError::VersionMismatch {
                package,
                requested,
                expected,
            } => Diagnostic::error(format!("version mismatch for `{}`", package))
                .with_context(format!("requested: {}", requested))
                .with_context(format!("manifest: {}", expected))
                .with_suggestion(format!("Use `{}@{}`", package, expected))
                .with_suggestion(format!(
                    "Omit the version to use the manifest's `{}`",
                    expected
                )),
        }
    }
}

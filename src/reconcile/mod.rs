//! Dependency reconciliation against the manifest.
//!
//! - [`DependencyReconciler`] accepts or rejects a single candidate, probing
//!   packages the manifest does not know in a throwaway install, which it
//!   keeps in a [`PackagePathCache`] for reuse
//! - [`sync_container_native_dependencies`] merges a composite's native
//!   dependencies into a container's recorded set
//! - [`upgrade_to_platform_version`] moves a dependency set to another
//!   platform version

pub mod add;
pub mod cache;
pub mod errors;
pub mod probe;
pub mod sync;
pub mod upgrade;

pub use add::DependencyReconciler;
pub use cache::PackagePathCache;
pub use errors::ReconcileError;
pub use probe::{NpmClient, NpmClientKind, PackageInstaller, ProbeEnvironment};
pub use sync::sync_container_native_dependencies;
pub use upgrade::{upgrade_to_platform_version, VersionBump};

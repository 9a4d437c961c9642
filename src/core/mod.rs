//! Core data structures for ern.
//!
//! This module contains the foundational types used throughout ern:
//! - Package identity (PackagePath)
//! - Native dependency classification
//! - Ordered dependency sets, unique by base path
//! - Module capabilities (mini-apps, API implementations)
//! - Application version descriptors

pub mod app_descriptor;
pub mod dependency_set;
pub mod module;
pub mod native_dependency;
pub mod package_json;
pub mod package_path;

pub use app_descriptor::{AppDescriptor, Platform};
pub use dependency_set::{DependencyKind, DependencySet};
pub use module::{load_module, ApiImplModule, MiniApp, Module, ModuleDependencies};
pub use native_dependency::{NativeDependency, NativeDependencyKind, NativeDependencySet};
pub use package_json::{ModuleType, PackageDescriptor, PACKAGE_JSON};
pub use package_path::{PackagePath, PackagePathError, PackagePathKind};

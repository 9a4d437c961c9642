//! ern - native dependency resolution for mobile mini-app containers
//!
//! This crate provides the core library functionality for `ern`:
//! classifying the native modules of an installed JS module tree,
//! checking candidates against a reference manifest, and recording the
//! reconciled dependency set of an application version in the Cauldron.

pub mod cauldron;
pub mod core;
pub mod manifest;
pub mod ops;
pub mod reconcile;
pub mod scanner;
pub mod util;

/// Fixture builders and fakes for unit tests.
///
/// Only compiled for `cfg(test)`. Builds throwaway `node_modules` trees,
/// manifests and in-memory Cauldron backends.
#[cfg(test)]
pub mod test_support;

pub use cauldron::{Cauldron, Transaction};
pub use core::{
    AppDescriptor, DependencySet, MiniApp, Module, NativeDependency, NativeDependencyKind,
    NativeDependencySet, PackagePath,
};
pub use manifest::Manifest;
pub use reconcile::DependencyReconciler;
pub use scanner::NativeDependencyScanner;
pub use util::context::GlobalContext;

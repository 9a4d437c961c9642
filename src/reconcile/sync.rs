//! Container native dependency synchronization.

use std::collections::HashMap;

use crate::core::{DependencySet, PackagePath};
use crate::reconcile::ReconcileError;

/// Merge the native dependencies discovered in a composite into the set
/// currently recorded for a container.
///
/// Entries of `current` keep their position and take the discovered version
/// when one was found. Newly discovered packages are appended in discovery
/// order. Entries no longer discovered are kept. Two different versions of
/// one package among `discovered` is a conflict, and `current` is left
/// untouched.
pub fn sync_container_native_dependencies(
    current: &DependencySet,
    discovered: &[PackagePath],
) -> Result<DependencySet, ReconcileError> {
    let mut by_base: HashMap<&str, &PackagePath> = HashMap::new();
    for path in discovered {
        if let Some(previous) = by_base.insert(path.base_path(), path) {
            if previous.version() != path.version() {
                return Err(ReconcileError::TransitiveDependencyConflict {
                    source_name: "composite".to_string(),
                    dependency: path.base_path().to_string(),
                    found: path.version().unwrap_or("*").to_string(),
                    expected: previous.version().unwrap_or("*").to_string(),
                });
            }
        }
    }

    for kept in current.iter().filter(|p| !by_base.contains_key(p.base_path())) {
        tracing::warn!("{} was not found in the composite; keeping it", kept);
    }

    let mut synced = current.clone();
    for path in discovered {
        match synced.upsert(path.clone()) {
            Some(previous) if previous != *path => {
                tracing::info!("updating {} to {}", previous, path);
            }
            Some(_) => {}
            None => tracing::info!("adding {}", path),
        }
    }

    Ok(synced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pp(s: &str) -> PackagePath {
        PackagePath::parse(s).unwrap()
    }

    fn set(items: &[&str]) -> DependencySet {
        items.iter().map(|s| pp(s)).collect()
    }

    #[test]
    fn test_updates_in_place_and_appends() {
        let current = set(&["react-native@0.59.0", "react-native-maps@0.23.0"]);
        let discovered = vec![pp("react-native-maps@0.24.0"), pp("react-native-svg@9.0.0")];

        let synced = sync_container_native_dependencies(&current, &discovered).unwrap();
        assert_eq!(
            synced.as_slice(),
            &[
                pp("react-native@0.59.0"),
                pp("react-native-maps@0.24.0"),
                pp("react-native-svg@9.0.0"),
            ]
        );
    }

    #[test]
    fn test_unchanged_when_nothing_new() {
        let current = set(&["react-native@0.59.0"]);
        let synced =
            sync_container_native_dependencies(&current, &[pp("react-native@0.59.0")]).unwrap();
        assert_eq!(synced, current);

        let synced = sync_container_native_dependencies(&current, &[]).unwrap();
        assert_eq!(synced, current);
    }

    #[test]
    fn test_conflicting_discovered_versions() {
        let current = set(&["react-native-maps@0.23.0"]);
        let discovered = vec![pp("react-native-maps@0.24.0"), pp("react-native-maps@0.25.0")];

        let err = sync_container_native_dependencies(&current, &discovered).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::TransitiveDependencyConflict {
                source_name: "composite".to_string(),
                dependency: "react-native-maps".to_string(),
                found: "0.25.0".to_string(),
                expected: "0.24.0".to_string(),
            }
        );
        assert_eq!(current.as_slice(), &[pp("react-native-maps@0.23.0")]);
    }

    #[test]
    fn test_duplicate_discovery_is_not_a_conflict() {
        let discovered = vec![pp("react-native@0.59.0"), pp("react-native@0.59.0")];
        let synced = sync_container_native_dependencies(&DependencySet::new(), &discovered).unwrap();
        assert_eq!(synced.as_slice(), &[pp("react-native@0.59.0")]);
    }
}

//! Native code detection.

use std::ffi::OsStr;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// Build files that mark a package as carrying Android or iOS code.
const NATIVE_BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts", "project.pbxproj"];

/// Whether the package in `dir` contains platform-specific build files.
///
/// Nested `node_modules` and hidden directories are not searched.
pub fn has_native_code(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
        .filter_map(|e| e.ok())
        .any(|e| is_native_marker(&e))
}

fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name.starts_with('.')
}

fn is_native_marker(entry: &DirEntry) -> bool {
    let name = entry.file_name();
    let ext = Path::new(name).extension().and_then(OsStr::to_str);

    if entry.file_type().is_dir() {
        return ext == Some("xcodeproj");
    }

    ext == Some("podspec")
        || name
            .to_str()
            .is_some_and(|n| NATIVE_BUILD_FILES.contains(&n))
}

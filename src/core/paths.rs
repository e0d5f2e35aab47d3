//! Project directory placement.
//!
//! Relative project directories are collected under a single
//! `generations/` parent so generated projects never land at arbitrary
//! places in the working tree.

use std::path::{Component, Path, PathBuf};

/// Directory under which relative project directories are placed.
pub const GENERATIONS_DIR: &str = "generations";

/// Normalizes a user-supplied project directory.
///
/// - `.` components are dropped.
/// - Paths already of the form `generations/<something>` are unchanged.
/// - Absolute paths are unchanged.
/// - Every other relative path is placed under [`GENERATIONS_DIR`].
#[must_use]
pub fn normalize_project_dir(input: &Path) -> PathBuf {
    let cleaned: PathBuf = input
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if is_under_generations(&cleaned) || cleaned.is_absolute() {
        return cleaned;
    }

    Path::new(GENERATIONS_DIR).join(cleaned)
}

/// Returns true when the path is `generations/` followed by at least one
/// more component.
fn is_under_generations(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        components.next(),
        Some(Component::Normal(first)) if first == GENERATIONS_DIR
    ) && components.next().is_some()
}

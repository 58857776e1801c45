//! Recursive data-file discovery.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("data root {0} does not exist or is not a directory")]
    RootNotFound(PathBuf),

    #[error("failed to walk {0}: {1}")]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// Recursively enumerate files under `root` whose extension matches
/// `extension` (case-insensitive, without the leading dot), as absolute
/// paths in sorted order.
///
/// An empty tree yields an empty list; a missing or unreadable root is an
/// error.
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let root = root
        .canonicalize()
        .map_err(|_| DiscoverError::RootNotFound(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(DiscoverError::RootNotFound(root));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|e| DiscoverError::Walk(root.clone(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_tree_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let files = discover_files(dir.path(), "json").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_nonexistent_root_is_an_error() {
        let result = discover_files(Path::new("/nonexistent/data/root"), "json");
        assert!(matches!(result, Err(DiscoverError::RootNotFound(_))));
    }

    #[test]
    fn test_finds_nested_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/inner/two.json"), "{}").unwrap();
        fs::write(dir.path().join("a/one.json"), "{}").unwrap();
        fs::write(dir.path().join("a/skipped.txt"), "").unwrap();

        let files = discover_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a/one.json"));
        assert!(files[1].ends_with("b/inner/two.json"));
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("upper.JSON"), "{}").unwrap();

        let files = discover_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 1);
    }
}

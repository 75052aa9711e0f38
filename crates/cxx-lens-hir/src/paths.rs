//! Lexical path normalization shared by file lookup and compile databases.

use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against the working directory and removes `.` and
/// `..` components without touching the filesystem.
///
/// Symlinks are not resolved, so two spellings of the same file only compare
/// equal when they normalize to the same text.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_dot_components() {
        assert_eq!(
            normalize(Path::new("/src/./lib/../main.cpp")),
            PathBuf::from("/src/main.cpp")
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        assert!(normalize(Path::new("main.cpp")).is_absolute());
    }
}

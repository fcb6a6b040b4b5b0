//! Lexical path helpers for monitored roots and runfolder paths.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a path without touching the filesystem.
///
/// Drops `.` components and trailing separators and folds `..` into its
/// parent, like `os.path.normpath`. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Make a path absolute against the current directory, then normalize it.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize_path(&cwd.join(path)))
}

//! Path normalization
//!
//! Image paths are store keys, so every spelling of the same file has to
//! collapse to one form before it reaches the store or the cache.

use std::path::{Component, Path, PathBuf};

/// Lexically clean a path: drop `.` segments and resolve `..` against the
/// preceding segment. Symlinks are not followed and the filesystem is not
/// touched, so missing paths normalize too.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut clean = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match clean.components().next_back() {
                Some(Component::Normal(_)) => {
                    clean.pop();
                }
                // `..` above the root is the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => clean.push(".."),
            },
            other => clean.push(other.as_os_str()),
        }
    }

    if clean.as_os_str().is_empty() {
        clean.push(".");
    }
    clean
}

/// Absolute, normalized form of `path`, resolved against the current directory
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Ok(normalize_path(&std::env::current_dir()?.join(path)))
    }
}

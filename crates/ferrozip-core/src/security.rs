//! Path handling for safe archive operations
//!
//! Extraction never trusts an entry name. Every destination is built by
//! joining the entry's components onto an absolute, lexically cleaned root
//! and then checked to still lie inside that root.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::error;

/// Lexically clean a path: drop `.` segments and fold `name/..` pairs.
///
/// Leading `..` segments of a relative path are kept, and `..` directly
/// under the root is dropped. Nothing touches the file system, so symlinks
/// are not resolved.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Resolve the extraction root to an absolute, cleaned path.
pub fn absolute_root(root: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(root).map_err(|e| Error::io_at("resolve", root.to_path_buf(), e))?;
    Ok(clean_path(&absolute))
}

/// Join an untrusted entry name onto `root` and make sure the result stays
/// inside it.
///
/// `root` must already be absolute and clean (see [`absolute_root`]). Root
/// and drive-prefix components of `name` are dropped, so absolute names land
/// under `root`. The result must be `root` itself or a path strictly below
/// it, otherwise [`Error::PathTraversal`] naming `entry` is returned.
pub fn resolve_destination(root: &Path, name: &str, entry: &str) -> Result<PathBuf> {
    let mut result = root.to_path_buf();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result != root && !result.starts_with(root) {
        error!(root = ?root, entry, resolved = ?result, "Entry escapes extraction root");
        return Err(Error::PathTraversal(entry.to_string()));
    }

    Ok(result)
}

/// Entry name for a file named directly on the command line.
///
/// The path is kept exactly as given; only platform separators become `/`.
pub fn source_name(path: &Path) -> String {
    let name = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        name.into_owned()
    } else {
        name.replace(MAIN_SEPARATOR, "/")
    }
}

/// Convert a traversed source path into a zip entry name.
///
/// The path is cleaned, as joining the walk root with each child would
/// clean it, and its separators become `/`. Absolute paths stay absolute.
pub fn entry_name(path: &Path) -> String {
    let cleaned = clean_path(path);
    let mut name = String::new();

    for component in cleaned.components() {
        match component {
            Component::RootDir => name.push('/'),
            Component::Prefix(prefix) => name.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::CurDir => name.push('.'),
            Component::ParentDir => {
                push_segment(&mut name, "..");
            }
            Component::Normal(part) => {
                push_segment(&mut name, &part.to_string_lossy());
            }
        }
    }

    name
}

fn push_segment(name: &mut String, segment: &str) {
    if !name.is_empty() && !name.ends_with('/') {
        name.push('/');
    }
    name.push_str(segment);
}

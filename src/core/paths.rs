//! Path normalization utilities
//!
//! Output paths always use '/' as separator and never leak the absolute location of the root.

use std::path::{Component, Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory, joined with '/' and free of `.` segments
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Lexically clean a root-relative path: drop `.` and empty segments, resolve `..`.
///
/// A leading '/' is read as the root itself. Returns `None` when the path climbs above
/// the root or carries a drive prefix.
pub fn clean_relative(path: &str) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir | Component::RootDir => {}
            Component::Prefix(_) => return None,
        }
    }
    Some(parts.iter().collect())
}

/// Join a root-relative path onto the root after cleaning it
pub fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let cleaned = clean_relative(relative)?;
    if cleaned.as_os_str().is_empty() {
        return Some(root.to_path_buf());
    }
    Some(root.join(cleaned))
}

/// Last component of a path, or the whole path when it has none
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| normalize_path(path))
}

/// Prefix a root-relative path with the root's own base name
pub fn display_path(root_base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return root_base.to_string();
    }
    if root_base.is_empty() {
        return relative.to_string();
    }
    format!("{}/{}", root_base, relative)
}

/// Lowercased extension without the dot, empty when the file has none
pub fn file_format(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

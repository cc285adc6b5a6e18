//! Virtual path splitting and name rules.
//!
//! Virtual paths accept both `/` and `\` as separators. Repeated separators
//! collapse, a single leading and trailing separator is dropped, and every
//! segment is trimmed. `.` and `..` survive splitting; they are operators
//! interpreted by resolution, never stored names.

use super::error::{VfsError, VfsResult};

/// Characters that may never appear in a stored name.
pub const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Path separator used when rendering absolute paths.
pub const SEPARATOR: char = '/';

/// Returns true if `c` separates path segments.
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Returns true if the path is anchored at the root.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator)
}

/// Split a virtual path into trimmed segments.
///
/// An empty path, or one made only of separators, yields no segments and
/// therefore resolves to the starting node.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(is_separator)
        .filter(|s| !s.is_empty())
        .map(str::trim)
        .collect()
}

/// Normalized form of `path`: `/`-joined segments with no leading or
/// trailing separator.
///
/// A segment made only of whitespace trims to an empty name that no lookup
/// can match, so it has no normalized form and is an
/// [`VfsError::InvalidName`].
pub fn normalize(path: &str) -> VfsResult<String> {
    let parts = segments(path);
    if parts.iter().any(|s| s.is_empty()) {
        return Err(VfsError::invalid_name(path));
    }
    Ok(parts.join("/"))
}

/// Split into the parent portion and the leaf segment.
///
/// Returns `None` when the path has no segments.
pub fn split_leaf(path: &str) -> Option<(Vec<&str>, &str)> {
    let mut parts = segments(path);
    let leaf = parts.pop()?;
    Some((parts, leaf))
}

/// Check a name against the storage rules.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(RESERVED_CHARS)
        && !name.starts_with(char::is_whitespace)
        && !name.ends_with(char::is_whitespace)
}

/// Validate a name, returning it unchanged on success.
pub fn validate_name(name: &str) -> VfsResult<&str> {
    if is_valid_name(name) {
        Ok(name)
    } else {
        Err(VfsError::invalid_name(name))
    }
}

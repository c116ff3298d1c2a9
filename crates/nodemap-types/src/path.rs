//! Path helpers and node-name validation.
//!
//! Paths are absolute and slash-delimited (`/a/b`). The root is `/`.
//!
//! Valid node names:
//! - Must be non-empty
//! - Must not be `.` or `..`
//! - Must not contain `/`, `[`, `]`, `*`, `|` or whitespace other than a space
//! - Must not start or end with a space
//!
//! A single `:` is allowed so namespaced names such as `locale:en` work.

use crate::error::{TypeError, TypeResult};

/// Path of the repository root.
pub const ROOT_PATH: &str = "/";

/// Characters that are forbidden anywhere in a node name.
const FORBIDDEN_CHARS: &[char] = &['/', '[', ']', '*', '|', '\t', '\n', '\r'];

/// Append `name` to `parent`, treating the root as the empty prefix.
///
/// ```
/// use nodemap_types::path::join_path;
///
/// assert_eq!(join_path("/", "x"), "/x");
/// assert_eq!(join_path("/a", "x"), "/a/x");
/// ```
pub fn join_path(parent: &str, name: &str) -> String {
    let prefix = if parent == ROOT_PATH { "" } else { parent };
    format!("{prefix}/{name}")
}

/// Parent path of `path`, or `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
    if path == ROOT_PATH {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT_PATH),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of `path` (empty for the root).
pub fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Validate a single node name, returning `Ok(())` if valid.
pub fn validate_node_name(name: &str) -> TypeResult<()> {
    if name.is_empty() {
        return Err(TypeError::InvalidNodeName {
            name: name.to_string(),
            reason: "node name must not be empty".into(),
        });
    }

    if name == "." || name == ".." {
        return Err(TypeError::InvalidNodeName {
            name: name.to_string(),
            reason: "node name must not be '.' or '..'".into(),
        });
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(TypeError::InvalidNodeName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(TypeError::InvalidNodeName {
            name: name.to_string(),
            reason: "must not start or end with a space".into(),
        });
    }

    if name.matches(':').count() > 1 {
        return Err(TypeError::InvalidNodeName {
            name: name.to_string(),
            reason: "at most one namespace separator ':' allowed".into(),
        });
    }

    Ok(())
}

/// Validate an absolute path: leading `/`, no trailing `/` (except root),
/// and every segment a valid node name.
pub fn validate_path(path: &str) -> TypeResult<()> {
    if path == ROOT_PATH {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: "path must be absolute".into(),
        });
    };
    for segment in rest.split('/') {
        validate_node_name(segment).map_err(|e| TypeError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

//! Path resolution for option values
//!
//! Option paths may be written relative to the project root with the `~~/`
//! alias (`~~/app-android`), with `~` or `$VAR` expansions, or as plain
//! relative or absolute paths.

use crate::error::{Error, ErrorCode, Result};
use std::path::{Component, Path, PathBuf};

/// Alias for the project root
pub const ROOT_ALIAS: &str = "~~";

/// Resolve an option path against the project root
pub fn resolve_path(root: &Path, raw: &str) -> Result<PathBuf> {
    if raw == ROOT_ALIAS {
        return Ok(root.to_path_buf());
    }
    if let Some(rest) = raw
        .strip_prefix("~~/")
        .or_else(|| raw.strip_prefix("~~\\"))
    {
        return Ok(normalize(&root.join(rest)));
    }

    let expanded = shellexpand::full(raw).map_err(|e| {
        Error::new(ErrorCode::InvalidPath, format!("Cannot expand path '{raw}': {e}"))
    })?;
    let path = Path::new(expanded.as_ref());

    Ok(if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    })
}

/// Express `path` relative to `root` when it lives under it
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Render a path with forward slashes, as the native and web toolchains expect
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

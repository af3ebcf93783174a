//! Filesystem helpers

use crate::error::{Error, ErrorCode, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Summary of a recursive copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Files copied
    pub files: usize,
    /// Bytes copied
    pub bytes: u64,
}

/// Recursively copy `src` into `dst`, creating `dst` and any parents.
///
/// Existing files in `dst` with the same relative path are overwritten; other
/// files already in `dst` are left alone.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<CopyStats> {
    if !src.is_dir() {
        return Err(Error::new(
            ErrorCode::DirectoryNotFound,
            format!("Directory not found: {}", src.display()),
        ));
    }

    let mut stats = CopyStats::default();
    std::fs::create_dir_all(dst)?;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::new(ErrorCode::InvalidPath, e.to_string()))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            stats.bytes += std::fs::copy(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

/// Read a file, creating it empty first if it does not exist
pub fn read_or_create(path: &Path) -> Result<String> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, "")?;
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_recursive_nested() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("release");
        std::fs::create_dir_all(src.join("meta")).unwrap();
        std::fs::write(src.join("app-release.apk"), b"apk").unwrap();
        std::fs::write(src.join("meta/output-metadata.json"), b"{}").unwrap();

        let dst = temp.path().join("out/release");
        let stats = copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 5);
        assert_eq!(std::fs::read(dst.join("app-release.apk")).unwrap(), b"apk");
        assert!(dst.join("meta/output-metadata.json").exists());
    }

    #[test]
    fn test_copy_dir_recursive_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = copy_dir_recursive(&temp.path().join("nope"), &temp.path().join("dst")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DirectoryNotFound);
    }

    #[test]
    fn test_read_or_create() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app-android/local.properties");
        assert_eq!(read_or_create(&path).unwrap(), "");
        assert!(path.exists());
    }
}

//! Filesystem tree operations used while staging packages.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Recursively copy a directory tree.
///
/// `ignore` holds glob patterns matched against entry file names at every
/// level; matching files and directories are skipped entirely.
pub fn copy_tree(src: &Path, dst: &Path, ignore: &[&str]) -> Result<()> {
    let patterns = ignore
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| Error::Other(format!("invalid ignore pattern '{}': {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    copy_tree_inner(src, dst, &patterns)
}

fn copy_tree_inner(src: &Path, dst: &Path, ignore: &[glob::Pattern]) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if ignore
            .iter()
            .any(|p| p.matches(&name.to_string_lossy()))
        {
            continue;
        }

        let source = entry.path();
        let target = dst.join(&name);
        if source.is_dir() {
            copy_tree_inner(&source, &target, ignore)?;
        } else {
            fs::copy(&source, &target)?;
        }
    }
    Ok(())
}

/// Move a file, creating the destination's parent directories.
///
/// Falls back to copy-and-remove when rename fails (the CI workspace and
/// the SDK install locations may sit on different volumes).
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    if fs::rename(src, dst).is_err() {
        fs::copy(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Move a directory, with the same cross-volume fallback as [`move_file`].
pub fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    if fs::rename(src, dst).is_err() {
        copy_tree(src, dst, &[])?;
        fs::remove_dir_all(src)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_tree_skips_ignored_names_at_every_level() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::write(src.join("cudnn.lib"), b"keep").unwrap();
        fs::write(src.join("cublas64_12.dll"), b"skip").unwrap();
        fs::write(src.join("bin/cublasLt64_12.dll"), b"skip").unwrap();
        fs::write(src.join("bin/nvcc.exe"), b"keep").unwrap();

        let dst = dir.path().join("dst");
        copy_tree(&src, &dst, &["cublas*.dll"]).unwrap();

        assert!(dst.join("cudnn.lib").exists());
        assert!(dst.join("bin/nvcc.exe").exists());
        assert!(!dst.join("cublas64_12.dll").exists());
        assert!(!dst.join("bin/cublasLt64_12.dll").exists());
    }

    #[test]
    fn move_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.lib");
        fs::write(&src, b"data").unwrap();

        let dst = dir.path().join("nested/lib/a.lib");
        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(dst).unwrap(), b"data");
    }

    #[test]
    fn move_dir_relocates_whole_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("include");
        fs::create_dir_all(src.join("impl")).unwrap();
        fs::write(src.join("impl/detail.h"), b"h").unwrap();

        let dst = dir.path().join("pkg/include");
        move_dir(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("impl/detail.h").exists());
    }
}

//! Common assertions for ferrozip testing

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Asserts that every regular file under `source` exists under `extracted`
/// at the same relative path with identical content
pub fn assert_files_reproduced(source: &Path, extracted: &Path) -> Result<()> {
    let files = collect_files(source)?;
    assert!(!files.is_empty(), "No files under {:?}", source);

    for relative in files {
        let original = std::fs::read(source.join(&relative))?;
        let copy_path = extracted.join(&relative);
        let copy = std::fs::read(&copy_path)
            .map_err(|e| anyhow::anyhow!("Missing {:?}: {}", copy_path, e))?;

        assert_eq!(original, copy, "Content mismatch for {:?}", relative);
    }

    Ok(())
}

/// Asserts that a file has specific permissions (Unix only)
#[cfg(unix)]
pub fn assert_file_permissions(path: &Path, expected: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let mode = metadata.permissions().mode() & 0o777;

    assert_eq!(
        mode, expected,
        "Permission mismatch for {:?}: expected {:o}, got {:o}",
        path, expected, mode
    );

    Ok(())
}

/// Relative paths of every regular file under `dir`, sorted
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir)?.to_path_buf());
        }
    }

    Ok(files)
}

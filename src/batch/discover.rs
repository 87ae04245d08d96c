use crate::batch::error::{BatchError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Office writes `~$name.docx` lock files next to open documents.
const LOCK_FILE_PREFIX: &str = "~$";

/// Sorted list of `.docx` files under `dir`.
///
/// The extension check is case-insensitive. Subdirectories are searched only
/// when `recursive` is set.
pub fn get_files_from_directory(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| BatchError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_docx_name(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_docx_name(path: &Path) -> bool {
    let has_ext = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("docx"));
    let is_lock = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(LOCK_FILE_PREFIX));
    has_ext && !is_lock
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_discovery() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for rel in ["b.docx", "a.DOCX", "notes.txt", "~$b.docx", "sub/c.docx", "sub/deeper/d.docx"] {
            touch(root, rel);
        }

        let flat = get_files_from_directory(root, false).unwrap();
        assert_eq!(flat, vec![root.join("a.DOCX"), root.join("b.docx")]);

        let all = get_files_from_directory(root, true).unwrap();
        assert_eq!(
            all,
            vec![
                root.join("a.DOCX"),
                root.join("b.docx"),
                root.join("sub/c.docx"),
                root.join("sub/deeper/d.docx"),
            ]
        );
    }

    #[test]
    fn test_missing_directory() {
        let err = get_files_from_directory(Path::new("/no/such/dir"), true).unwrap_err();
        assert!(matches!(err, BatchError::Walk { .. }));
    }
}

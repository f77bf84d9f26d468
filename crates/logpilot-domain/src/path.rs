//! Path resolution helpers
//!
//! Maps keyed by directory (cleanup queues) and by file (runners, done
//! markers) must agree on one spelling per filesystem object. These helpers
//! produce that spelling.

use std::io;
use std::path::{Path, PathBuf};

/// Absolute form of `path`, relative to the current working directory.
///
/// Purely lexical: the path does not need to exist and symlinks are kept.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}

/// Fully resolved form of an existing `path` (symlinks followed, `..` removed).
///
/// Fails with `NotFound` when the path does not exist.
pub fn canonical_path(path: &Path) -> io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Canonical form when the path exists, absolute form otherwise.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    match canonical_path(path) {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::NotFound => absolute_path(path),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_of_relative() {
        let abs = absolute_path(Path::new("some/dir")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/dir"));
    }

    #[test]
    fn test_two_spellings_share_canonical_form() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        std::fs::create_dir(&dir).unwrap();

        let direct = canonical_path(&dir).unwrap();
        let roundabout = canonical_path(&tmp.path().join("logs/../logs/.")).unwrap();
        assert_eq!(direct, roundabout);
    }

    #[test]
    fn test_canonical_path_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = canonical_path(&tmp.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_resolve_path_falls_back_to_absolute() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("absent");
        assert_eq!(resolve_path(&missing).unwrap(), missing);
    }
}
